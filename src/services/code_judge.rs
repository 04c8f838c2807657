use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum JudgeError {
    #[error("judge request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("judge returned no run output")]
    MissingOutput,
}

/// Client for the remote execution service. The judge runs the code; this
/// side only ships sources with stdin and reads back stdout.
#[derive(Clone)]
pub(crate) struct CodeJudge {
    http: reqwest::Client,
    base_url: String,
    language: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<FilePayload<'a>>,
    stdin: &'a str,
}

#[derive(Debug, Serialize)]
struct FilePayload<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    run: Option<RunResult>,
}

#[derive(Debug, Deserialize)]
struct RunResult {
    stdout: String,
}

impl CodeJudge {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let judge = settings.judge();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(judge.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: judge.base_url.trim_end_matches('/').to_string(),
            language: judge.language.clone(),
            version: judge.version.clone(),
        })
    }

    pub(crate) async fn execute(&self, code: &str, stdin: &str) -> Result<String, JudgeError> {
        let payload = ExecuteRequest {
            language: &self.language,
            version: &self.version,
            files: vec![FilePayload { content: code }],
            stdin,
        };

        let response = self
            .http
            .post(format!("{}/execute", self.base_url))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: ExecuteResponse = response.json().await?;
        body.run.map(|run| run.stdout).ok_or(JudgeError::MissingOutput)
    }
}

/// Correctness is trimmed-equality of stdout against the expected output.
pub(crate) fn output_matches(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_matches_ignores_surrounding_whitespace() {
        assert!(output_matches("42\n", "42"));
        assert!(output_matches("  hello world  ", "hello world"));
        assert!(output_matches("a\nb", "a\nb\n"));
    }

    #[test]
    fn output_matches_is_strict_inside() {
        assert!(!output_matches("42", "4 2"));
        assert!(!output_matches("Hello", "hello"));
        assert!(!output_matches("a\n\nb", "a\nb"));
    }
}
