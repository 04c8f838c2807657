use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Question;
use crate::db::types::QuestionKind;

pub(crate) const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    pub(crate) kind: QuestionKind,
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    #[serde(default, alias = "optionA")]
    pub(crate) option_a: Option<String>,
    #[serde(default, alias = "optionB")]
    pub(crate) option_b: Option<String>,
    #[serde(default, alias = "optionC")]
    pub(crate) option_c: Option<String>,
    #[serde(default, alias = "optionD")]
    pub(crate) option_d: Option<String>,
    #[serde(default, alias = "correctOption")]
    pub(crate) correct_option: Option<String>,
    #[serde(default, alias = "testInput")]
    pub(crate) test_input: Option<String>,
    #[serde(default, alias = "testOutput")]
    pub(crate) test_output: Option<String>,
    #[serde(default = "default_marks")]
    #[validate(range(min = 1, message = "marks must be positive"))]
    pub(crate) marks: i32,
}

impl QuestionCreate {
    /// Variant-shape validation the derive can't express: MCQ rows need all
    /// four options and a correct label out of the option slots; code rows
    /// need the judge test pair.
    pub(crate) fn validate_shape(&self) -> Result<(), String> {
        match self.kind {
            QuestionKind::Mcq => {
                let options = [&self.option_a, &self.option_b, &self.option_c, &self.option_d];
                if options.iter().any(|option| {
                    option.as_deref().map(str::trim).unwrap_or_default().is_empty()
                }) {
                    return Err("mcq questions require options A through D".to_string());
                }
                match self.correct_option.as_deref() {
                    Some(label) if OPTION_LABELS.contains(&label) => Ok(()),
                    _ => Err("correct_option must be one of A, B, C, D".to_string()),
                }
            }
            QuestionKind::Code => {
                if self.test_input.is_none() || self.test_output.is_none() {
                    return Err("code questions require test_input and test_output".to_string());
                }
                Ok(())
            }
        }
    }
}

fn default_marks() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default, alias = "questionText")]
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: Option<String>,
    #[serde(default, alias = "optionA")]
    pub(crate) option_a: Option<String>,
    #[serde(default, alias = "optionB")]
    pub(crate) option_b: Option<String>,
    #[serde(default, alias = "optionC")]
    pub(crate) option_c: Option<String>,
    #[serde(default, alias = "optionD")]
    pub(crate) option_d: Option<String>,
    #[serde(default, alias = "correctOption")]
    pub(crate) correct_option: Option<String>,
    #[serde(default, alias = "testInput")]
    pub(crate) test_input: Option<String>,
    #[serde(default, alias = "testOutput")]
    pub(crate) test_output: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "marks must be positive"))]
    pub(crate) marks: Option<i32>,
}

/// Staff view of a question, answer key included.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) question_text: String,
    pub(crate) option_a: Option<String>,
    pub(crate) option_b: Option<String>,
    pub(crate) option_c: Option<String>,
    pub(crate) option_d: Option<String>,
    pub(crate) correct_option: Option<String>,
    pub(crate) test_input: Option<String>,
    pub(crate) test_output: Option<String>,
    pub(crate) marks: i32,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            quiz_id: question.quiz_id,
            kind: question.kind,
            question_text: question.question_text,
            option_a: question.option_a,
            option_b: question.option_b,
            option_c: question.option_c,
            option_d: question.option_d,
            correct_option: question.correct_option,
            test_input: question.test_input,
            test_output: question.test_output,
            marks: question.marks,
        }
    }
}

/// Student view during an exam. The correct option and expected test output
/// never leave the server.
#[derive(Debug, Serialize)]
pub(crate) struct ExamQuestion {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) question_text: String,
    pub(crate) option_a: Option<String>,
    pub(crate) option_b: Option<String>,
    pub(crate) option_c: Option<String>,
    pub(crate) option_d: Option<String>,
    pub(crate) test_input: Option<String>,
    pub(crate) marks: i32,
}

impl ExamQuestion {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            kind: question.kind,
            question_text: question.question_text,
            option_a: question.option_a,
            option_b: question.option_b,
            option_c: question.option_c,
            option_d: question.option_d,
            test_input: question.test_input,
            marks: question.marks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq_payload() -> QuestionCreate {
        QuestionCreate {
            kind: QuestionKind::Mcq,
            question_text: "What does HTTP stand for?".to_string(),
            option_a: Some("HyperText Transfer Protocol".to_string()),
            option_b: Some("High Throughput Transport".to_string()),
            option_c: Some("Host Transfer Process".to_string()),
            option_d: Some("None of these".to_string()),
            correct_option: Some("A".to_string()),
            test_input: None,
            test_output: None,
            marks: 2,
        }
    }

    #[test]
    fn valid_mcq_shape_passes() {
        assert!(mcq_payload().validate_shape().is_ok());
    }

    #[test]
    fn mcq_rejects_missing_option() {
        let mut payload = mcq_payload();
        payload.option_c = None;
        assert!(payload.validate_shape().is_err());
    }

    #[test]
    fn mcq_rejects_label_outside_slots() {
        let mut payload = mcq_payload();
        payload.correct_option = Some("E".to_string());
        assert!(payload.validate_shape().is_err());

        payload.correct_option = None;
        assert!(payload.validate_shape().is_err());
    }

    #[test]
    fn code_requires_test_pair() {
        let payload = QuestionCreate {
            kind: QuestionKind::Code,
            question_text: "Echo stdin".to_string(),
            option_a: None,
            option_b: None,
            option_c: None,
            option_d: None,
            correct_option: None,
            test_input: Some("hello".to_string()),
            test_output: None,
            marks: 5,
        };
        assert!(payload.validate_shape().is_err());
    }
}
