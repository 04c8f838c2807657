use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Attempt, Response};
use crate::db::types::AttemptStatus;
use crate::repositories::attempts::HistoryRow;
use crate::schemas::question::ExamQuestion;
use crate::services::exam_flow::EnterOutcome;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SaveAnswerRequest {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(alias = "selectedOption")]
    #[validate(length(min = 1, message = "selected_option must not be empty"))]
    pub(crate) selected_option: String,
    #[serde(default, alias = "isFlagged")]
    pub(crate) is_flagged: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SavedResponse {
    pub(crate) selected_option: String,
    pub(crate) is_flagged: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnterExamResponse {
    pub(crate) attempt_id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) duration_minutes: i32,
    pub(crate) questions: Vec<ExamQuestion>,
    /// Previously saved answers keyed by question id so the client can
    /// restore selections and review flags on resume.
    pub(crate) saved_responses: HashMap<String, SavedResponse>,
}

impl EnterExamResponse {
    pub(crate) fn from_outcome(outcome: EnterOutcome) -> Self {
        let saved_responses = outcome
            .saved
            .into_iter()
            .map(|response| {
                (
                    response.question_id,
                    SavedResponse {
                        selected_option: response.selected_option,
                        is_flagged: response.is_flagged,
                    },
                )
            })
            .collect();

        Self {
            attempt_id: outcome.attempt.id,
            quiz_id: outcome.quiz.id,
            quiz_title: outcome.quiz.title,
            duration_minutes: outcome.quiz.duration_minutes,
            questions: outcome.questions.into_iter().map(ExamQuestion::from_db).collect(),
            saved_responses,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveAnswerResponse {
    pub(crate) attempt_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_option: String,
    pub(crate) is_flagged: bool,
    pub(crate) saved_at: String,
}

impl SaveAnswerResponse {
    pub(crate) fn from_db(response: Response) -> Self {
        Self {
            attempt_id: response.attempt_id,
            question_id: response.question_id,
            selected_option: response.selected_option,
            is_flagged: response.is_flagged,
            saved_at: format_primitive(response.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) attempt_id: String,
    pub(crate) total_score: i32,
    pub(crate) status: AttemptStatus,
    pub(crate) completed_at: Option<String>,
}

impl SubmitResponse {
    pub(crate) fn from_db(attempt: Attempt) -> Self {
        Self {
            attempt_id: attempt.id,
            total_score: attempt.total_score,
            status: attempt.status,
            completed_at: attempt.completed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RunCodeRequest {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub(crate) code: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunCodeResponse {
    pub(crate) output: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryEntry {
    pub(crate) attempt_id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) total_score: i32,
    pub(crate) status: AttemptStatus,
    pub(crate) certificate_approved: bool,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
}

impl HistoryEntry {
    pub(crate) fn from_row(row: HistoryRow) -> Self {
        Self {
            attempt_id: row.id,
            quiz_id: row.quiz_id,
            quiz_title: row.quiz_title,
            total_score: row.total_score,
            status: row.status,
            certificate_approved: row.certificate_approved,
            started_at: format_primitive(row.started_at),
            completed_at: row.completed_at.map(format_primitive),
        }
    }
}
