use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::patch,
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentUser};
use crate::core::state::AppState;
use crate::db::types::QuestionKind;
use crate::repositories;
use crate::schemas::question::{QuestionResponse, QuestionUpdate, OPTION_LABELS};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:question_id", patch(update_question).delete(delete_question))
}

async fn update_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(ApiError::from_validation)?;

    let existing = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if let Some(label) = payload.correct_option.as_deref() {
        if existing.kind != QuestionKind::Mcq {
            return Err(ApiError::BadRequest(
                "correct_option only applies to mcq questions".to_string(),
            ));
        }
        if !OPTION_LABELS.contains(&label) {
            return Err(ApiError::BadRequest(
                "correct_option must be one of A, B, C, D".to_string(),
            ));
        }
    }

    let question = repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            question_text: payload.question_text,
            option_a: payload.option_a,
            option_b: payload.option_b,
            option_c: payload.option_c,
            option_d: payload.option_d,
            correct_option: payload.correct_option,
            test_input: payload.test_input,
            test_output: payload.test_output,
            marks: payload.marks,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    Ok(Json(QuestionResponse::from_db(question)))
}

async fn delete_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_staff(&user)?;

    let deleted = repositories::questions::delete(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Question not found".to_string()))
    }
}
