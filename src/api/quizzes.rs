use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::repositories;
use crate::schemas::question::{QuestionCreate, QuestionResponse};
use crate::schemas::quiz::{QuizCreate, QuizResponse, QuizUpdate};
use crate::services::quiz_gate;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quizzes).post(create_quiz))
        .route("/:quiz_id", patch(update_quiz).delete(delete_quiz))
        .route("/:quiz_id/questions", get(list_questions).post(create_question))
}

/// Any authenticated user sees the catalog; each quiz carries its
/// read-time scheduled-start gate.
async fn list_quizzes(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizResponse>>, ApiError> {
    let quizzes = repositories::quizzes::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    let now = primitive_now_utc();
    let items = quizzes
        .into_iter()
        .map(|quiz| {
            let gate = quiz_gate::evaluate(quiz.start_time, now);
            QuizResponse::from_db(quiz, gate)
        })
        .collect();

    Ok(Json(items))
}

async fn create_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(ApiError::from_validation)?;

    let now = primitive_now_utc();
    let quiz = repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            category: &payload.category,
            duration_minutes: payload.duration_minutes,
            total_marks: payload.total_marks,
            start_time: payload.start_time.map(to_primitive_utc),
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    let gate = quiz_gate::evaluate(quiz.start_time, now);
    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz, gate))))
}

async fn update_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(ApiError::from_validation)?;

    let now = primitive_now_utc();
    let quiz = repositories::quizzes::update(
        state.db(),
        &quiz_id,
        repositories::quizzes::UpdateQuiz {
            title: payload.title,
            category: payload.category,
            duration_minutes: payload.duration_minutes,
            total_marks: payload.total_marks,
            start_time: payload.start_time.map(|value| Some(to_primitive_utc(value))),
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?
    .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let gate = quiz_gate::evaluate(quiz.start_time, now);
    Ok(Json(QuizResponse::from_db(quiz, gate)))
}

/// Deleting a quiz cascades to its questions. Attempts are only removed by
/// user deletion, so a quiz with recorded attempts refuses to go. Admin only.
async fn delete_quiz(
    Path(quiz_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::quizzes::delete(state.db(), &quiz_id).await.map_err(|err| {
        if err.as_database_error().is_some_and(|db| db.is_foreign_key_violation()) {
            ApiError::Conflict("Quiz has recorded attempts and cannot be deleted".to_string())
        } else {
            ApiError::internal(err, "Failed to delete quiz")
        }
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Quiz not found".to_string()))
    }
}

/// Staff view of a quiz's questions, answer key included.
async fn list_questions(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    require_staff(&user)?;

    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;
    if quiz.is_none() {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    let questions = repositories::questions::list_by_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

async fn create_question(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    require_staff(&user)?;
    payload.validate().map_err(ApiError::from_validation)?;
    payload.validate_shape().map_err(ApiError::BadRequest)?;

    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;
    if quiz.is_none() {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            quiz_id: &quiz_id,
            kind: payload.kind,
            question_text: &payload.question_text,
            option_a: payload.option_a,
            option_b: payload.option_b,
            option_c: payload.option_c,
            option_d: payload.option_d,
            correct_option: payload.correct_option,
            test_input: payload.test_input,
            test_output: payload.test_output,
            marks: payload.marks,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}
