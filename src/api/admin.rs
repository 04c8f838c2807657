use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_staff, CurrentAdmin, CurrentUser};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::{AttemptStatus, UserRole};
use crate::repositories;
use crate::schemas::user::{CoordinatorCreate, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/results", get(list_results))
        .route("/attempts/:attempt_id/approve-certificate", post(approve_certificate))
        .route("/announcement", post(publish_announcement).delete(clear_announcement))
        .route("/coordinators", post(create_coordinator))
}

#[derive(Debug, Serialize)]
struct ResultEntry {
    attempt_id: String,
    user_id: String,
    full_name: String,
    email: String,
    quiz_id: String,
    quiz_title: String,
    total_score: i32,
    status: AttemptStatus,
    certificate_approved: bool,
    completed_at: Option<String>,
}

/// All attempts ordered by score, for the staff results table.
async fn list_results(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ResultEntry>>, ApiError> {
    require_staff(&user)?;

    let rows = repositories::attempts::list_results(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;

    let items = rows
        .into_iter()
        .map(|row| ResultEntry {
            attempt_id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            email: row.email,
            quiz_id: row.quiz_id,
            quiz_title: row.quiz_title,
            total_score: row.total_score,
            status: row.status,
            certificate_approved: row.certificate_approved,
            completed_at: row.completed_at.map(format_primitive),
        })
        .collect();

    Ok(Json(items))
}

/// Flips the approval bit on a completed attempt; the certificate gate
/// reads it, nothing else changes.
async fn approve_certificate(
    Path(attempt_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let approved =
        repositories::attempts::approve_certificate(state.db(), &attempt_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to approve certificate"))?;

    if !approved {
        let attempt = repositories::attempts::find_by_id(state.db(), &attempt_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;
        return match attempt {
            Some(_) => Err(ApiError::Conflict(
                "Attempt must be completed before approving a certificate".to_string(),
            )),
            None => Err(ApiError::NotFound("Attempt not found".to_string())),
        };
    }

    Ok(Json(serde_json::json!({ "attempt_id": attempt_id, "certificate_approved": true })))
}

#[derive(Debug, Deserialize, Validate)]
struct AnnouncementPayload {
    #[validate(length(min = 1, message = "message must not be empty"))]
    message: String,
}

async fn publish_announcement(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AnnouncementPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    payload.validate().map_err(ApiError::from_validation)?;

    repositories::announcements::publish(state.db(), &payload.message, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish announcement"))?;

    Ok(Json(serde_json::json!({ "message": payload.message, "is_active": true })))
}

async fn clear_announcement(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    repositories::announcements::clear(state.db(), primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear announcement"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Students see the banner only while it is active.
pub(crate) async fn get_announcement(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let announcement = repositories::announcements::get(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch announcement"))?;

    let message = announcement.filter(|row| row.is_active).map(|row| row.message);
    Ok(Json(serde_json::json!({ "message": message })))
}

async fn create_coordinator(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CoordinatorCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(ApiError::from_validation)?;

    let existing = repositories::users::exists_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &payload.email,
            hashed_password,
            full_name: &payload.full_name,
            role: UserRole::Coordinator,
            selected_category: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create coordinator"))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}
