use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::certificate::CertificateResponse;
use crate::services::certificates::{eligibility, Eligibility};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:attempt_id", get(get_certificate))
}

/// The certificate gate: the renderer payload is produced only for a
/// completed, admin-approved attempt, and only for its owner or an admin.
async fn get_certificate(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let row = repositories::attempts::find_certificate_row(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    if row.user_id != user.id && user.role != UserRole::Admin {
        return Err(ApiError::NotFound("Attempt not found".to_string()));
    }

    match eligibility(row.status, row.certificate_approved) {
        Eligibility::Eligible => Ok(Json(CertificateResponse::from_row(row))),
        Eligibility::NotCompleted => {
            Err(ApiError::Conflict("Exam is not completed".to_string()))
        }
        Eligibility::NotApproved => {
            Err(ApiError::Forbidden("Certificate has not been approved yet"))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn certificate_gate_requires_completion_and_approval() {
        let Some(ctx) = test_support::try_setup().await else {
            return;
        };

        let student = test_support::insert_student(ctx.state.db(), "erin@example.com").await;
        let quiz = test_support::insert_quiz(ctx.state.db(), "Security 101", None).await;
        let question = test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "A").await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());
        let attempt_id = test_support::enter_exam(&ctx, &quiz.id, &token).await;

        // In progress: no certificate.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/certificates/{attempt_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("certificate while in progress");
        assert_eq!(response.status(), StatusCode::CONFLICT);

        test_support::save_answer(&ctx, &attempt_id, &question.id, "A", &token).await;
        test_support::submit_attempt(&ctx, &attempt_id, &token).await;

        // Completed but unapproved: still gated.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/certificates/{attempt_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("certificate before approval");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Admin approval opens the gate.
        let admin = test_support::insert_admin(ctx.state.db(), "root@example.com").await;
        let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/admin/attempts/{attempt_id}/approve-certificate"),
                Some(&admin_token),
                None,
            ))
            .await
            .expect("approve certificate");
        assert_eq!(response.status(), StatusCode::OK);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/certificates/{attempt_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("certificate after approval");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["score"], 5);
        assert_eq!(body["quiz_title"], "Security 101");
        assert_eq!(body["attempt_id"], attempt_id);
    }
}
