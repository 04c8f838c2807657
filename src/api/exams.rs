use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_student, CurrentUser};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::{
    EnterExamResponse, HistoryEntry, RunCodeRequest, RunCodeResponse, SaveAnswerRequest,
    SaveAnswerResponse, SubmitResponse,
};
use crate::services::code_judge::{self, JudgeError};
use crate::services::exam_flow;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:quiz_id/enter", post(enter_exam))
        .route("/attempts/:attempt_id/answer", put(save_answer))
        .route("/attempts/:attempt_id/submit", post(submit_attempt))
        .route("/attempts/:attempt_id/run-code", post(run_code))
        .route("/history", get(history))
}

/// Start a new attempt or resume the in-progress one. The question order is
/// freshly shuffled on every call; a completed attempt refuses re-entry.
async fn enter_exam(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<EnterExamResponse>, ApiError> {
    require_student(&user)?;

    let outcome = exam_flow::enter(state.db(), &user.id, &quiz_id).await?;
    Ok(Json(EnterExamResponse::from_outcome(outcome)))
}

async fn save_answer(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<Json<SaveAnswerResponse>, ApiError> {
    require_student(&user)?;
    payload.validate().map_err(ApiError::from_validation)?;

    let response = exam_flow::save_answer(
        state.db(),
        &user.id,
        &attempt_id,
        &payload.question_id,
        &payload.selected_option,
        payload.is_flagged,
    )
    .await?;

    Ok(Json(SaveAnswerResponse::from_db(response)))
}

async fn submit_attempt(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmitResponse>, ApiError> {
    require_student(&user)?;

    let attempt = exam_flow::submit(state.db(), &user.id, &attempt_id).await?;
    Ok(Json(SubmitResponse::from_db(attempt)))
}

/// Ship the student's code to the external judge, compare trimmed stdout
/// against the question's expected output, and record the success marker on
/// a match. Scoring picks the marker up at submit time.
async fn run_code(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<RunCodeRequest>,
) -> Result<Json<RunCodeResponse>, ApiError> {
    require_student(&user)?;
    payload.validate().map_err(ApiError::from_validation)?;

    let (attempt, question) =
        exam_flow::prepare_code_run(state.db(), &user.id, &attempt_id, &payload.question_id)
            .await?;

    let stdin = question.test_input.as_deref().unwrap_or_default();
    let output = state.judge().execute(&payload.code, stdin).await.map_err(|err| match err {
        JudgeError::Request(err) => {
            tracing::error!(error = %err, "Code judge request failed");
            ApiError::BadGateway("Code judge is unreachable".to_string())
        }
        JudgeError::MissingOutput => {
            ApiError::BadGateway("Code judge returned no output".to_string())
        }
    })?;

    let expected = question.test_output.as_deref().unwrap_or_default();
    let is_correct = code_judge::output_matches(&output, expected);

    if is_correct {
        exam_flow::record_code_success(state.db(), &attempt.id, &question.id).await?;
    }

    Ok(Json(RunCodeResponse { output, is_correct }))
}

async fn history(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let rows = repositories::attempts::list_history_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempt history"))?;

    Ok(Json(rows.into_iter().map(HistoryEntry::from_row).collect()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn entering_twice_reuses_the_attempt() {
        let Some(ctx) = test_support::try_setup().await else {
            return;
        };

        let student = test_support::insert_student(ctx.state.db(), "alice@example.com").await;
        let quiz = test_support::insert_quiz(ctx.state.db(), "Networking Basics", None).await;
        test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "A").await;
        test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "B").await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());

        let first = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/enter", quiz.id),
                Some(&token),
                None,
            ))
            .await
            .expect("enter exam");
        assert_eq!(first.status(), StatusCode::OK);
        let first = test_support::read_json(first).await;

        let second = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/enter", quiz.id),
                Some(&token),
                None,
            ))
            .await
            .expect("re-enter exam");
        assert_eq!(second.status(), StatusCode::OK);
        let second = test_support::read_json(second).await;

        assert_eq!(first["attempt_id"], second["attempt_id"]);
        assert_eq!(second["questions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn save_answer_upserts_a_single_row() {
        let Some(ctx) = test_support::try_setup().await else {
            return;
        };

        let student = test_support::insert_student(ctx.state.db(), "bob@example.com").await;
        let quiz = test_support::insert_quiz(ctx.state.db(), "Databases", None).await;
        let question = test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "B").await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());
        let attempt_id = test_support::enter_exam(&ctx, &quiz.id, &token).await;

        for _ in 0..3 {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::PUT,
                    &format!("/api/v1/exams/attempts/{attempt_id}/answer"),
                    Some(&token),
                    Some(json!({
                        "question_id": question.id,
                        "selected_option": "B",
                        "is_flagged": false,
                    })),
                ))
                .await
                .expect("save answer");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let count = repositories::responses::count_by_attempt(ctx.state.db(), &attempt_id)
            .await
            .expect("count responses");
        assert_eq!(count, 1);

        // Overwrite with a new option and flag; still one row, last write wins.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                &format!("/api/v1/exams/attempts/{attempt_id}/answer"),
                Some(&token),
                Some(json!({
                    "question_id": question.id,
                    "selected_option": "C",
                    "is_flagged": true,
                })),
            ))
            .await
            .expect("overwrite answer");
        assert_eq!(response.status(), StatusCode::OK);

        let stored = repositories::responses::list_by_attempt(ctx.state.db(), &attempt_id)
            .await
            .expect("list responses");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].selected_option, "C");
        assert!(stored[0].is_flagged);
    }

    #[tokio::test]
    async fn submit_scores_and_stays_stable_on_resubmit() {
        let Some(ctx) = test_support::try_setup().await else {
            return;
        };

        let student = test_support::insert_student(ctx.state.db(), "carol@example.com").await;
        let quiz = test_support::insert_quiz(ctx.state.db(), "Operating Systems", None).await;
        let q1 = test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "A").await;
        let q2 = test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "B").await;
        let q3 = test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "C").await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());
        let attempt_id = test_support::enter_exam(&ctx, &quiz.id, &token).await;

        for (question, answer) in [(&q1, "A"), (&q2, "B"), (&q3, "D")] {
            test_support::save_answer(&ctx, &attempt_id, &question.id, answer, &token).await;
        }

        let submit = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/attempts/{attempt_id}/submit"),
                Some(&token),
                None,
            ))
            .await
            .expect("submit");
        assert_eq!(submit.status(), StatusCode::OK);
        let submit = test_support::read_json(submit).await;
        assert_eq!(submit["total_score"], 10);
        assert_eq!(submit["status"], "completed");

        let again = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/attempts/{attempt_id}/submit"),
                Some(&token),
                None,
            ))
            .await
            .expect("second submit");
        assert_eq!(again.status(), StatusCode::OK);
        let again = test_support::read_json(again).await;
        assert_eq!(again["total_score"], 10);
        assert_eq!(again["status"], "completed");

        // Re-entering a finished exam is refused and mutates nothing.
        let reenter = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/enter", quiz.id),
                Some(&token),
                None,
            ))
            .await
            .expect("re-enter");
        assert_eq!(reenter.status(), StatusCode::CONFLICT);

        // Saving against the finished attempt is rejected too.
        let save = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                &format!("/api/v1/exams/attempts/{attempt_id}/answer"),
                Some(&token),
                Some(json!({"question_id": q3.id, "selected_option": "C"})),
            ))
            .await
            .expect("late save");
        assert_eq!(save.status(), StatusCode::CONFLICT);

        let attempt = repositories::attempts::find_by_id(ctx.state.db(), &attempt_id)
            .await
            .expect("fetch attempt")
            .expect("attempt row");
        assert_eq!(attempt.total_score, 10);
    }

    #[tokio::test]
    async fn judged_code_success_counts_at_submit() {
        let Some(ctx) = test_support::try_setup().await else {
            return;
        };

        let student = test_support::insert_student(ctx.state.db(), "frank@example.com").await;
        let quiz = test_support::insert_quiz(ctx.state.db(), "Intro to Python", None).await;
        let mcq = test_support::insert_mcq_question(ctx.state.db(), &quiz.id, "A").await;
        let code =
            test_support::insert_code_question(ctx.state.db(), &quiz.id, "3 4", "7").await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());
        let attempt_id = test_support::enter_exam(&ctx, &quiz.id, &token).await;

        test_support::save_answer(&ctx, &attempt_id, &mcq.id, "A", &token).await;
        // The judge round trip is exercised elsewhere; record its accepted
        // verdict directly the way the run-code handler does.
        crate::services::exam_flow::record_code_success(ctx.state.db(), &attempt_id, &code.id)
            .await
            .expect("record code success");

        let submit = test_support::submit_attempt(&ctx, &attempt_id, &token).await;
        assert_eq!(submit["total_score"], 10);
    }

    #[tokio::test]
    async fn locked_quiz_refuses_entry() {
        let Some(ctx) = test_support::try_setup().await else {
            return;
        };

        let student = test_support::insert_student(ctx.state.db(), "dave@example.com").await;
        let start = test_support::minutes_from_now(30);
        let quiz = test_support::insert_quiz(ctx.state.db(), "Future Quiz", Some(start)).await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/enter", quiz.id),
                Some(&token),
                None,
            ))
            .await
            .expect("enter locked quiz");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = test_support::read_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("starts in"));

        // The catalog reports the same gate.
        let list = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/quizzes",
                Some(&token),
                None,
            ))
            .await
            .expect("list quizzes");
        assert_eq!(list.status(), StatusCode::OK);
        let list = test_support::read_json(list).await;
        let entry = list
            .as_array()
            .unwrap()
            .iter()
            .find(|item| item["id"] == quiz.id)
            .expect("quiz in catalog");
        assert_eq!(entry["is_locked"], true);
        assert!(entry["seconds_left"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn staff_cannot_sit_the_exam() {
        let Some(ctx) = test_support::try_setup().await else {
            return;
        };

        let coordinator =
            test_support::insert_coordinator(ctx.state.db(), "coord@example.com").await;
        let quiz = test_support::insert_quiz(ctx.state.db(), "Any Quiz", None).await;
        let token = test_support::bearer_token(&coordinator.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/enter", quiz.id),
                Some(&token),
                None,
            ))
            .await
            .expect("enter as staff");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
