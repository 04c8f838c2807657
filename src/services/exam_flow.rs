use rand::seq::SliceRandom;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Attempt, Question, Quiz, Response};
use crate::db::types::{AttemptStatus, QuestionKind};
use crate::repositories;
use crate::services::quiz_gate;
use crate::services::scoring;

/// Failures of the exam session state machine. `Storage` covers an
/// unreachable or failing store and always aborts the request; callers can
/// tell it apart from legitimately empty data.
#[derive(Debug, Error)]
pub(crate) enum ExamFlowError {
    #[error("quiz not found")]
    QuizNotFound,
    #[error("attempt not found")]
    AttemptNotFound,
    #[error("question not found")]
    QuestionNotFound,
    #[error("attempt is already finished")]
    AttemptAlreadyFinished,
    #[error("quiz has not started yet")]
    QuizLocked { seconds_left: i64 },
    #[error("{0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub(crate) struct EnterOutcome {
    pub(crate) attempt: Attempt,
    pub(crate) quiz: Quiz,
    pub(crate) questions: Vec<Question>,
    pub(crate) saved: Vec<Response>,
}

/// Start a new attempt or resume the in-progress one for (user, quiz).
///
/// The question order is re-shuffled from fresh randomness on every call,
/// so a resume may present a different order than the first entry; the
/// question set itself never changes mid-attempt.
pub(crate) async fn enter(
    pool: &PgPool,
    user_id: &str,
    quiz_id: &str,
) -> Result<EnterOutcome, ExamFlowError> {
    let quiz =
        repositories::quizzes::find_by_id(pool, quiz_id).await?.ok_or(ExamFlowError::QuizNotFound)?;

    let now = primitive_now_utc();
    let gate = quiz_gate::evaluate(quiz.start_time, now);
    if gate.is_locked {
        return Err(ExamFlowError::QuizLocked { seconds_left: gate.seconds_left });
    }

    let attempt = resolve_attempt(pool, user_id, quiz_id, now).await?;

    let mut questions = repositories::questions::list_by_quiz(pool, quiz_id).await?;
    questions.shuffle(&mut rand::thread_rng());

    let saved = repositories::responses::list_by_attempt(pool, &attempt.id).await?;

    tracing::info!(
        user_id = %user_id,
        quiz_id = %quiz_id,
        attempt_id = %attempt.id,
        questions = questions.len(),
        saved_responses = saved.len(),
        "Exam session entered"
    );

    Ok(EnterOutcome { attempt, quiz, questions, saved })
}

/// At most one attempt may exist per (user, quiz). The unique index is the
/// authority: instead of check-then-insert we insert with
/// ON CONFLICT DO NOTHING and re-read when the insert lost a race.
async fn resolve_attempt(
    pool: &PgPool,
    user_id: &str,
    quiz_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Attempt, ExamFlowError> {
    if let Some(existing) =
        repositories::attempts::find_by_user_quiz(pool, user_id, quiz_id).await?
    {
        return guard_in_progress(existing);
    }

    let attempt_id = Uuid::new_v4().to_string();
    let inserted = repositories::attempts::create(
        pool,
        repositories::attempts::CreateAttempt {
            id: &attempt_id,
            user_id,
            quiz_id,
            started_at: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    if inserted {
        return repositories::attempts::find_by_id(pool, &attempt_id)
            .await?
            .ok_or(ExamFlowError::AttemptNotFound);
    }

    // Lost the creation race; the surviving row decides.
    let existing = repositories::attempts::find_by_user_quiz(pool, user_id, quiz_id)
        .await?
        .ok_or(ExamFlowError::AttemptNotFound)?;
    guard_in_progress(existing)
}

fn guard_in_progress(attempt: Attempt) -> Result<Attempt, ExamFlowError> {
    match attempt.status {
        AttemptStatus::Completed => Err(ExamFlowError::AttemptAlreadyFinished),
        AttemptStatus::InProgress => Ok(attempt),
    }
}

/// Upsert the response for (attempt, question): last write wins, a repeat
/// save overwrites in place. Writes against a completed attempt are
/// rejected so the scored response set stays frozen.
pub(crate) async fn save_answer(
    pool: &PgPool,
    user_id: &str,
    attempt_id: &str,
    question_id: &str,
    selected_option: &str,
    is_flagged: bool,
) -> Result<Response, ExamFlowError> {
    let attempt = owned_attempt(pool, user_id, attempt_id).await?;
    let attempt = guard_in_progress(attempt)?;

    let question = repositories::questions::find_by_id(pool, question_id)
        .await?
        .ok_or(ExamFlowError::QuestionNotFound)?;
    if question.quiz_id != attempt.quiz_id {
        return Err(ExamFlowError::Validation(
            "question does not belong to this attempt's quiz".to_string(),
        ));
    }

    let response = repositories::responses::upsert(
        pool,
        repositories::responses::UpsertResponse {
            id: &Uuid::new_v4().to_string(),
            attempt_id: &attempt.id,
            question_id: &question.id,
            selected_option,
            is_flagged,
            now: primitive_now_utc(),
        },
    )
    .await?;

    Ok(response)
}

/// Finalize the attempt. The transaction locks the attempt row, so a
/// concurrent submit serializes behind this one, observes `completed`, and
/// returns the stored score without re-scoring anything.
pub(crate) async fn submit(
    pool: &PgPool,
    user_id: &str,
    attempt_id: &str,
) -> Result<Attempt, ExamFlowError> {
    let mut tx = pool.begin().await?;

    let attempt = repositories::attempts::find_for_update(&mut *tx, attempt_id)
        .await?
        .ok_or(ExamFlowError::AttemptNotFound)?;
    if attempt.user_id != user_id {
        return Err(ExamFlowError::AttemptNotFound);
    }

    if attempt.status == AttemptStatus::Completed {
        tx.commit().await?;
        return Ok(attempt);
    }

    let key = repositories::questions::answer_key_by_quiz(&mut *tx, &attempt.quiz_id).await?;
    let responses = repositories::responses::list_by_attempt(&mut *tx, &attempt.id).await?;
    let total_score = scoring::score_attempt(&responses, &key);

    let now = primitive_now_utc();
    repositories::attempts::finalize(&mut *tx, &attempt.id, total_score, now).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user_id,
        attempt_id = %attempt_id,
        total_score,
        "Attempt submitted and scored"
    );

    repositories::attempts::find_by_id(pool, attempt_id)
        .await?
        .ok_or(ExamFlowError::AttemptNotFound)
}

/// Resolve the attempt and code question a judge run targets, with the same
/// guards as answer saves.
pub(crate) async fn prepare_code_run(
    pool: &PgPool,
    user_id: &str,
    attempt_id: &str,
    question_id: &str,
) -> Result<(Attempt, Question), ExamFlowError> {
    let attempt = owned_attempt(pool, user_id, attempt_id).await?;
    let attempt = guard_in_progress(attempt)?;

    let question = repositories::questions::find_by_id(pool, question_id)
        .await?
        .ok_or(ExamFlowError::QuestionNotFound)?;
    if question.quiz_id != attempt.quiz_id {
        return Err(ExamFlowError::Validation(
            "question does not belong to this attempt's quiz".to_string(),
        ));
    }
    if question.kind != QuestionKind::Code {
        return Err(ExamFlowError::Validation("question is not a code question".to_string()));
    }

    Ok((attempt, question))
}

/// Record a judge-accepted solution. Reuses the response upsert, so a
/// re-run overwrites the same row; the marker also drops any stale review
/// flag on that question.
pub(crate) async fn record_code_success(
    pool: &PgPool,
    attempt_id: &str,
    question_id: &str,
) -> Result<Response, ExamFlowError> {
    let response = repositories::responses::upsert(
        pool,
        repositories::responses::UpsertResponse {
            id: &Uuid::new_v4().to_string(),
            attempt_id,
            question_id,
            selected_option: scoring::CODE_SUCCESS,
            is_flagged: false,
            now: primitive_now_utc(),
        },
    )
    .await?;

    Ok(response)
}

/// Fetch an attempt owned by `user_id`. A foreign attempt id is reported as
/// not-found rather than forbidden so ids don't leak across students.
async fn owned_attempt(
    pool: &PgPool,
    user_id: &str,
    attempt_id: &str,
) -> Result<Attempt, ExamFlowError> {
    let attempt = repositories::attempts::find_by_id(pool, attempt_id)
        .await?
        .ok_or(ExamFlowError::AttemptNotFound)?;
    if attempt.user_id != user_id {
        return Err(ExamFlowError::AttemptNotFound);
    }
    Ok(attempt)
}
