use sqlx::{FromRow, PgPool};

use crate::db::models::Attempt;
use crate::db::types::AttemptStatus;

const COLUMNS: &str = "\
    id, user_id, quiz_id, total_score, status, certificate_approved, \
    started_at, completed_at, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!("SELECT {COLUMNS} FROM attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Locks the attempt row for the enclosing transaction. Submit uses this so
/// concurrent submitters serialize on the row and the loser observes the
/// already-completed status.
pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {COLUMNS} FROM attempts WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_user_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: &str,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {COLUMNS} FROM attempts WHERE user_id = $1 AND quiz_id = $2"
    ))
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// Inserts a fresh in-progress attempt. The unique index on
/// (user_id, quiz_id) is the arbiter: a concurrent creator loses the race,
/// gets `false` back, and must re-fetch the surviving row.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO attempts (
            id, user_id, quiz_id, total_score, status, certificate_approved,
            started_at, created_at, updated_at
        ) VALUES ($1,$2,$3,0,$4,FALSE,$5,$6,$7)
        ON CONFLICT (user_id, quiz_id) DO NOTHING",
    )
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.quiz_id)
    .bind(AttemptStatus::InProgress)
    .bind(params.started_at)
    .bind(params.created_at)
    .bind(params.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn finalize(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    total_score: i32,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE attempts
         SET total_score = $1, status = $2, completed_at = $3, updated_at = $3
         WHERE id = $4",
    )
    .bind(total_score)
    .bind(AttemptStatus::Completed)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Certificate approval only makes sense on a completed attempt; the WHERE
/// clause keeps in-progress rows untouched.
pub(crate) async fn approve_certificate(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE attempts SET certificate_approved = TRUE, updated_at = $1
         WHERE id = $2 AND status = $3",
    )
    .bind(now)
    .bind(id)
    .bind(AttemptStatus::Completed)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// One row of a student's attempt history, joined with the quiz title.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct HistoryRow {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) total_score: i32,
    pub(crate) status: AttemptStatus,
    pub(crate) certificate_approved: bool,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) completed_at: Option<time::PrimitiveDateTime>,
}

pub(crate) async fn list_history_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<HistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, HistoryRow>(
        "SELECT a.id, a.quiz_id, q.title AS quiz_title, a.total_score, a.status,
                a.certificate_approved, a.started_at, a.completed_at
         FROM attempts a
         JOIN quizzes q ON a.quiz_id = q.id
         WHERE a.user_id = $1
         ORDER BY a.started_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// One row of the administrative results view.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ResultRow {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) total_score: i32,
    pub(crate) status: AttemptStatus,
    pub(crate) certificate_approved: bool,
    pub(crate) completed_at: Option<time::PrimitiveDateTime>,
}

pub(crate) async fn list_results(pool: &PgPool) -> Result<Vec<ResultRow>, sqlx::Error> {
    sqlx::query_as::<_, ResultRow>(
        "SELECT a.id, a.user_id, u.full_name, u.email, a.quiz_id,
                q.title AS quiz_title, a.total_score, a.status,
                a.certificate_approved, a.completed_at
         FROM attempts a
         JOIN users u ON a.user_id = u.id
         JOIN quizzes q ON a.quiz_id = q.id
         ORDER BY a.total_score DESC, a.started_at ASC",
    )
    .fetch_all(pool)
    .await
}

/// Everything the certificate gate needs in one join.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct CertificateRow {
    pub(crate) attempt_id: String,
    pub(crate) user_id: String,
    pub(crate) full_name: String,
    pub(crate) quiz_title: String,
    pub(crate) total_score: i32,
    pub(crate) status: AttemptStatus,
    pub(crate) certificate_approved: bool,
    pub(crate) completed_at: Option<time::PrimitiveDateTime>,
}

pub(crate) async fn find_certificate_row(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Option<CertificateRow>, sqlx::Error> {
    sqlx::query_as::<_, CertificateRow>(
        "SELECT a.id AS attempt_id, a.user_id, u.full_name, q.title AS quiz_title,
                a.total_score, a.status, a.certificate_approved, a.completed_at
         FROM attempts a
         JOIN users u ON a.user_id = u.id
         JOIN quizzes q ON a.quiz_id = q.id
         WHERE a.id = $1",
    )
    .bind(attempt_id)
    .fetch_optional(pool)
    .await
}
