use crate::db::models::Response;

const COLUMNS: &str = "\
    id, attempt_id, question_id, selected_option, is_flagged, created_at, updated_at";

pub(crate) struct UpsertResponse<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_option: &'a str,
    pub(crate) is_flagged: bool,
    pub(crate) now: time::PrimitiveDateTime,
}

/// Last-write-wins upsert keyed on (attempt_id, question_id). Repeated saves
/// overwrite in place; two concurrent savers resolve by arrival order at
/// Postgres, never by duplicating rows.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertResponse<'_>,
) -> Result<Response, sqlx::Error> {
    sqlx::query_as::<_, Response>(&format!(
        "INSERT INTO responses (
            id, attempt_id, question_id, selected_option, is_flagged, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$6)
        ON CONFLICT (attempt_id, question_id) DO UPDATE SET
            selected_option = EXCLUDED.selected_option,
            is_flagged = EXCLUDED.is_flagged,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.selected_option)
    .bind(params.is_flagged)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_attempt(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<Vec<Response>, sqlx::Error> {
    sqlx::query_as::<_, Response>(&format!(
        "SELECT {COLUMNS} FROM responses WHERE attempt_id = $1"
    ))
    .bind(attempt_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_by_attempt(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE attempt_id = $1")
        .bind(attempt_id)
        .fetch_one(executor)
        .await
}
