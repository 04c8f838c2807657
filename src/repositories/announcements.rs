use sqlx::PgPool;

use crate::db::models::Announcement;

const COLUMNS: &str = "id, message, is_active, updated_at";

pub(crate) async fn get(pool: &PgPool) -> Result<Option<Announcement>, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {COLUMNS} FROM announcements WHERE id = 1"
    ))
    .fetch_optional(pool)
    .await
}

pub(crate) async fn publish(
    pool: &PgPool,
    message: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE announcements SET message = $1, is_active = TRUE, updated_at = $2 WHERE id = 1",
    )
    .bind(message)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn clear(pool: &PgPool, now: time::PrimitiveDateTime) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE announcements SET is_active = FALSE, updated_at = $1 WHERE id = 1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}
