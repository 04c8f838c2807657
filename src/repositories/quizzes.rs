use sqlx::PgPool;

use crate::db::models::Quiz;

const COLUMNS: &str = "\
    id, title, category, duration_minutes, total_marks, start_time, \
    created_by, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes ORDER BY start_time ASC NULLS FIRST, created_at ASC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateQuiz<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) category: &'a str,
    pub(crate) duration_minutes: i32,
    pub(crate) total_marks: i32,
    pub(crate) start_time: Option<time::PrimitiveDateTime>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateQuiz<'_>) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            id, title, category, duration_minutes, total_marks, start_time,
            created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.category)
    .bind(params.duration_minutes)
    .bind(params.total_marks)
    .bind(params.start_time)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateQuiz {
    pub(crate) title: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) total_marks: Option<i32>,
    pub(crate) start_time: Option<Option<time::PrimitiveDateTime>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuiz,
) -> Result<Option<Quiz>, sqlx::Error> {
    // start_time is double-optional: the outer None leaves the column alone,
    // Some(None) clears the schedule.
    let (set_start, start_time) = match params.start_time {
        Some(value) => (true, value),
        None => (false, None),
    };

    sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET
            title = COALESCE($1, title),
            category = COALESCE($2, category),
            duration_minutes = COALESCE($3, duration_minutes),
            total_marks = COALESCE($4, total_marks),
            start_time = CASE WHEN $5 THEN $6 ELSE start_time END,
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.category)
    .bind(params.duration_minutes)
    .bind(params.total_marks)
    .bind(set_start)
    .bind(start_time)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
