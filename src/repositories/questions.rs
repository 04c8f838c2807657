use sqlx::{FromRow, PgPool};

use crate::db::models::Question;
use crate::db::types::QuestionKind;

const COLUMNS: &str = "\
    id, quiz_id, kind, question_text, option_a, option_b, option_c, option_d, \
    correct_option, test_input, test_output, marks, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_quiz(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE quiz_id = $1"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

/// Scoring view of a question: just enough to match a stored response
/// against the key.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AnswerKeyRow {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) correct_option: Option<String>,
}

pub(crate) async fn answer_key_by_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<Vec<AnswerKeyRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerKeyRow>(
        "SELECT id, kind, correct_option FROM questions WHERE quiz_id = $1",
    )
    .bind(quiz_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) question_text: &'a str,
    pub(crate) option_a: Option<String>,
    pub(crate) option_b: Option<String>,
    pub(crate) option_c: Option<String>,
    pub(crate) option_d: Option<String>,
    pub(crate) correct_option: Option<String>,
    pub(crate) test_input: Option<String>,
    pub(crate) test_output: Option<String>,
    pub(crate) marks: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, quiz_id, kind, question_text, option_a, option_b, option_c, option_d,
            correct_option, test_input, test_output, marks, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.kind)
    .bind(params.question_text)
    .bind(params.option_a)
    .bind(params.option_b)
    .bind(params.option_c)
    .bind(params.option_d)
    .bind(params.correct_option)
    .bind(params.test_input)
    .bind(params.test_output)
    .bind(params.marks)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateQuestion {
    pub(crate) question_text: Option<String>,
    pub(crate) option_a: Option<String>,
    pub(crate) option_b: Option<String>,
    pub(crate) option_c: Option<String>,
    pub(crate) option_d: Option<String>,
    pub(crate) correct_option: Option<String>,
    pub(crate) test_input: Option<String>,
    pub(crate) test_output: Option<String>,
    pub(crate) marks: Option<i32>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            question_text = COALESCE($1, question_text),
            option_a = COALESCE($2, option_a),
            option_b = COALESCE($3, option_b),
            option_c = COALESCE($4, option_c),
            option_d = COALESCE($5, option_d),
            correct_option = COALESCE($6, correct_option),
            test_input = COALESCE($7, test_input),
            test_output = COALESCE($8, test_output),
            marks = COALESCE($9, marks)
         WHERE id = $10
         RETURNING {COLUMNS}",
    ))
    .bind(params.question_text)
    .bind(params.option_a)
    .bind(params.option_b)
    .bind(params.option_c)
    .bind(params.option_d)
    .bind(params.correct_option)
    .bind(params.test_input)
    .bind(params.test_output)
    .bind(params.marks)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
