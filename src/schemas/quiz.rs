use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Quiz;
use crate::services::quiz_gate::QuizGate;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub(crate) category: String,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(alias = "totalMarks")]
    #[validate(range(min = 0, message = "total_marks must be non-negative"))]
    pub(crate) total_marks: i32,
    #[serde(
        default,
        alias = "startTime",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) start_time: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub(crate) category: Option<String>,
    #[serde(default, alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default, alias = "totalMarks")]
    #[validate(range(min = 0, message = "total_marks must be non-negative"))]
    pub(crate) total_marks: Option<i32>,
    #[serde(
        default,
        alias = "startTime",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) start_time: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) category: String,
    pub(crate) duration_minutes: i32,
    pub(crate) total_marks: i32,
    pub(crate) start_time: Option<String>,
    pub(crate) is_locked: bool,
    pub(crate) seconds_left: i64,
    pub(crate) time_msg: String,
    pub(crate) created_at: String,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz, gate: QuizGate) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            category: quiz.category,
            duration_minutes: quiz.duration_minutes,
            total_marks: quiz.total_marks,
            start_time: quiz.start_time.map(format_primitive),
            is_locked: gate.is_locked,
            seconds_left: gate.seconds_left,
            time_msg: gate.time_msg,
            created_at: format_primitive(quiz.created_at),
        }
    }
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // Browser datetime-local inputs often send without timezone.
    if raw.len() == 16 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}:00Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    if raw.len() == 19 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
    {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_option_offset_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_offset_datetime_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_offset_datetime_flexible("2026-03-01T12:00:00Z").expect("rfc3339");
        assert_eq!(parsed.unix_timestamp(), 1772366400);
    }

    #[test]
    fn parses_datetime_local_without_timezone() {
        assert!(parse_offset_datetime_flexible("2026-03-01T12:00").is_some());
        assert!(parse_offset_datetime_flexible("2026-03-01T12:00:00").is_some());
    }

    #[test]
    fn parses_space_separated_timestamp() {
        assert!(parse_offset_datetime_flexible("2026-03-01 12:00:00").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_offset_datetime_flexible("next tuesday").is_none());
    }
}
