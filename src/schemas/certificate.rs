use serde::Serialize;

use crate::core::time::format_primitive;
use crate::repositories::attempts::CertificateRow;

/// The payload the external certificate renderer consumes. Only produced
/// for eligible attempts.
#[derive(Debug, Serialize)]
pub(crate) struct CertificateResponse {
    pub(crate) attempt_id: String,
    pub(crate) student_name: String,
    pub(crate) quiz_title: String,
    pub(crate) score: i32,
    pub(crate) date: Option<String>,
}

impl CertificateResponse {
    pub(crate) fn from_row(row: CertificateRow) -> Self {
        Self {
            attempt_id: row.attempt_id,
            student_name: row.full_name,
            quiz_title: row.quiz_title,
            score: row.total_score,
            date: row.completed_at.map(format_primitive),
        }
    }
}
