use time::PrimitiveDateTime;

use crate::core::time::format_primitive;

/// Scheduled-start gate for a quiz, derived at read time from the current
/// clock. No scheduler runs anywhere; every request re-evaluates.
#[derive(Debug, Clone)]
pub(crate) struct QuizGate {
    pub(crate) is_locked: bool,
    pub(crate) seconds_left: i64,
    pub(crate) time_msg: String,
}

pub(crate) fn evaluate(start_time: Option<PrimitiveDateTime>, now: PrimitiveDateTime) -> QuizGate {
    match start_time {
        Some(start) if start > now => {
            let seconds_left = (start - now).whole_seconds().max(1);
            QuizGate {
                is_locked: true,
                seconds_left,
                time_msg: format!("Starts: {}", format_primitive(start)),
            }
        }
        // A null start time means the quiz is open immediately.
        _ => QuizGate { is_locked: false, seconds_left: 0, time_msg: "Live Now".to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn future_start_locks_with_positive_countdown() {
        let now = datetime!(2026-03-01 12:00:00);
        let gate = evaluate(Some(datetime!(2026-03-01 12:30:00)), now);

        assert!(gate.is_locked);
        assert_eq!(gate.seconds_left, 1800);
        assert!(gate.time_msg.starts_with("Starts: "));
    }

    #[test]
    fn past_start_is_live() {
        let now = datetime!(2026-03-01 12:00:00);
        let gate = evaluate(Some(datetime!(2026-03-01 11:00:00)), now);

        assert!(!gate.is_locked);
        assert_eq!(gate.seconds_left, 0);
        assert_eq!(gate.time_msg, "Live Now");
    }

    #[test]
    fn missing_start_is_live() {
        let now = datetime!(2026-03-01 12:00:00);
        let gate = evaluate(None, now);

        assert!(!gate.is_locked);
        assert_eq!(gate.seconds_left, 0);
    }

    #[test]
    fn sub_second_future_start_still_reports_time_left() {
        let now = datetime!(2026-03-01 12:00:00);
        let gate = evaluate(Some(datetime!(2026-03-01 12:00:00.5)), now);

        assert!(gate.is_locked);
        assert_eq!(gate.seconds_left, 1);
    }
}
