use std::collections::HashMap;

use crate::db::models::Response;
use crate::db::types::QuestionKind;
use crate::repositories::questions::AnswerKeyRow;

/// Sentinel stored as a response's selected_option once the external judge
/// accepted the student's code for that question.
pub(crate) const CODE_SUCCESS: &str = "CODE_SUCCESS";

/// Every correct answer is worth a flat 5 points. The per-question `marks`
/// column is intentionally not consulted; this mirrors the behavior the
/// product has always had.
pub(crate) const POINTS_PER_CORRECT: i32 = 5;

/// Derives the final score from the stored responses and the quiz answer
/// key. Pure: the same inputs always produce the same score, which is what
/// makes re-submits safe to short-circuit.
pub(crate) fn score_attempt(responses: &[Response], key: &[AnswerKeyRow]) -> i32 {
    let by_id: HashMap<&str, &AnswerKeyRow> =
        key.iter().map(|row| (row.id.as_str(), row)).collect();

    let correct = responses
        .iter()
        .filter(|response| {
            by_id
                .get(response.question_id.as_str())
                .is_some_and(|question| is_correct(response, question))
        })
        .count();

    correct as i32 * POINTS_PER_CORRECT
}

fn is_correct(response: &Response, question: &AnswerKeyRow) -> bool {
    match question.kind {
        // Judged code questions carry the success marker and are
        // automatically correct.
        QuestionKind::Code => response.selected_option == CODE_SUCCESS,
        QuestionKind::Mcq => question
            .correct_option
            .as_deref()
            .is_some_and(|correct| response.selected_option == correct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn response(question_id: &str, selected: &str) -> Response {
        let at = datetime!(2026-01-10 09:00:00);
        Response {
            id: format!("r-{question_id}"),
            attempt_id: "attempt-1".to_string(),
            question_id: question_id.to_string(),
            selected_option: selected.to_string(),
            is_flagged: false,
            created_at: at,
            updated_at: at,
        }
    }

    fn mcq(id: &str, correct: &str) -> AnswerKeyRow {
        AnswerKeyRow {
            id: id.to_string(),
            kind: QuestionKind::Mcq,
            correct_option: Some(correct.to_string()),
        }
    }

    fn code(id: &str) -> AnswerKeyRow {
        AnswerKeyRow { id: id.to_string(), kind: QuestionKind::Code, correct_option: None }
    }

    #[test]
    fn two_of_three_mcq_score_ten() {
        let key = vec![mcq("q1", "A"), mcq("q2", "B"), mcq("q3", "C")];
        let responses =
            vec![response("q1", "A"), response("q2", "B"), response("q3", "D")];

        assert_eq!(score_attempt(&responses, &key), 10);
    }

    #[test]
    fn code_success_marker_counts_as_correct() {
        let key = vec![mcq("q1", "A"), code("q2")];
        let responses = vec![response("q1", "A"), response("q2", CODE_SUCCESS)];

        assert_eq!(score_attempt(&responses, &key), 2 * POINTS_PER_CORRECT);
    }

    #[test]
    fn code_question_without_marker_scores_nothing() {
        let key = vec![code("q1")];
        let responses = vec![response("q1", "print('hi')")];

        assert_eq!(score_attempt(&responses, &key), 0);
    }

    #[test]
    fn unanswered_questions_score_nothing() {
        let key = vec![mcq("q1", "A"), mcq("q2", "B")];
        let responses = vec![response("q1", "A")];

        assert_eq!(score_attempt(&responses, &key), POINTS_PER_CORRECT);
    }

    #[test]
    fn responses_to_unknown_questions_are_ignored() {
        let key = vec![mcq("q1", "A")];
        let responses = vec![response("q1", "A"), response("stale", "A")];

        assert_eq!(score_attempt(&responses, &key), POINTS_PER_CORRECT);
    }

    #[test]
    fn empty_attempt_scores_zero() {
        let key = vec![mcq("q1", "A")];
        assert_eq!(score_attempt(&[], &key), 0);
    }
}
