use std::collections::HashMap;

use crate::repositories::attempts::AnswerRow;
use crate::repositories::exams::ExamAnswerKey;

/// Grades a full attempt against the exam's answer keys.
///
/// Every snapshot question yields exactly one row, whether or not it was
/// answered; a missing selection is stored as the empty string and counts
/// as incorrect. Correctness is value equality against the key, so the
/// presentation order of options (or of questions) never matters.
pub(crate) fn grade_attempt(
    keys: &[ExamAnswerKey],
    selected: &HashMap<String, String>,
) -> (Vec<AnswerRow>, usize) {
    let mut rows = Vec::with_capacity(keys.len());
    let mut correct = 0;

    for (index, key) in keys.iter().enumerate() {
        let selected_option = selected.get(&key.question_id).cloned().unwrap_or_default();
        let is_correct = !selected_option.is_empty() && selected_option == key.correct_option;
        if is_correct {
            correct += 1;
        }

        rows.push(AnswerRow {
            question_id: key.question_id.clone(),
            selected_option,
            is_correct,
            order_index: index as i32,
        });
    }

    (rows, correct)
}

/// Integer percentage, rounded half-up like the reporting UI expects.
/// An exam with no questions scores zero rather than dividing by zero.
pub(crate) fn percentage_score(correct: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as i32
}

/// Elapsed seconds charged to the attempt: the full budget minus whatever
/// was left on the clock, clamped into `[0, duration]`.
pub(crate) fn time_taken_seconds(duration_minutes: i32, remaining_seconds: i64) -> i32 {
    let budget = i64::from(duration_minutes) * 60;
    (budget - remaining_seconds).clamp(0, budget) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(question_id: &str, correct_option: &str) -> ExamAnswerKey {
        ExamAnswerKey {
            question_id: question_id.to_string(),
            correct_option: correct_option.to_string(),
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(q, v)| (q.to_string(), v.to_string())).collect()
    }

    #[test]
    fn grades_by_value_equality() {
        let keys = vec![key("q1", "4"), key("q2", "blue")];
        let (rows, correct) = grade_attempt(&keys, &answers(&[("q1", "4"), ("q2", "red")]));

        assert_eq!(correct, 1);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_correct);
        assert!(!rows[1].is_correct);
        assert_eq!(rows[1].selected_option, "red");
    }

    #[test]
    fn unanswered_questions_get_empty_incorrect_rows() {
        let keys = vec![key("q1", "a"), key("q2", "b"), key("q3", "c")];
        let (rows, correct) = grade_attempt(&keys, &answers(&[("q2", "b")]));

        assert_eq!(correct, 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].selected_option, "");
        assert!(!rows[0].is_correct);
        assert_eq!(rows[2].selected_option, "");
        assert!(!rows[2].is_correct);
    }

    #[test]
    fn empty_correct_option_never_matches_an_empty_selection() {
        // A blank selection must not be graded correct even if the key is
        // somehow blank too.
        let keys = vec![key("q1", "")];
        let (rows, correct) = grade_attempt(&keys, &HashMap::new());
        assert_eq!(correct, 0);
        assert!(!rows[0].is_correct);
    }

    #[test]
    fn order_indices_follow_the_key_order() {
        let keys = vec![key("q9", "a"), key("q3", "b"), key("q5", "c")];
        let (rows, _) = grade_attempt(&keys, &HashMap::new());
        let indices: Vec<i32> = rows.iter().map(|row| row.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(rows[1].question_id, "q3");
    }

    #[test]
    fn percentage_rounds_to_nearest_integer() {
        assert_eq!(percentage_score(0, 2), 0);
        assert_eq!(percentage_score(1, 2), 50);
        assert_eq!(percentage_score(2, 2), 100);
        assert_eq!(percentage_score(1, 3), 33);
        assert_eq!(percentage_score(2, 3), 67);
        assert_eq!(percentage_score(1, 6), 17);
    }

    #[test]
    fn percentage_of_empty_exam_is_zero() {
        assert_eq!(percentage_score(0, 0), 0);
    }

    #[test]
    fn time_taken_is_clamped_to_the_duration() {
        assert_eq!(time_taken_seconds(1, 60), 0);
        assert_eq!(time_taken_seconds(1, 15), 45);
        assert_eq!(time_taken_seconds(1, 0), 60);
        // A clock that somehow reports more time left than the budget, or
        // negative remaining time, still lands inside the envelope.
        assert_eq!(time_taken_seconds(1, 600), 0);
        assert_eq!(time_taken_seconds(1, -5), 60);
    }
}
