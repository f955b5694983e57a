//! # Scoring
//!
//! Pure functions over quiz answers. Nothing here touches storage or the
//! network.
//!
//! An answer is a set of option indexes. Order never matters: `[2, 0]` and
//! `[0, 2]` are the same answer, and a question with no correct options is
//! answered correctly by selecting nothing.

pub mod timer;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::model::QuizContent;

/// One question's correct options next to what the user selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub correct: Vec<usize>,
    pub submitted: Vec<usize>,
}

impl AnswerRecord {
    pub fn new(correct: Vec<usize>, submitted: Vec<usize>) -> Self {
        Self { correct, submitted }
    }

    pub fn is_correct(&self) -> bool {
        answers_equal(&self.correct, &self.submitted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Set equality: same length and same elements once both are sorted.
pub fn answers_equal(correct: &[usize], submitted: &[usize]) -> bool {
    if correct.len() != submitted.len() {
        return false;
    }
    let mut a = correct.to_vec();
    let mut b = submitted.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

pub fn calculate_score(answers: &[AnswerRecord]) -> usize {
    answers.iter().filter(|a| a.is_correct()).count()
}

/// Share of correct answers in `[0, 100]`. An empty list yields NaN.
pub fn calculate_score_percentage(answers: &[AnswerRecord]) -> f64 {
    calculate_score(answers) as f64 / answers.len() as f64 * 100.0
}

/// Pair a quiz's questions with the user's selections and score them.
///
/// `selections[i]` answers question `i`. The quiz must have questions and
/// every question must have exactly one selection entry (possibly empty).
pub fn score_attempt(quiz: &QuizContent, selections: &[Vec<usize>]) -> Result<QuizResult> {
    if quiz.quiz_content.is_empty() {
        return Err(SyncError::Validation(
            "This quiz has no questions to score".to_string(),
        ));
    }
    if selections.len() != quiz.quiz_content.len() {
        return Err(SyncError::Validation(format!(
            "Expected answers for {} question(s), got {}",
            quiz.quiz_content.len(),
            selections.len()
        )));
    }

    let answers: Vec<AnswerRecord> = quiz
        .quiz_content
        .iter()
        .zip(selections)
        .map(|(question, selected)| {
            AnswerRecord::new(question.correct_answers.clone(), selected.clone())
        })
        .collect();

    Ok(QuizResult {
        score: calculate_score(&answers),
        total: answers.len(),
        percentage: calculate_score_percentage(&answers),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    fn record(correct: &[usize], submitted: &[usize]) -> AnswerRecord {
        AnswerRecord::new(correct.to_vec(), submitted.to_vec())
    }

    fn question(correct: &[usize]) -> Question {
        Question {
            question: "?".to_string(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answers: correct.to_vec(),
        }
    }

    #[test]
    fn test_answers_equal_ignores_order() {
        assert!(answers_equal(&[2, 0], &[0, 2]));
        assert!(answers_equal(&[0, 2], &[2, 0]));
        assert!(answers_equal(&[1], &[1]));
    }

    #[test]
    fn test_answers_equal_empty_sets() {
        assert!(answers_equal(&[], &[]));
        assert!(!answers_equal(&[], &[0]));
    }

    #[test]
    fn test_answers_equal_requires_same_length() {
        assert!(!answers_equal(&[0, 1], &[0]));
        assert!(!answers_equal(&[0, 0], &[0, 1]));
    }

    #[test]
    fn test_score_counts_every_match() {
        let all = vec![record(&[0], &[0]), record(&[1, 2], &[2, 1])];
        assert_eq!(calculate_score(&all), 2);

        let none = vec![record(&[0], &[1]), record(&[1, 2], &[1])];
        assert_eq!(calculate_score(&none), 0);
    }

    #[test]
    fn test_percentage_half() {
        let answers = vec![record(&[0], &[0]), record(&[1], &[2])];
        assert_eq!(calculate_score_percentage(&answers), 50.0);
    }

    #[test]
    fn test_percentage_of_nothing_is_nan() {
        assert!(calculate_score_percentage(&[]).is_nan());
    }

    #[test]
    fn test_score_attempt_builds_result() {
        let quiz = QuizContent {
            quiz_content: vec![question(&[0]), question(&[1, 2]), question(&[2])],
            ..Default::default()
        };
        let result = score_attempt(&quiz, &[vec![0], vec![2, 1], vec![0]]).unwrap();
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 3);
        assert!((result.percentage - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_score_attempt_rejects_bad_shapes() {
        let empty = QuizContent::default();
        assert!(score_attempt(&empty, &[]).unwrap_err().is_validation());

        let quiz = QuizContent {
            quiz_content: vec![question(&[0]), question(&[1])],
            ..Default::default()
        };
        assert!(score_attempt(&quiz, &[vec![0]]).unwrap_err().is_validation());
    }
}
