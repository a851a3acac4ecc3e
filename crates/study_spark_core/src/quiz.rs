//! crates/study_spark_core/src/quiz.rs
//!
//! Local scoring of multiple-choice quizzes. No network involvement:
//! once a quiz has been generated, answering and scoring are pure
//! state transitions.

use crate::domain::QuizQuestion;
use std::collections::BTreeMap;

/// Number of answer options every well-formed quiz question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Checks the structural invariants of a generated quiz: four options
/// per question and a correct-answer index inside them.
///
/// Returns the description of the first violation, if any.
pub fn validate_quiz(items: &[QuizQuestion]) -> Result<(), String> {
    if items.is_empty() {
        return Err("quiz contains no questions".to_string());
    }
    for (index, item) in items.iter().enumerate() {
        if item.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "question {} has {} options, expected {}",
                index,
                item.options.len(),
                OPTIONS_PER_QUESTION
            ));
        }
        if item.correct_answer_index >= item.options.len() {
            return Err(format!(
                "question {} declares correct answer {} outside its options",
                index, item.correct_answer_index
            ));
        }
    }
    Ok(())
}

/// Why an answer submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizAnswerError {
    #[error("No quiz is currently active")]
    NoActiveQuiz,
    #[error("Question {0} does not exist")]
    UnknownQuestion(usize),
    #[error("Option {0} is out of range")]
    InvalidOption(usize),
    #[error("Question {0} has already been answered")]
    AlreadyAnswered(usize),
}

/// The recorded outcome for one answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub chosen_index: usize,
    pub is_correct: bool,
}

/// What the caller shows the user right after an answer lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer_index: usize,
    pub explanation: String,
    pub score: usize,
    pub answered: usize,
    pub total: usize,
    pub completed: bool,
}

/// Tracks one attempt at a generated quiz.
///
/// Each question moves `unanswered -> answered(correct | incorrect)`
/// exactly once; re-answering is rejected and leaves the score
/// untouched. The attempt is complete when every question has
/// transitioned out of `unanswered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    answers: BTreeMap<usize, AnswerRecord>,
    total: usize,
}

impl QuizAttempt {
    pub fn new(question_count: usize) -> Self {
        Self {
            answers: BTreeMap::new(),
            total: question_count,
        }
    }

    /// Submits an answer for one question against the quiz it was
    /// created from.
    pub fn answer(
        &mut self,
        questions: &[QuizQuestion],
        question_index: usize,
        chosen_index: usize,
    ) -> Result<AnswerFeedback, QuizAnswerError> {
        let question = questions
            .get(question_index)
            .ok_or(QuizAnswerError::UnknownQuestion(question_index))?;
        if chosen_index >= question.options.len() {
            return Err(QuizAnswerError::InvalidOption(chosen_index));
        }
        if self.answers.contains_key(&question_index) {
            return Err(QuizAnswerError::AlreadyAnswered(question_index));
        }

        let is_correct = chosen_index == question.correct_answer_index;
        self.answers.insert(
            question_index,
            AnswerRecord {
                chosen_index,
                is_correct,
            },
        );

        Ok(AnswerFeedback {
            is_correct,
            correct_answer_index: question.correct_answer_index,
            explanation: question.explanation.clone(),
            score: self.score(),
            answered: self.answered(),
            total: self.total,
            completed: self.is_complete(),
        })
    }

    /// Running score: the count of correct transitions so far.
    pub fn score(&self) -> usize {
        self.answers.values().filter(|record| record.is_correct).count()
    }

    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Complete exactly when every question index has been answered.
    pub fn is_complete(&self) -> bool {
        self.answers.len() == self.total
    }

    pub fn record_for(&self, question_index: usize) -> Option<&AnswerRecord> {
        self.answers.get(&question_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion {
            question: "Which pigment drives photosynthesis?".to_string(),
            options: vec![
                "Hemoglobin".to_string(),
                "Chlorophyll".to_string(),
                "Keratin".to_string(),
                "Melanin".to_string(),
            ],
            correct_answer_index: correct,
            explanation: "Chlorophyll absorbs the light used to fix carbon.".to_string(),
        }
    }

    fn quiz(correct_indexes: &[usize]) -> Vec<QuizQuestion> {
        correct_indexes.iter().map(|&i| question(i)).collect()
    }

    #[test]
    fn validation_accepts_a_well_formed_quiz() {
        assert_eq!(validate_quiz(&quiz(&[0, 1, 2, 3, 1])), Ok(()));
    }

    #[test]
    fn validation_rejects_wrong_option_count() {
        let mut items = quiz(&[1]);
        items[0].options.pop();
        let error = validate_quiz(&items).unwrap_err();
        assert!(error.contains("3 options"));
    }

    #[test]
    fn validation_rejects_out_of_range_answer_index() {
        let mut items = quiz(&[1]);
        items[0].correct_answer_index = 4;
        assert!(validate_quiz(&items).is_err());
    }

    #[test]
    fn validation_rejects_an_empty_quiz() {
        assert!(validate_quiz(&[]).is_err());
    }

    #[test]
    fn answering_twice_is_rejected_and_does_not_change_the_score() {
        let items = quiz(&[1, 2]);
        let mut attempt = QuizAttempt::new(items.len());

        let feedback = attempt.answer(&items, 0, 1).unwrap();
        assert!(feedback.is_correct);
        assert_eq!(attempt.score(), 1);

        // The transition is one-way: a second answer, correct or not,
        // must be rejected without touching the score.
        assert_eq!(
            attempt.answer(&items, 0, 3),
            Err(QuizAnswerError::AlreadyAnswered(0))
        );
        assert_eq!(
            attempt.answer(&items, 0, 1),
            Err(QuizAnswerError::AlreadyAnswered(0))
        );
        assert_eq!(attempt.score(), 1);
    }

    #[test]
    fn completion_triggers_when_all_questions_are_answered() {
        let items = quiz(&[0, 1, 2]);
        let mut attempt = QuizAttempt::new(items.len());

        assert!(!attempt.is_complete());
        attempt.answer(&items, 2, 2).unwrap();
        attempt.answer(&items, 0, 3).unwrap();
        assert!(!attempt.is_complete());

        let last = attempt.answer(&items, 1, 1).unwrap();
        assert!(last.completed);
        assert!(attempt.is_complete());
    }

    #[test]
    fn score_is_independent_of_answer_order() {
        let items = quiz(&[0, 1, 2, 3, 1]);

        let mut forward = QuizAttempt::new(items.len());
        for (index, choice) in [0, 1, 0, 0, 1].iter().enumerate() {
            forward.answer(&items, index, *choice).unwrap();
        }

        let mut reversed = QuizAttempt::new(items.len());
        for (index, choice) in [0, 1, 0, 0, 1].iter().enumerate().rev() {
            reversed.answer(&items, index, *choice).unwrap();
        }

        assert_eq!(forward.score(), 3);
        assert_eq!(reversed.score(), 3);
        assert!(forward.is_complete() && reversed.is_complete());
    }

    #[test]
    fn unknown_questions_and_options_are_rejected() {
        let items = quiz(&[0]);
        let mut attempt = QuizAttempt::new(items.len());
        assert_eq!(
            attempt.answer(&items, 5, 0),
            Err(QuizAnswerError::UnknownQuestion(5))
        );
        assert_eq!(
            attempt.answer(&items, 0, 9),
            Err(QuizAnswerError::InvalidOption(9))
        );
        assert_eq!(attempt.answered(), 0);
    }
}
