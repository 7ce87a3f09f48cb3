use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::ids::QuestionId;

/// Minimum percentage required to pass a quiz.
pub const PASS_THRESHOLD_PERCENT: u8 = 70;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question {question} needs at least two options")]
    TooFewOptions { question: QuestionId },

    #[error("question {question} has correct answer {index} but only {options} options")]
    CorrectAnswerOutOfRange {
        question: QuestionId,
        index: usize,
        options: usize,
    },

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("duplicate question id {0}")]
    DuplicateQuestion(QuestionId),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Single-choice question worth a fixed number of points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    points: u32,
    explanation: Option<String>,
}

impl Question {
    /// Creates a question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the prompt is blank, fewer than two options are
    /// given, or `correct_answer` does not index into `options`.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        points: u32,
    ) -> Result<Self, QuizError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuizError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions { question: id });
        }
        if correct_answer >= options.len() {
            return Err(QuizError::CorrectAnswerOutOfRange {
                question: id,
                index: correct_answer,
                options: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt: prompt.trim().to_owned(),
            options,
            correct_answer,
            points,
            explanation: None,
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        self.explanation = Some(explanation.trim().to_owned()).filter(|e| !e.is_empty());
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Ordered set of questions attached to a quiz lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Vec<Question>,
}

impl Quiz {
    /// Creates a quiz from its questions, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty list and
    /// `QuizError::DuplicateQuestion` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion(question.id()));
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Sum of all question points.
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.questions
            .iter()
            .fold(0_u32, |acc, q| acc.saturating_add(q.points()))
    }

    /// Scores a set of answers keyed by question id.
    ///
    /// Questions without an answer score zero and are reported as not answered.
    #[must_use]
    pub fn score(&self, answers: &HashMap<QuestionId, usize>) -> QuizResult {
        let outcomes: Vec<QuestionOutcome> = self
            .questions
            .iter()
            .map(|q| {
                let selected = answers.get(&q.id()).copied();
                let awarded = if selected == Some(q.correct_answer()) {
                    q.points()
                } else {
                    0
                };
                QuestionOutcome {
                    question_id: q.id(),
                    selected,
                    correct_answer: q.correct_answer(),
                    points: q.points(),
                    awarded,
                }
            })
            .collect();

        let score = outcomes
            .iter()
            .fold(0_u32, |acc, o| acc.saturating_add(o.awarded));
        let total_points = self.total_points();
        let percentage = percentage(score, total_points);

        QuizResult {
            score,
            total_points,
            percentage,
            passed: percentage >= PASS_THRESHOLD_PERCENT,
            outcomes,
        }
    }
}

/// Rounded percentage of `score` over `total`, halves rounding up.
///
/// A zero total yields 0 rather than dividing by zero.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    let rounded = (score * 200 + total) / (total * 2);
    u8::try_from(rounded).unwrap_or(100)
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    NotAnswered,
}

/// Per-question line of a scored attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub selected: Option<usize>,
    pub correct_answer: usize,
    pub points: u32,
    pub awarded: u32,
}

impl QuestionOutcome {
    #[must_use]
    pub fn status(&self) -> AnswerStatus {
        match self.selected {
            None => AnswerStatus::NotAnswered,
            Some(choice) if choice == self.correct_answer => AnswerStatus::Correct,
            Some(_) => AnswerStatus::Incorrect,
        }
    }
}

/// Scored quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub score: u32,
    pub total_points: u32,
    pub percentage: u8,
    pub passed: bool,
    pub outcomes: Vec<QuestionOutcome>,
}

impl QuizResult {
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status() == AnswerStatus::Correct)
            .count()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into(), "d".into()]
    }

    fn five_question_quiz() -> Quiz {
        let points = [10, 10, 15, 15, 20];
        let questions = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Question::new(QuestionId::new(i as u64 + 1), format!("Q{i}"), options(), 1, *p)
                    .unwrap()
            })
            .collect();
        Quiz::new(questions).unwrap()
    }

    #[test]
    fn question_rejects_out_of_range_answer() {
        let err = Question::new(QuestionId::new(1), "Q", options(), 4, 10).unwrap_err();
        assert_eq!(
            err,
            QuizError::CorrectAnswerOutOfRange {
                question: QuestionId::new(1),
                index: 4,
                options: 4
            }
        );
    }

    #[test]
    fn question_rejects_blank_prompt_and_single_option() {
        assert_eq!(
            Question::new(QuestionId::new(1), "  ", options(), 0, 1).unwrap_err(),
            QuizError::EmptyPrompt
        );
        assert_eq!(
            Question::new(QuestionId::new(2), "Q", vec!["only".into()], 0, 1).unwrap_err(),
            QuizError::TooFewOptions {
                question: QuestionId::new(2)
            }
        );
    }

    #[test]
    fn quiz_rejects_duplicates_and_empty() {
        assert_eq!(Quiz::new(Vec::new()).unwrap_err(), QuizError::NoQuestions);
        let q = Question::new(QuestionId::new(1), "Q", options(), 0, 1).unwrap();
        assert_eq!(
            Quiz::new(vec![q.clone(), q]).unwrap_err(),
            QuizError::DuplicateQuestion(QuestionId::new(1))
        );
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let quiz = five_question_quiz();
        let answers = quiz.questions().iter().map(|q| (q.id(), 1)).collect();
        let result = quiz.score(&answers);
        assert_eq!(result.score, 70);
        assert_eq!(result.total_points, 70);
        assert_eq!(result.percentage, 100);
        assert!(result.passed);
    }

    #[test]
    fn all_wrong_scores_zero_and_fails() {
        let quiz = five_question_quiz();
        let answers = quiz.questions().iter().map(|q| (q.id(), 0)).collect();
        let result = quiz.score(&answers);
        assert_eq!(result.score, 0);
        assert_eq!(result.percentage, 0);
        assert!(!result.passed);
    }

    #[test]
    fn thirty_five_of_seventy_is_fifty_percent() {
        let quiz = five_question_quiz();
        // Correct: 10 + 10 + 15 = 35.
        let answers: HashMap<_, _> = [(1, 1), (2, 1), (3, 1), (4, 0), (5, 3)]
            .into_iter()
            .map(|(q, a)| (QuestionId::new(q), a))
            .collect();
        let result = quiz.score(&answers);
        assert_eq!(result.score, 35);
        assert_eq!(result.percentage, 50);
        assert!(!result.passed);
        assert_eq!(result.correct_count(), 3);
    }

    #[test]
    fn unanswered_questions_are_reported() {
        let quiz = five_question_quiz();
        let answers: HashMap<_, _> = [(QuestionId::new(1), 1)].into_iter().collect();
        let result = quiz.score(&answers);
        assert_eq!(result.outcomes[0].status(), AnswerStatus::Correct);
        assert_eq!(result.outcomes[1].status(), AnswerStatus::NotAnswered);
        assert_eq!(result.outcomes[1].awarded, 0);
        assert_eq!(result.score, 10);
    }

    #[test]
    fn zero_point_quiz_is_zero_percent() {
        let q = Question::new(QuestionId::new(1), "Q", options(), 0, 0).unwrap();
        let quiz = Quiz::new(vec![q]).unwrap();
        let answers: HashMap<_, _> = [(QuestionId::new(1), 0)].into_iter().collect();
        let result = quiz.score(&answers);
        assert_eq!(result.total_points, 0);
        assert_eq!(result.percentage, 0);
        assert!(!result.passed);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(7, 10), 70);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn seventy_percent_passes() {
        let q1 = Question::new(QuestionId::new(1), "Q1", options(), 0, 70).unwrap();
        let q2 = Question::new(QuestionId::new(2), "Q2", options(), 0, 30).unwrap();
        let quiz = Quiz::new(vec![q1, q2]).unwrap();
        let answers: HashMap<_, _> = [(QuestionId::new(1), 0)].into_iter().collect();
        let result = quiz.score(&answers);
        assert_eq!(result.percentage, 70);
        assert!(result.passed);
    }
}
