use std::collections::HashMap;

use portal_core::model::{LessonId, Question, QuestionId, Quiz, QuizResult};
use tracing::debug;

/// What happened when the learner pressed "next".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAdvance {
    /// The current question has no answer yet, or the quiz is already scored.
    Ignored,
    Moved { index: usize },
    Scored(QuizResult),
}

/// One attempt at the quiz of a lesson.
#[derive(Debug, Clone)]
pub struct QuizSession {
    lesson_id: LessonId,
    quiz: Quiz,
    current: usize,
    answers: HashMap<QuestionId, usize>,
    result: Option<QuizResult>,
}

impl QuizSession {
    #[must_use]
    pub fn new(lesson_id: LessonId, quiz: Quiz) -> Self {
        Self {
            lesson_id,
            quiz,
            current: 0,
            answers: HashMap::new(),
            result: None,
        }
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions().get(self.current)
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.quiz.len()
    }

    #[must_use]
    pub fn selected(&self, question_id: QuestionId) -> Option<usize> {
        self.answers.get(&question_id).copied()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Record or overwrite the chosen option for a question.
    ///
    /// Returns `false` (and changes nothing) for unknown questions,
    /// out-of-range options, or once the attempt has been scored.
    pub fn select_answer(&mut self, question_id: QuestionId, option: usize) -> bool {
        if self.result.is_some() {
            debug!(%question_id, "quiz already scored, answer ignored");
            return false;
        }
        let Some(question) = self.quiz.question(question_id) else {
            debug!(%question_id, "unknown question, answer ignored");
            return false;
        };
        if option >= question.options().len() {
            debug!(%question_id, option, "option out of range, answer ignored");
            return false;
        }
        self.answers.insert(question_id, option);
        true
    }

    /// Whether "next" is enabled for the current question.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.result.is_none()
            && self
                .current_question()
                .is_some_and(|q| self.answers.contains_key(&q.id()))
    }

    pub fn advance(&mut self) -> QuizAdvance {
        if !self.can_advance() {
            return QuizAdvance::Ignored;
        }
        if self.is_last_question() {
            let result = self.score();
            self.result = Some(result.clone());
            QuizAdvance::Scored(result)
        } else {
            self.current += 1;
            QuizAdvance::Moved {
                index: self.current,
            }
        }
    }

    /// Step back one question; answers are kept.
    pub fn retreat(&mut self) -> bool {
        if self.result.is_some() || self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Score the answers recorded so far.
    #[must_use]
    pub fn score(&self) -> QuizResult {
        self.quiz.score(&self.answers)
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// The lesson to complete, once the attempt has been scored.
    ///
    /// Passing is not required to finish.
    #[must_use]
    pub fn finish(&self) -> Option<LessonId> {
        self.result.as_ref().map(|_| self.lesson_id)
    }
}
