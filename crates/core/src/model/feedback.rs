use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ids::{CourseId, EmployeeId, FeedbackId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FeedbackError {
    #[error("feedback message cannot be empty")]
    EmptyMessage,

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// Manager feedback as composed on the company dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub course_id: CourseId,
    pub course_name: String,
    pub message: String,
    pub rating: u8,
}

impl FeedbackDraft {
    /// Validate the draft and stamp it as a new, unread feedback note.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError` for a blank message or a rating outside 1..=5.
    pub fn validate(
        self,
        id: FeedbackId,
        manager_name: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Feedback, FeedbackError> {
        Feedback::from_persisted(
            id,
            self.employee_id,
            self.employee_name,
            self.course_id,
            self.course_name,
            manager_name.into(),
            self.message,
            self.rating,
            date,
            false,
        )
    }
}

/// Feedback note addressed to an employee about one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    id: FeedbackId,
    employee_id: EmployeeId,
    employee_name: String,
    course_id: CourseId,
    course_name: String,
    manager_name: String,
    message: String,
    rating: u8,
    date: NaiveDate,
    read: bool,
}

impl Feedback {
    /// Rehydrate a feedback note.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError` for a blank message or a rating outside 1..=5.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: FeedbackId,
        employee_id: EmployeeId,
        employee_name: String,
        course_id: CourseId,
        course_name: String,
        manager_name: String,
        message: String,
        rating: u8,
        date: NaiveDate,
        read: bool,
    ) -> Result<Self, FeedbackError> {
        if message.trim().is_empty() {
            return Err(FeedbackError::EmptyMessage);
        }
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidRating(rating));
        }
        Ok(Self {
            id,
            employee_id,
            employee_name: employee_name.trim().to_owned(),
            course_id,
            course_name: course_name.trim().to_owned(),
            manager_name: manager_name.trim().to_owned(),
            message: message.trim().to_owned(),
            rating,
            date,
            read,
        })
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }

    #[must_use]
    pub fn id(&self) -> FeedbackId {
        self.id
    }

    #[must_use]
    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    #[must_use]
    pub fn employee_name(&self) -> &str {
        &self.employee_name
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    #[must_use]
    pub fn manager_name(&self) -> &str {
        &self.manager_name
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn rating(&self) -> u8 {
        self.rating
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn is_read(&self) -> bool {
        self.read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(rating: u8, message: &str) -> FeedbackDraft {
        FeedbackDraft {
            employee_id: EmployeeId::new(1),
            employee_name: "João Silva".into(),
            course_id: CourseId::new(1),
            course_name: "Procedimentos de Registro de Imóveis".into(),
            message: message.into(),
            rating,
        }
    }

    #[test]
    fn validate_stamps_unread_feedback() {
        let today = fixed_now().date_naive();
        let feedback = draft(5, " Muito bom ")
            .validate(FeedbackId::new(4), "Gestor da Empresa", today)
            .unwrap();
        assert_eq!(feedback.message(), "Muito bom");
        assert_eq!(feedback.manager_name(), "Gestor da Empresa");
        assert_eq!(feedback.date(), today);
        assert!(!feedback.is_read());
    }

    #[test]
    fn validate_rejects_bad_rating_and_blank_message() {
        let today = fixed_now().date_naive();
        assert_eq!(
            draft(0, "ok").validate(FeedbackId::new(1), "G", today).unwrap_err(),
            FeedbackError::InvalidRating(0)
        );
        assert_eq!(
            draft(6, "ok").validate(FeedbackId::new(1), "G", today).unwrap_err(),
            FeedbackError::InvalidRating(6)
        );
        assert_eq!(
            draft(3, "  ").validate(FeedbackId::new(1), "G", today).unwrap_err(),
            FeedbackError::EmptyMessage
        );
    }

    #[test]
    fn mark_read_is_sticky() {
        let mut feedback = draft(4, "ok")
            .validate(FeedbackId::new(1), "G", fixed_now().date_naive())
            .unwrap();
        feedback.mark_read();
        feedback.mark_read();
        assert!(feedback.is_read());
    }
}
