use thiserror::Error;

use crate::model::{CourseError, EmployeeError, FeedbackError, QuizError};

/// Any validation failure raised while building domain values.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Employee(#[from] EmployeeError),
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
}
