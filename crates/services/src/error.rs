//! Shared error types for the services crate.

use thiserror::Error;

use portal_core::model::{
    AppStateError, CourseId, EmployeeError, EmployeeId, FeedbackError, TransitionError,
};
use storage::catalog::SeedError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the course player workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("course player requires a running tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AppStateService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppStateServiceError {
    #[error(transparent)]
    State(#[from] AppStateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `FeedbackService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedbackServiceError {
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService` when registering employees.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error(transparent)]
    Employee(#[from] EmployeeError),
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PortalService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PortalError {
    #[error("not available in demo mode")]
    DemoRestricted,
    #[error("sign in as an employee first")]
    NotSignedIn,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("only the company dashboard can do this")]
    CompanyOnly,
    #[error(transparent)]
    Catalog(#[from] CatalogServiceError),
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Feedback(#[from] FeedbackServiceError),
    #[error(transparent)]
    AppState(#[from] AppStateServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<TransitionError> for PortalError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::DemoRestricted => Self::DemoRestricted,
            _ => Self::NotSignedIn,
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Portal(#[from] PortalError),
}
