use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::EmployeeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EmployeeError {
    #[error("employee name cannot be empty")]
    EmptyName,

    #[error("employee email cannot be empty")]
    EmptyEmail,

    #[error("employee department cannot be empty")]
    EmptyDepartment,

    #[error("employee position cannot be empty")]
    EmptyPosition,
}

/// A learner registered by the office.
///
/// This is also the user record remembered by the app shell, so it
/// round-trips through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    id: EmployeeId,
    name: String,
    email: String,
    department: String,
    position: String,
    completed_courses: u32,
}

impl Employee {
    /// Creates an employee with no completed courses.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeError` if any field is blank.
    pub fn new(
        id: EmployeeId,
        name: impl Into<String>,
        email: impl Into<String>,
        department: impl Into<String>,
        position: impl Into<String>,
    ) -> Result<Self, EmployeeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EmployeeError::EmptyName);
        }
        let email = email.into();
        if email.trim().is_empty() {
            return Err(EmployeeError::EmptyEmail);
        }
        let department = department.into();
        if department.trim().is_empty() {
            return Err(EmployeeError::EmptyDepartment);
        }
        let position = position.into();
        if position.trim().is_empty() {
            return Err(EmployeeError::EmptyPosition);
        }
        Ok(Self {
            id,
            name: name.trim().to_owned(),
            email: email.trim().to_lowercase(),
            department: department.trim().to_owned(),
            position: position.trim().to_owned(),
            completed_courses: 0,
        })
    }

    /// Profile used while browsing in demo mode.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            id: EmployeeId::new(1),
            name: "João Silva".into(),
            email: "demo@3ri.com.br".into(),
            department: "Vendas".into(),
            position: "Vendedor".into(),
            completed_courses: 1,
        }
    }

    #[must_use]
    pub fn with_completed_courses(mut self, completed_courses: u32) -> Self {
        self.completed_courses = completed_courses;
        self
    }

    #[must_use]
    pub fn id(&self) -> EmployeeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn department(&self) -> &str {
        &self.department
    }

    #[must_use]
    pub fn position(&self) -> &str {
        &self.position
    }

    #[must_use]
    pub fn completed_courses(&self) -> u32 {
        self.completed_courses
    }

    /// Case-insensitive email comparison used by sign-in.
    #[must_use]
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}
