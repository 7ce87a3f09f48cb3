use std::time::Duration;

use crate::model::EmployeeId;

/// Tunables of the portal shell and course player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    completion_delay: Duration,
    sign_in_delay: Duration,
    employee_password: String,
    admin_email: String,
    admin_password: String,
    manager_name: String,
    demo_feedback_employee: EmployeeId,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            completion_delay: Duration::from_millis(1000),
            sign_in_delay: Duration::from_millis(1000),
            employee_password: "senha123".into(),
            admin_email: "oficial@3ri.com.br".into(),
            admin_password: "admin123".into(),
            manager_name: "Gestor da Empresa".into(),
            demo_feedback_employee: EmployeeId::new(1),
        }
    }
}

impl PortalConfig {
    /// Zero delays, for tests and scripted runs.
    #[must_use]
    pub fn immediate() -> Self {
        Self::default()
            .with_completion_delay(Duration::ZERO)
            .with_sign_in_delay(Duration::ZERO)
    }

    #[must_use]
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    #[must_use]
    pub fn with_sign_in_delay(mut self, delay: Duration) -> Self {
        self.sign_in_delay = delay;
        self
    }

    #[must_use]
    pub fn with_employee_password(mut self, password: impl Into<String>) -> Self {
        self.employee_password = password.into();
        self
    }

    #[must_use]
    pub fn with_admin_credentials(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.admin_email = email.into();
        self.admin_password = password.into();
        self
    }

    /// Delay between the last lesson completion and the course-complete callback.
    #[must_use]
    pub fn completion_delay(&self) -> Duration {
        self.completion_delay
    }

    /// Simulated round-trip before a sign-in attempt is answered.
    #[must_use]
    pub fn sign_in_delay(&self) -> Duration {
        self.sign_in_delay
    }

    #[must_use]
    pub fn employee_password(&self) -> &str {
        &self.employee_password
    }

    #[must_use]
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    #[must_use]
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }

    /// Signature put on feedback sent from the company dashboard.
    #[must_use]
    pub fn manager_name(&self) -> &str {
        &self.manager_name
    }

    /// Whose feedback the demo dashboard shows.
    #[must_use]
    pub fn demo_feedback_employee(&self) -> EmployeeId {
        self.demo_feedback_employee
    }
}
