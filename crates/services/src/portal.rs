use std::sync::Arc;

use portal_core::PortalConfig;
use portal_core::model::{AppState, CourseId, Employee, EmployeeId, Feedback, UserRole};
use storage::repository::EmployeeRepository;
use tracing::{debug, info};

use crate::app_state_service::AppStateService;
use crate::catalog_service::CatalogService;
use crate::error::PortalError;
use crate::feedback_service::FeedbackService;
use crate::player::{CoursePlayer, CoursePlayerService, LessonCompletion, PlayerObserver};

/// The portal shell: who is signed in, which view is showing, and the
/// actions each view offers. Every transition is persisted.
pub struct PortalService {
    config: PortalConfig,
    state: AppState,
    app_state: AppStateService,
    employees: Arc<dyn EmployeeRepository>,
    catalog: CatalogService,
    players: CoursePlayerService,
    feedback: FeedbackService,
}

impl PortalService {
    /// Restore the last persisted state.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::AppState` if the state store cannot be read.
    pub async fn hydrate(
        config: PortalConfig,
        app_state: AppStateService,
        employees: Arc<dyn EmployeeRepository>,
        catalog: CatalogService,
        players: CoursePlayerService,
        feedback: FeedbackService,
    ) -> Result<Self, PortalError> {
        let state = app_state.hydrate().await?;
        debug!(view = %state.view(), "portal state restored");
        Ok(Self {
            config,
            state,
            app_state,
            employees,
            catalog,
            players,
            feedback,
        })
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    async fn persist(&self) -> Result<(), PortalError> {
        self.app_state.persist(&self.state).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `PortalError::AppState` if the new state cannot be saved.
    pub async fn go_to_auth(&mut self) -> Result<(), PortalError> {
        self.state.go_to_auth();
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns `PortalError::AppState` if the new state cannot be saved.
    pub async fn go_to_landing(&mut self) -> Result<(), PortalError> {
        self.state.go_to_landing();
        self.persist().await
    }

    /// Sign in an employee by email after the simulated network delay.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidCredentials` for an unknown email or a
    /// wrong password, and `PortalError::Storage`/`AppState` on storage
    /// failures.
    pub async fn sign_in_employee(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<Employee, PortalError> {
        tokio::time::sleep(self.config.sign_in_delay()).await;

        let employee = self
            .employees
            .find_employee_by_email(email)
            .await?
            .filter(|_| password == self.config.employee_password())
            .ok_or_else(|| {
                debug!(email, "employee sign-in rejected");
                PortalError::InvalidCredentials
            })?;

        info!(employee_id = %employee.id(), "employee signed in");
        self.state.sign_in_employee(employee.clone());
        self.persist().await?;
        Ok(employee)
    }

    /// Sign in the office administrator after the simulated network delay.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidCredentials` for anything but the
    /// configured admin credentials.
    pub async fn sign_in_company(&mut self, email: &str, password: &str) -> Result<(), PortalError> {
        tokio::time::sleep(self.config.sign_in_delay()).await;

        let email_ok = email.trim().eq_ignore_ascii_case(self.config.admin_email());
        if !email_ok || password != self.config.admin_password() {
            debug!(email, "company sign-in rejected");
            return Err(PortalError::InvalidCredentials);
        }

        info!("company signed in");
        self.state.sign_in_company();
        self.persist().await
    }

    /// Browse as the demo employee without an account.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::AppState` if the new state cannot be saved.
    pub async fn enter_demo(&mut self) -> Result<(), PortalError> {
        self.state.enter_demo();
        info!("demo mode entered");
        self.persist().await
    }

    /// # Errors
    ///
    /// Returns `PortalError::AppState` if the new state cannot be saved.
    pub async fn sign_out(&mut self) -> Result<(), PortalError> {
        self.state.sign_out();
        info!("signed out");
        self.persist().await
    }

    /// Open the course player for the signed-in employee.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::DemoRestricted` in demo mode,
    /// `PortalError::NotSignedIn` without an employee session, and
    /// `PortalError::Player` if the course cannot be loaded.
    pub async fn open_course(
        &mut self,
        course_id: CourseId,
        observer: Arc<dyn PlayerObserver>,
    ) -> Result<CoursePlayer, PortalError> {
        let mut next = self.state.clone();
        next.open_course(course_id)?;

        let learner = next.learner().map(Employee::id);
        let player = self.players.start(course_id, learner, observer).await?;

        self.state = next;
        self.persist().await?;
        Ok(player)
    }

    /// # Errors
    ///
    /// Returns `PortalError::AppState` if the new state cannot be saved.
    pub async fn close_course(&mut self) -> Result<(), PortalError> {
        self.state.close_course();
        self.persist().await
    }

    /// Complete the player's current lesson on behalf of the signed-in employee.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::DemoRestricted` in demo mode and
    /// `PortalError::Player` if the completion cannot be recorded.
    pub async fn complete_current_lesson(
        &mut self,
        player: &mut CoursePlayer,
    ) -> Result<LessonCompletion, PortalError> {
        self.ensure_not_demo()?;
        let outcome = self.players.complete_current_lesson(player).await?;
        self.after_completion(outcome).await?;
        Ok(outcome)
    }

    /// Finish the player's scored quiz on behalf of the signed-in employee.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::DemoRestricted` in demo mode and
    /// `PortalError::Player` if the completion cannot be recorded.
    pub async fn finish_quiz(
        &mut self,
        player: &mut CoursePlayer,
    ) -> Result<LessonCompletion, PortalError> {
        self.ensure_not_demo()?;
        let outcome = self.players.finish_quiz(player).await?;
        self.after_completion(outcome).await?;
        Ok(outcome)
    }

    /// Feedback the current viewer may read.
    ///
    /// Employees see their own notes, the company sees all of them, and the
    /// demo shows the notes of the configured demo subject.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::NotSignedIn` on the landing/auth views.
    pub async fn visible_feedback(&self) -> Result<Vec<Feedback>, PortalError> {
        if self.state.is_demo_mode() {
            return Ok(self
                .feedback
                .list_for_employee(self.config.demo_feedback_employee())
                .await?);
        }
        if !self.state.is_authenticated() {
            return Err(PortalError::NotSignedIn);
        }
        match (self.state.role(), self.state.user()) {
            (Some(UserRole::Company), _) => Ok(self.feedback.list_all().await?),
            (Some(UserRole::Employee), Some(user)) => {
                Ok(self.feedback.list_for_employee(user.id()).await?)
            }
            _ => Err(PortalError::NotSignedIn),
        }
    }

    /// Register a collaborator from the company dashboard.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::CompanyOnly` (or `DemoRestricted`/`NotSignedIn`)
    /// outside a company session and `PortalError::Catalog` for invalid or
    /// duplicate employee data.
    pub async fn add_employee(
        &self,
        name: &str,
        email: &str,
        department: &str,
        position: &str,
    ) -> Result<Employee, PortalError> {
        self.ensure_company()?;
        Ok(self
            .catalog
            .register_employee(name, email, department, position)
            .await?)
    }

    /// Send feedback to an employee from the company dashboard.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::CompanyOnly` (or `DemoRestricted`/`NotSignedIn`)
    /// outside a company session and `PortalError::Feedback` for unknown
    /// targets or an invalid note.
    pub async fn send_feedback(
        &self,
        employee_id: EmployeeId,
        course_id: CourseId,
        message: &str,
        rating: u8,
    ) -> Result<Feedback, PortalError> {
        self.ensure_company()?;
        Ok(self
            .feedback
            .send(employee_id, course_id, message, rating)
            .await?)
    }

    fn ensure_company(&self) -> Result<(), PortalError> {
        if self.state.is_demo_mode() {
            return Err(PortalError::DemoRestricted);
        }
        if !self.state.is_authenticated() {
            return Err(PortalError::NotSignedIn);
        }
        match self.state.role() {
            Some(UserRole::Company) => Ok(()),
            _ => Err(PortalError::CompanyOnly),
        }
    }

    fn ensure_not_demo(&self) -> Result<(), PortalError> {
        if self.state.is_demo_mode() {
            return Err(PortalError::DemoRestricted);
        }
        Ok(())
    }

    async fn after_completion(&mut self, outcome: LessonCompletion) -> Result<(), PortalError> {
        if !outcome.course_completed() {
            return Ok(());
        }
        let Some(learner) = self.state.learner().map(Employee::id) else {
            return Ok(());
        };
        if let Some(employee) = self.employees.get_employee(learner).await? {
            self.state.refresh_user(employee);
            self.persist().await?;
        }
        Ok(())
    }
}
