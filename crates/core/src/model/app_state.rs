use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::employee::Employee;
use crate::model::ids::CourseId;

/// Fixed keys under which the app state is stored.
pub mod keys {
    pub const VIEW: &str = "portal.view";
    pub const USER_TYPE: &str = "portal.userType";
    pub const AUTHENTICATED: &str = "portal.authenticated";
    pub const DEMO_MODE: &str = "portal.demoMode";
    pub const COURSE_ID: &str = "portal.courseId";
    pub const USER: &str = "portal.user";

    pub const ALL: [&str; 6] = [VIEW, USER_TYPE, AUTHENTICATED, DEMO_MODE, COURSE_ID, USER];
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Problems found while reading or writing stored app state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AppStateError {
    #[error("unknown view: {0}")]
    InvalidView(String),

    #[error("unknown user type: {0}")]
    InvalidUserType(String),

    #[error("invalid boolean for {key}: {value}")]
    InvalidFlag { key: &'static str, value: String },

    #[error("invalid course id: {0}")]
    InvalidCourseId(String),

    #[error("invalid user record: {0}")]
    InvalidUser(String),

    #[error("inconsistent state: {0}")]
    Inconsistent(&'static str),
}

/// Reasons a view transition is refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("this action is not available in demo mode")]
    DemoRestricted,

    #[error("an employee must be signed in")]
    NotSignedIn,
}

//
// ─── VIEW / ROLE ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Landing,
    Auth,
    EmployeeDashboard,
    CompanyDashboard,
    Demo,
    CoursePlayer,
}

impl View {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            View::Landing => "landing",
            View::Auth => "auth",
            View::EmployeeDashboard => "employee",
            View::CompanyDashboard => "company",
            View::Demo => "demo",
            View::CoursePlayer => "course",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = AppStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "landing" => Ok(View::Landing),
            "auth" => Ok(View::Auth),
            "employee" => Ok(View::EmployeeDashboard),
            "company" => Ok(View::CompanyDashboard),
            "demo" => Ok(View::Demo),
            "course" => Ok(View::CoursePlayer),
            other => Err(AppStateError::InvalidView(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Employee,
    Company,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Employee => "employee",
            UserRole::Company => "company",
        }
    }
}

impl FromStr for UserRole {
    type Err = AppStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(UserRole::Employee),
            "company" => Ok(UserRole::Company),
            other => Err(AppStateError::InvalidUserType(other.to_owned())),
        }
    }
}

//
// ─── APP STATE ─────────────────────────────────────────────────────────────────
//

/// Top-level routing and session state of the portal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    view: View,
    role: Option<UserRole>,
    authenticated: bool,
    demo_mode: bool,
    course_id: Option<CourseId>,
    user: Option<Employee>,
}

impl AppState {
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn is_demo_mode(&self) -> bool {
        self.demo_mode
    }

    #[must_use]
    pub fn course_id(&self) -> Option<CourseId> {
        self.course_id
    }

    #[must_use]
    pub fn user(&self) -> Option<&Employee> {
        self.user.as_ref()
    }

    /// The employee whose progress may be recorded: signed in and not in demo mode.
    #[must_use]
    pub fn learner(&self) -> Option<&Employee> {
        if self.authenticated && !self.demo_mode && self.role == Some(UserRole::Employee) {
            self.user.as_ref()
        } else {
            None
        }
    }

    pub fn go_to_auth(&mut self) {
        self.view = View::Auth;
    }

    pub fn go_to_landing(&mut self) {
        if !self.authenticated && !self.demo_mode {
            self.view = View::Landing;
        }
    }

    pub fn sign_in_employee(&mut self, employee: Employee) {
        *self = Self {
            view: View::EmployeeDashboard,
            role: Some(UserRole::Employee),
            authenticated: true,
            demo_mode: false,
            course_id: None,
            user: Some(employee),
        };
    }

    pub fn sign_in_company(&mut self) {
        *self = Self {
            view: View::CompanyDashboard,
            role: Some(UserRole::Company),
            authenticated: true,
            demo_mode: false,
            course_id: None,
            user: None,
        };
    }

    pub fn enter_demo(&mut self) {
        *self = Self {
            view: View::Demo,
            role: Some(UserRole::Employee),
            authenticated: false,
            demo_mode: true,
            course_id: None,
            user: Some(Employee::demo()),
        };
    }

    pub fn sign_out(&mut self) {
        *self = Self::default();
    }

    /// Replace the remembered user record (e.g. after a course completion).
    pub fn refresh_user(&mut self, employee: Employee) {
        if self.user.as_ref().is_some_and(|u| u.id() == employee.id()) {
            self.user = Some(employee);
        }
    }

    /// Enter the course player.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::DemoRestricted` in demo mode and
    /// `TransitionError::NotSignedIn` when no employee is signed in.
    pub fn open_course(&mut self, course_id: CourseId) -> Result<(), TransitionError> {
        if self.demo_mode {
            return Err(TransitionError::DemoRestricted);
        }
        if self.learner().is_none() {
            return Err(TransitionError::NotSignedIn);
        }
        self.course_id = Some(course_id);
        self.view = View::CoursePlayer;
        Ok(())
    }

    pub fn close_course(&mut self) {
        if self.view == View::CoursePlayer {
            self.view = View::EmployeeDashboard;
            self.course_id = None;
        }
    }

    /// Serialize into `(key, value)` pairs; `None` means the key is removed.
    ///
    /// # Errors
    ///
    /// Returns `AppStateError::InvalidUser` if the user record cannot be encoded.
    pub fn to_entries(&self) -> Result<Vec<(&'static str, Option<String>)>, AppStateError> {
        let user = self
            .user
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppStateError::InvalidUser(e.to_string()))?;

        Ok(vec![
            (keys::VIEW, Some(self.view.as_str().to_owned())),
            (keys::USER_TYPE, self.role.map(|r| r.as_str().to_owned())),
            (keys::AUTHENTICATED, Some(self.authenticated.to_string())),
            (keys::DEMO_MODE, Some(self.demo_mode.to_string())),
            (keys::COURSE_ID, self.course_id.map(|id| id.to_string())),
            (keys::USER, user),
        ])
    }

    /// Rebuild state from stored entries.
    ///
    /// Never fails: unreadable entries fall back to their defaults and are
    /// returned alongside the state so the caller can report them.
    #[must_use]
    pub fn from_entries(entries: &BTreeMap<String, String>) -> (Self, Vec<AppStateError>) {
        let mut issues = Vec::new();
        let mut state = Self::default();

        if let Some(raw) = entries.get(keys::VIEW) {
            match raw.parse() {
                Ok(view) => state.view = view,
                Err(e) => issues.push(e),
            }
        }
        if let Some(raw) = entries.get(keys::USER_TYPE) {
            match raw.parse() {
                Ok(role) => state.role = Some(role),
                Err(e) => issues.push(e),
            }
        }
        state.authenticated = read_flag(entries, keys::AUTHENTICATED, &mut issues);
        state.demo_mode = read_flag(entries, keys::DEMO_MODE, &mut issues);
        if let Some(raw) = entries.get(keys::COURSE_ID) {
            match raw.parse() {
                Ok(id) => state.course_id = Some(id),
                Err(_) => issues.push(AppStateError::InvalidCourseId(raw.clone())),
            }
        }
        if let Some(raw) = entries.get(keys::USER) {
            match serde_json::from_str::<Employee>(raw) {
                Ok(user) => state.user = Some(user),
                Err(e) => issues.push(AppStateError::InvalidUser(e.to_string())),
            }
        }

        if let Some(problem) = state.inconsistency() {
            issues.push(AppStateError::Inconsistent(problem));
            state = Self::default();
        }

        (state, issues)
    }

    fn inconsistency(&self) -> Option<&'static str> {
        if self.authenticated && self.demo_mode {
            return Some("authenticated and demo mode at once");
        }
        match self.view {
            View::EmployeeDashboard | View::CoursePlayer if self.learner().is_none() => {
                Some("employee view without a signed-in employee")
            }
            View::CoursePlayer if self.course_id.is_none() => Some("course view without a course"),
            View::CompanyDashboard
                if !(self.authenticated && self.role == Some(UserRole::Company)) =>
            {
                Some("company view without a signed-in manager")
            }
            View::Demo if !self.demo_mode || self.user.is_none() => {
                Some("demo view outside demo mode")
            }
            _ => None,
        }
    }
}

fn read_flag(
    entries: &BTreeMap<String, String>,
    key: &'static str,
    issues: &mut Vec<AppStateError>,
) -> bool {
    match entries.get(key).map(String::as_str) {
        None | Some("false") => false,
        Some("true") => true,
        Some(other) => {
            issues.push(AppStateError::InvalidFlag {
                key,
                value: other.to_owned(),
            });
            false
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::EmployeeId;

    fn employee() -> Employee {
        Employee::new(
            EmployeeId::new(2),
            "Marina Matrículas",
            "marina.matriculas@3ri.com.br",
            "Registro",
            "Escrevente Substituta",
        )
        .unwrap()
    }

    fn to_map(state: &AppState) -> BTreeMap<String, String> {
        state
            .to_entries()
            .unwrap()
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_owned(), v)))
            .collect()
    }

    #[test]
    fn default_is_landing() {
        let state = AppState::default();
        assert_eq!(state.view(), View::Landing);
        assert!(!state.is_authenticated());
        assert!(state.user().is_none());
    }

    #[test]
    fn signed_in_state_survives_a_reload() {
        let mut state = AppState::default();
        state.sign_in_employee(employee());
        state.open_course(CourseId::new(1)).unwrap();

        let (restored, issues) = AppState::from_entries(&to_map(&state));
        assert!(issues.is_empty());
        assert_eq!(restored, state);
        assert_eq!(restored.view(), View::CoursePlayer);
    }

    #[test]
    fn demo_mode_cannot_open_courses() {
        let mut state = AppState::default();
        state.enter_demo();
        assert_eq!(
            state.open_course(CourseId::new(1)),
            Err(TransitionError::DemoRestricted)
        );
        assert_eq!(state.view(), View::Demo);
        assert!(state.learner().is_none());
    }

    #[test]
    fn company_cannot_open_courses() {
        let mut state = AppState::default();
        state.sign_in_company();
        assert_eq!(
            state.open_course(CourseId::new(1)),
            Err(TransitionError::NotSignedIn)
        );
    }

    #[test]
    fn sign_out_clears_everything() {
        let mut state = AppState::default();
        state.sign_in_employee(employee());
        state.sign_out();
        assert_eq!(state, AppState::default());
        let entries = state.to_entries().unwrap();
        let user = entries.iter().find(|(k, _)| *k == keys::USER).unwrap();
        assert!(user.1.is_none());
    }

    #[test]
    fn corrupt_entries_fall_back_to_defaults() {
        let mut entries = BTreeMap::new();
        entries.insert(keys::VIEW.to_owned(), "nowhere".to_owned());
        entries.insert(keys::DEMO_MODE.to_owned(), "maybe".to_owned());
        entries.insert(keys::USER.to_owned(), "{not json".to_owned());

        let (state, issues) = AppState::from_entries(&entries);
        assert_eq!(state, AppState::default());
        assert_eq!(issues.len(), 3);
        assert!(matches!(issues[0], AppStateError::InvalidView(_)));
    }

    #[test]
    fn inconsistent_entries_reset_to_landing() {
        let mut entries = BTreeMap::new();
        entries.insert(keys::VIEW.to_owned(), "employee".to_owned());
        entries.insert(keys::AUTHENTICATED.to_owned(), "true".to_owned());

        let (state, issues) = AppState::from_entries(&entries);
        assert_eq!(state.view(), View::Landing);
        assert!(matches!(issues[0], AppStateError::Inconsistent(_)));
    }

    #[test]
    fn close_course_returns_to_dashboard() {
        let mut state = AppState::default();
        state.sign_in_employee(employee());
        state.open_course(CourseId::new(3)).unwrap();
        state.close_course();
        assert_eq!(state.view(), View::EmployeeDashboard);
        assert_eq!(state.course_id(), None);
    }
}
