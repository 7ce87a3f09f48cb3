use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_core::model::{Course, CourseId, Employee, EmployeeId, Feedback, FeedbackId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A course finished by an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub employee_id: EmployeeId,
    pub course_id: CourseId,
    pub completed_at: DateTime<Utc>,
}

/// Source of the course catalog.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or replace a course and its whole module tree.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID, `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// List all courses ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;
}

/// Registered employees and their course completions.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Persist or update an employee.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the employee cannot be stored.
    async fn upsert_employee(&self, employee: &Employee) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StorageError>;

    /// Case-insensitive lookup used by sign-in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn find_employee_by_email(&self, email: &str)
    -> Result<Option<Employee>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_employees(&self) -> Result<Vec<Employee>, StorageError>;

    /// Record that an employee finished a course.
    ///
    /// Returns `true` when the completion is new; repeated calls for the same
    /// pair leave the employee's completed course count unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the employee does not exist.
    async fn record_completion(
        &self,
        employee_id: EmployeeId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Completions for an employee, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_completions(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<CompletionRecord>, StorageError>;
}

/// Manager feedback notes.
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Store a new feedback note.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the ID is already taken.
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError>;

    /// All feedback ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_feedback(&self) -> Result<Vec<Feedback>, StorageError>;

    /// Feedback addressed to one employee, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_feedback_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<Feedback>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no feedback has this ID.
    async fn mark_feedback_read(&self, id: FeedbackId) -> Result<(), StorageError>;
}

/// Flat key/value store for the app shell's remembered state.
#[async_trait]
pub trait AppStateRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn load_entries(&self) -> Result<BTreeMap<String, String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn put_entry(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn remove_entry(&self, key: &str) -> Result<(), StorageError>;

    /// Apply a batch of writes atomically: `Some` values are stored, `None`
    /// removes the key. Either every change lands or none does.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn apply_entries(&self, entries: &[(&str, Option<String>)]) -> Result<(), StorageError>;
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<BTreeMap<CourseId, Course>>>,
    employees: Arc<Mutex<BTreeMap<EmployeeId, Employee>>>,
    completions: Arc<Mutex<Vec<CompletionRecord>>>,
    feedback: Arc<Mutex<BTreeMap<FeedbackId, Feedback>>>,
    app_state: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryRepository {
    async fn upsert_employee(&self, employee: &Employee) -> Result<(), StorageError> {
        let mut guard = self.employees.lock().map_err(poisoned)?;
        guard.insert(employee.id(), employee.clone());
        Ok(())
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StorageError> {
        let guard = self.employees.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Employee>, StorageError> {
        let guard = self.employees.lock().map_err(poisoned)?;
        Ok(guard.values().find(|e| e.matches_email(email)).cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StorageError> {
        let guard = self.employees.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn record_completion(
        &self,
        employee_id: EmployeeId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut employees = self.employees.lock().map_err(poisoned)?;
        let employee = employees
            .get_mut(&employee_id)
            .ok_or(StorageError::NotFound)?;

        let mut completions = self.completions.lock().map_err(poisoned)?;
        if completions
            .iter()
            .any(|c| c.employee_id == employee_id && c.course_id == course_id)
        {
            return Ok(false);
        }
        completions.push(CompletionRecord {
            employee_id,
            course_id,
            completed_at,
        });

        let count = employee.completed_courses().saturating_add(1);
        *employee = employee.clone().with_completed_courses(count);
        Ok(true)
    }

    async fn list_completions(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let guard = self.completions.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|c| c.employee_id == employee_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryRepository {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError> {
        let mut guard = self.feedback.lock().map_err(poisoned)?;
        if guard.contains_key(&feedback.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(feedback.id(), feedback.clone());
        Ok(())
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StorageError> {
        let guard = self.feedback.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn list_feedback_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<Feedback>, StorageError> {
        let guard = self.feedback.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|f| f.employee_id() == employee_id)
            .cloned()
            .collect())
    }

    async fn mark_feedback_read(&self, id: FeedbackId) -> Result<(), StorageError> {
        let mut guard = self.feedback.lock().map_err(poisoned)?;
        guard.get_mut(&id).ok_or(StorageError::NotFound)?.mark_read();
        Ok(())
    }
}

#[async_trait]
impl AppStateRepository for InMemoryRepository {
    async fn load_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let guard = self.app_state.lock().map_err(poisoned)?;
        Ok(guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn put_entry(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.app_state.lock().map_err(poisoned)?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove_entry(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.app_state.lock().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }

    async fn apply_entries(&self, entries: &[(&str, Option<String>)]) -> Result<(), StorageError> {
        let mut guard = self.app_state.lock().map_err(poisoned)?;
        for (key, value) in entries {
            match value {
                Some(value) => guard.insert((*key).to_owned(), value.clone()),
                None => guard.remove(*key),
            };
        }
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub app_state: Arc<dyn AppStateRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Wrap one repository that implements every contract.
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: CourseRepository
            + EmployeeRepository
            + FeedbackRepository
            + AppStateRepository
            + Clone
            + 'static,
    {
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let employees: Arc<dyn EmployeeRepository> = Arc::new(repo.clone());
        let feedback: Arc<dyn FeedbackRepository> = Arc::new(repo.clone());
        let app_state: Arc<dyn AppStateRepository> = Arc::new(repo);
        Self {
            courses,
            employees,
            feedback,
            app_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{CourseDraft, FeedbackDraft};
    use portal_core::time::fixed_now;

    fn employee(id: u64, email: &str) -> Employee {
        Employee::new(EmployeeId::new(id), format!("Pessoa {id}"), email, "Registro", "Escrevente")
            .unwrap()
    }

    #[tokio::test]
    async fn completion_is_recorded_once() {
        let repo = InMemoryRepository::new();
        repo.upsert_employee(&employee(1, "a@3ri.com.br")).await.unwrap();

        let first = repo
            .record_completion(EmployeeId::new(1), CourseId::new(4), fixed_now())
            .await
            .unwrap();
        let second = repo
            .record_completion(EmployeeId::new(1), CourseId::new(4), fixed_now())
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let stored = repo.get_employee(EmployeeId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.completed_courses(), 1);
        assert_eq!(repo.list_completions(EmployeeId::new(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completion_for_unknown_employee_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo
            .record_completion(EmployeeId::new(9), CourseId::new(1), fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn email_lookup_ignores_case() {
        let repo = InMemoryRepository::new();
        repo.upsert_employee(&employee(1, "gabriel@3ri.com.br")).await.unwrap();
        let found = repo.find_employee_by_email("Gabriel@3RI.com.br").await.unwrap();
        assert_eq!(found.map(|e| e.id()), Some(EmployeeId::new(1)));
    }

    #[tokio::test]
    async fn feedback_ids_must_be_unique() {
        let repo = InMemoryRepository::new();
        let feedback = FeedbackDraft {
            employee_id: EmployeeId::new(1),
            employee_name: "Ana".into(),
            course_id: CourseId::new(1),
            course_name: "Curso".into(),
            message: "Bom trabalho".into(),
            rating: 4,
        }
        .validate(FeedbackId::new(1), "Gestor", fixed_now().date_naive())
        .unwrap();

        repo.insert_feedback(&feedback).await.unwrap();
        let err = repo.insert_feedback(&feedback).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        repo.mark_feedback_read(FeedbackId::new(1)).await.unwrap();
        let listed = repo.list_feedback_for_employee(EmployeeId::new(1)).await.unwrap();
        assert!(listed[0].is_read());
    }

    #[tokio::test]
    async fn courses_list_in_id_order() {
        let repo = InMemoryRepository::new();
        for id in [3, 1, 2] {
            let course = CourseDraft {
                id,
                title: format!("Curso {id}"),
                ..CourseDraft::default()
            }
            .validate()
            .unwrap();
            repo.upsert_course(&course).await.unwrap();
        }
        let ids: Vec<u64> = repo
            .list_courses()
            .await
            .unwrap()
            .iter()
            .map(|c| c.id().value())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn app_state_entries_round_trip() {
        let storage = Storage::in_memory();
        storage.app_state.put_entry("portal.view", "auth").await.unwrap();
        storage.app_state.remove_entry("missing").await.unwrap();
        let entries = storage.app_state.load_entries().await.unwrap();
        assert_eq!(entries.get("portal.view").map(String::as_str), Some("auth"));

        storage
            .app_state
            .apply_entries(&[
                ("portal.view", None),
                ("portal.demoMode", Some("true".to_owned())),
            ])
            .await
            .unwrap();
        let entries = storage.app_state.load_entries().await.unwrap();
        assert!(!entries.contains_key("portal.view"));
        assert_eq!(entries.get("portal.demoMode").map(String::as_str), Some("true"));
    }
}
