use std::collections::BTreeSet;
use std::sync::Arc;

use portal_core::model::{Course, CourseId, Employee, EmployeeId};
use storage::repository::{CourseRepository, EmployeeRepository, StorageError};
use tracing::info;

use crate::error::CatalogServiceError;

/// One row of the course catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub instructor: String,
    pub duration: String,
    pub level: String,
    pub modules: usize,
    pub lessons: usize,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id(),
            title: course.title().to_owned(),
            instructor: course.instructor().to_owned(),
            duration: course.duration().to_owned(),
            level: course.level().to_owned(),
            modules: course.modules().len(),
            lessons: course.total_lessons(),
        }
    }
}

/// Headline numbers for the company dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyOverview {
    pub employees: usize,
    pub completed_courses: u64,
}

/// Read-side access to courses and employees.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
    employees: Arc<dyn EmployeeRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, employees: Arc<dyn EmployeeRepository>) -> Self {
        Self { courses, employees }
    }

    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    pub async fn list_courses(&self) -> Result<Vec<CourseSummary>, StorageError> {
        let courses = self.courses.list_courses().await?;
        Ok(courses.iter().map(CourseSummary::from).collect())
    }

    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    pub async fn course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        self.courses.get_course(id).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    pub async fn employees(&self) -> Result<Vec<Employee>, StorageError> {
        self.employees.list_employees().await
    }

    /// Employees whose name, position or department contains `term`
    /// (case-insensitive), optionally restricted to one department.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    pub async fn search_employees(
        &self,
        term: &str,
        department: Option<&str>,
    ) -> Result<Vec<Employee>, StorageError> {
        let term = term.trim().to_lowercase();
        let department = department.map(|d| d.trim().to_lowercase());
        let employees = self.employees.list_employees().await?;
        Ok(employees
            .into_iter()
            .filter(|e| {
                term.is_empty()
                    || [e.name(), e.position(), e.department()]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&term))
            })
            .filter(|e| {
                department
                    .as_deref()
                    .is_none_or(|d| e.department().to_lowercase() == d)
            })
            .collect())
    }

    /// Distinct departments, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    pub async fn departments(&self) -> Result<Vec<String>, StorageError> {
        let employees = self.employees.list_employees().await?;
        let departments: BTreeSet<String> = employees
            .iter()
            .map(|e| e.department().to_owned())
            .collect();
        Ok(departments.into_iter().collect())
    }

    /// Register a new employee with the next sequential ID and no
    /// completed courses. They sign in with the shared employee password.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Employee` for a blank field,
    /// `CatalogServiceError::EmailTaken` when the email is already
    /// registered, and `CatalogServiceError::Storage` on storage failures.
    pub async fn register_employee(
        &self,
        name: &str,
        email: &str,
        department: &str,
        position: &str,
    ) -> Result<Employee, CatalogServiceError> {
        let count = self.employees.list_employees().await?.len();
        let id = EmployeeId::new(u64::try_from(count).unwrap_or(u64::MAX).saturating_add(1));
        let employee = Employee::new(id, name, email, department, position)?;

        if self
            .employees
            .find_employee_by_email(employee.email())
            .await?
            .is_some()
        {
            return Err(CatalogServiceError::EmailTaken(employee.email().to_owned()));
        }

        self.employees.upsert_employee(&employee).await?;
        info!(employee_id = %id, "employee registered");
        Ok(employee)
    }

    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    pub async fn company_overview(&self) -> Result<CompanyOverview, StorageError> {
        let employees = self.employees.list_employees().await?;
        Ok(CompanyOverview {
            employees: employees.len(),
            completed_courses: employees
                .iter()
                .map(|e| u64::from(e.completed_courses()))
                .sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;

    #[tokio::test]
    async fn lists_the_seeded_catalog() {
        let storage = Storage::seeded_in_memory().await.unwrap();
        let service = CatalogService::new(storage.courses, storage.employees);

        let courses = service.list_courses().await.unwrap();
        assert_eq!(courses.len(), 5);
        assert_eq!(courses[0].title, "Procedimentos de Registro de Imóveis");
        assert_eq!(courses[0].lessons, 6);

        let overview = service.company_overview().await.unwrap();
        assert_eq!(overview.employees, 3);
        assert_eq!(overview.completed_courses, 6);
    }

    #[tokio::test]
    async fn search_matches_name_position_and_department() {
        let storage = Storage::seeded_in_memory().await.unwrap();
        let service = CatalogService::new(storage.courses, storage.employees);

        let names = |found: Vec<Employee>| {
            let mut names: Vec<String> = found.iter().map(|e| e.name().to_owned()).collect();
            names.sort();
            names
        };

        assert_eq!(names(service.search_employees("", None).await.unwrap()).len(), 3);
        assert_eq!(
            names(service.search_employees("ESCREVENTE", None).await.unwrap()),
            vec!["João Gabriel", "Marina Matrículas"]
        );
        assert_eq!(
            names(service.search_employees("protocolo", None).await.unwrap()),
            vec!["Carlos Protocolo"]
        );
        assert_eq!(
            names(service.search_employees("escrevente", Some("registro")).await.unwrap()),
            vec!["Marina Matrículas"]
        );
        assert!(service
            .search_employees("", Some("Financeiro"))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            service.departments().await.unwrap(),
            vec!["Atendimento", "Protocolo", "Registro"]
        );
    }

    #[tokio::test]
    async fn registering_assigns_the_next_id_and_rejects_duplicates() {
        let storage = Storage::seeded_in_memory().await.unwrap();
        let service = CatalogService::new(storage.courses, storage.employees);

        let ana = service
            .register_employee("Ana Averbação", "ana@3ri.com.br", "Registro", "Escrevente")
            .await
            .unwrap();
        assert_eq!(ana.id(), EmployeeId::new(4));
        assert_eq!(ana.completed_courses(), 0);

        let err = service
            .register_employee("Outra Ana", "ANA@3ri.com.br", "Registro", "Escrevente")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogServiceError::EmailTaken(_)));

        let err = service
            .register_employee("Sem Cargo", "sem@3ri.com.br", "Registro", " ")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogServiceError::Employee(_)));
        assert_eq!(service.employees().await.unwrap().len(), 4);
    }
}
