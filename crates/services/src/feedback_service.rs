use std::sync::Arc;

use portal_core::model::{CourseId, EmployeeId, Feedback, FeedbackDraft, FeedbackId};
use storage::repository::{CourseRepository, EmployeeRepository, FeedbackRepository};
use tracing::info;

use crate::Clock;
use crate::error::FeedbackServiceError;

/// Manager feedback: composing, listing and read tracking.
#[derive(Clone)]
pub struct FeedbackService {
    clock: Clock,
    manager_name: String,
    feedback: Arc<dyn FeedbackRepository>,
    employees: Arc<dyn EmployeeRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl FeedbackService {
    #[must_use]
    pub fn new(
        clock: Clock,
        manager_name: impl Into<String>,
        feedback: Arc<dyn FeedbackRepository>,
        employees: Arc<dyn EmployeeRepository>,
        courses: Arc<dyn CourseRepository>,
    ) -> Self {
        Self {
            clock,
            manager_name: manager_name.into(),
            feedback,
            employees,
            courses,
        }
    }

    /// Send feedback to an employee about a course.
    ///
    /// The note gets the next sequential ID, today's date and starts unread.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackServiceError::EmployeeNotFound`/`CourseNotFound` for
    /// unknown targets, `FeedbackServiceError::Feedback` for an invalid
    /// message or rating, and `FeedbackServiceError::Storage` on storage
    /// failures.
    pub async fn send(
        &self,
        employee_id: EmployeeId,
        course_id: CourseId,
        message: &str,
        rating: u8,
    ) -> Result<Feedback, FeedbackServiceError> {
        let employee = self
            .employees
            .get_employee(employee_id)
            .await?
            .ok_or(FeedbackServiceError::EmployeeNotFound(employee_id))?;
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(FeedbackServiceError::CourseNotFound(course_id))?;

        let count = self.feedback.list_feedback().await?.len();
        let id = FeedbackId::new(u64::try_from(count).unwrap_or(u64::MAX).saturating_add(1));

        let feedback = FeedbackDraft {
            employee_id,
            employee_name: employee.name().to_owned(),
            course_id,
            course_name: course.title().to_owned(),
            message: message.to_owned(),
            rating,
        }
        .validate(id, self.manager_name.as_str(), self.clock.today())?;

        self.feedback.insert_feedback(&feedback).await?;
        info!(feedback_id = %id, %employee_id, %course_id, rating, "feedback sent");
        Ok(feedback)
    }

    /// # Errors
    ///
    /// Returns `FeedbackServiceError::Storage` (`NotFound` for unknown IDs).
    pub async fn mark_read(&self, id: FeedbackId) -> Result<(), FeedbackServiceError> {
        self.feedback.mark_feedback_read(id).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FeedbackServiceError::Storage` on storage failures.
    pub async fn list_all(&self) -> Result<Vec<Feedback>, FeedbackServiceError> {
        Ok(self.feedback.list_feedback().await?)
    }

    /// # Errors
    ///
    /// Returns `FeedbackServiceError::Storage` on storage failures.
    pub async fn list_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<Feedback>, FeedbackServiceError> {
        Ok(self.feedback.list_feedback_for_employee(employee_id).await?)
    }

    /// # Errors
    ///
    /// Returns `FeedbackServiceError::Storage` on storage failures.
    pub async fn unread_count(&self, employee_id: EmployeeId) -> Result<usize, FeedbackServiceError> {
        Ok(self
            .list_for_employee(employee_id)
            .await?
            .iter()
            .filter(|f| !f.is_read())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::FeedbackError;
    use portal_core::time::{fixed_clock, fixed_now};
    use storage::repository::{Storage, StorageError};

    async fn service() -> FeedbackService {
        let storage = Storage::seeded_in_memory().await.unwrap();
        FeedbackService::new(
            fixed_clock(),
            "Gestor da Empresa",
            storage.feedback,
            storage.employees,
            storage.courses,
        )
    }

    #[tokio::test]
    async fn send_stamps_next_id_manager_and_today() {
        let service = service().await;
        let sent = service
            .send(EmployeeId::new(3), CourseId::new(5), "Bom controle de prazos.", 4)
            .await
            .unwrap();

        assert_eq!(sent.id(), FeedbackId::new(4));
        assert_eq!(sent.employee_name(), "Carlos Protocolo");
        assert_eq!(sent.course_name(), "Gestão de Protocolo e Prazos Legais");
        assert_eq!(sent.manager_name(), "Gestor da Empresa");
        assert_eq!(sent.date(), fixed_now().date_naive());
        assert!(!sent.is_read());
        assert_eq!(service.unread_count(EmployeeId::new(3)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn send_rejects_unknown_targets_and_bad_ratings() {
        let service = service().await;
        let err = service
            .send(EmployeeId::new(9), CourseId::new(1), "ok", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackServiceError::EmployeeNotFound(_)));

        let err = service
            .send(EmployeeId::new(1), CourseId::new(1), "ok", 9)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedbackServiceError::Feedback(FeedbackError::InvalidRating(9))
        ));
        assert_eq!(service.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mark_read_clears_unread_count() {
        let service = service().await;
        assert_eq!(service.unread_count(EmployeeId::new(1)).await.unwrap(), 1);
        service.mark_read(FeedbackId::new(1)).await.unwrap();
        assert_eq!(service.unread_count(EmployeeId::new(1)).await.unwrap(), 0);

        let err = service.mark_read(FeedbackId::new(40)).await.unwrap_err();
        assert!(matches!(
            err,
            FeedbackServiceError::Storage(StorageError::NotFound)
        ));
    }
}
