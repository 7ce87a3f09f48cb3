use portal_core::model::{EmployeeId, Feedback, FeedbackId};

use super::SqliteRepository;
use super::mapping::{conn, map_feedback_row, to_i64};
use crate::repository::{FeedbackRepository, StorageError};

#[async_trait::async_trait]
impl FeedbackRepository for SqliteRepository {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO feedback (id, employee_id, employee_name, course_id, course_name,
                                  manager_name, message, rating, date, read)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(to_i64("feedback_id", feedback.id().value())?)
        .bind(to_i64("employee_id", feedback.employee_id().value())?)
        .bind(feedback.employee_name())
        .bind(to_i64("course_id", feedback.course_id().value())?)
        .bind(feedback.course_name())
        .bind(feedback.manager_name())
        .bind(feedback.message())
        .bind(i64::from(feedback.rating()))
        .bind(feedback.date())
        .bind(i64::from(feedback.is_read()))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;
        Ok(())
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StorageError> {
        let rows = sqlx::query("SELECT * FROM feedback ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_feedback_row).collect()
    }

    async fn list_feedback_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<Feedback>, StorageError> {
        let rows = sqlx::query("SELECT * FROM feedback WHERE employee_id = ?1 ORDER BY id")
            .bind(to_i64("employee_id", employee_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_feedback_row).collect()
    }

    async fn mark_feedback_read(&self, id: FeedbackId) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE feedback SET read = 1 WHERE id = ?1")
            .bind(to_i64("feedback_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
