use chrono::{DateTime, Utc};
use portal_core::model::{CourseId, Employee, EmployeeId};

use super::SqliteRepository;
use super::mapping::{conn, map_completion_row, map_employee_row, to_i64};
use crate::repository::{CompletionRecord, EmployeeRepository, StorageError};

const EMPLOYEE_COLUMNS: &str = "id, name, email, department, position, completed_courses";

#[async_trait::async_trait]
impl EmployeeRepository for SqliteRepository {
    async fn upsert_employee(&self, employee: &Employee) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO employees (id, name, email, department, position, completed_courses)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                department = excluded.department,
                position = excluded.position,
                completed_courses = excluded.completed_courses
            ",
        )
        .bind(to_i64("employee_id", employee.id().value())?)
        .bind(employee.name())
        .bind(employee.email())
        .bind(employee.department())
        .bind(employee.position())
        .bind(i64::from(employee.completed_courses()))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;
        Ok(())
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StorageError> {
        let row = sqlx::query(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"))
            .bind(to_i64("employee_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_employee_row).transpose()
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?1 COLLATE NOCASE"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_employee_row).transpose()
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_employee_row).collect()
    }

    async fn record_completion(
        &self,
        employee_id: EmployeeId,
        course_id: CourseId,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let employee_id = to_i64("employee_id", employee_id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM employees WHERE id = ?1")
            .bind(employee_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let inserted = sqlx::query(
            r"
            INSERT OR IGNORE INTO course_completions (employee_id, course_id, completed_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(employee_id)
        .bind(to_i64("course_id", course_id.value())?)
        .bind(completed_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?
        .rows_affected()
            > 0;

        if inserted {
            sqlx::query(
                "UPDATE employees SET completed_courses = completed_courses + 1 WHERE id = ?1",
            )
            .bind(employee_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(inserted)
    }

    async fn list_completions(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT employee_id, course_id, completed_at
            FROM course_completions
            WHERE employee_id = ?1
            ORDER BY completed_at, course_id
            ",
        )
        .bind(to_i64("employee_id", employee_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_completion_row).collect()
    }
}
