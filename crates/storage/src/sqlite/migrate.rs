use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            instructor TEXT NOT NULL,
            duration TEXT NOT NULL,
            level TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS modules (
            id INTEGER PRIMARY KEY,
            course_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            title TEXT NOT NULL,
            description TEXT,
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY,
            module_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            title TEXT NOT NULL,
            duration TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('video', 'text', 'exercise', 'quiz')),
            locked INTEGER NOT NULL CHECK (locked IN (0, 1)),
            completed INTEGER NOT NULL CHECK (completed IN (0, 1)),
            content TEXT,
            video_url TEXT,
            FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_questions (
            lesson_id INTEGER NOT NULL,
            id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            prompt TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_answer INTEGER NOT NULL CHECK (correct_answer >= 0),
            points INTEGER NOT NULL CHECK (points >= 0),
            explanation TEXT,
            PRIMARY KEY (lesson_id, id),
            FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            department TEXT NOT NULL,
            position TEXT NOT NULL,
            completed_courses INTEGER NOT NULL CHECK (completed_courses >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS course_completions (
            employee_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            completed_at TEXT NOT NULL,
            PRIMARY KEY (employee_id, course_id),
            FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS feedback (
            id INTEGER PRIMARY KEY,
            employee_id INTEGER NOT NULL,
            employee_name TEXT NOT NULL,
            course_id INTEGER NOT NULL,
            course_name TEXT NOT NULL,
            manager_name TEXT NOT NULL,
            message TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            date TEXT NOT NULL,
            read INTEGER NOT NULL CHECK (read IN (0, 1))
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_modules_course_position
            ON modules (course_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_lessons_module_position
            ON lessons (module_id, position);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_feedback_employee_date
            ON feedback (employee_id, date);
    ",
];

/// Runs the versioned schema migrations.
///
/// Version 1 creates the catalog (courses, modules, lessons, quiz questions),
/// employees with their completions, feedback, and the app-state table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for &statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "applied schema migration");
    }

    Ok(())
}
