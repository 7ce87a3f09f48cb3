use std::collections::HashMap;

use portal_core::model::{Course, CourseDraft, CourseId, Lesson, LessonId, Module, ModuleId, Question, Quiz};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    conn, lesson_id_from_i64, lesson_kind_to_str, map_lesson_row, map_question_row,
    module_id_from_i64, ser, to_i64,
};
use crate::repository::{CourseRepository, StorageError};

impl SqliteRepository {
    async fn load_course(&self, row: &SqliteRow) -> Result<Course, StorageError> {
        let course_id: i64 = row.try_get("id").map_err(ser)?;

        let mut questions: HashMap<LessonId, Vec<Question>> = HashMap::new();
        let question_rows = sqlx::query(
            r"
            SELECT q.lesson_id, q.id, q.prompt, q.options, q.correct_answer, q.points, q.explanation
            FROM quiz_questions q
            JOIN lessons l ON l.id = q.lesson_id
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = ?1
            ORDER BY q.lesson_id, q.position
            ",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        for q in &question_rows {
            let lesson_id = lesson_id_from_i64(q.try_get("lesson_id").map_err(ser)?)?;
            questions
                .entry(lesson_id)
                .or_default()
                .push(map_question_row(q)?);
        }

        let mut lessons: HashMap<ModuleId, Vec<Lesson>> = HashMap::new();
        let lesson_rows = sqlx::query(
            r"
            SELECT l.id, l.module_id, l.title, l.duration, l.kind, l.locked, l.completed,
                   l.content, l.video_url
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = ?1
            ORDER BY l.module_id, l.position
            ",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        for l in &lesson_rows {
            let fields = map_lesson_row(l)?;
            let mut lesson = Lesson::new(fields.id, fields.title, fields.duration, fields.kind)
                .map_err(ser)?
                .with_locked(fields.locked)
                .with_completed(fields.completed);
            if let Some(content) = fields.content {
                lesson = lesson.with_content(content);
            }
            if let Some(url) = fields.video_url {
                lesson = lesson.with_video_url(url);
            }
            if let Some(qs) = questions.remove(&fields.id) {
                lesson = lesson
                    .with_quiz(Quiz::new(qs).map_err(ser)?)
                    .map_err(ser)?;
            }
            lessons.entry(fields.module_id).or_default().push(lesson);
        }

        let module_rows = sqlx::query(
            r"
            SELECT id, title, description
            FROM modules
            WHERE course_id = ?1
            ORDER BY position
            ",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        let mut modules = Vec::with_capacity(module_rows.len());
        for m in &module_rows {
            let id = module_id_from_i64(m.try_get("id").map_err(ser)?)?;
            modules.push(
                Module::new(
                    id,
                    m.try_get::<String, _>("title").map_err(ser)?,
                    m.try_get("description").map_err(ser)?,
                    lessons.remove(&id).unwrap_or_default(),
                )
                .map_err(ser)?,
            );
        }

        let id = u64::try_from(course_id)
            .map_err(|_| StorageError::Serialization("course_id sign overflow".into()))?;
        CourseDraft {
            id,
            title: row.try_get("title").map_err(ser)?,
            description: row.try_get("description").map_err(ser)?,
            instructor: row.try_get("instructor").map_err(ser)?,
            duration: row.try_get("duration").map_err(ser)?,
            level: row.try_get("level").map_err(ser)?,
            modules,
        }
        .validate()
        .map_err(ser)
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let course_id = to_i64("course_id", course.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, description, instructor, duration, level)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                instructor = excluded.instructor,
                duration = excluded.duration,
                level = excluded.level
            ",
        )
        .bind(course_id)
        .bind(course.title())
        .bind(course.description())
        .bind(course.instructor())
        .bind(course.duration())
        .bind(course.level())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // The tree is replaced wholesale; lessons and questions cascade.
        sqlx::query("DELETE FROM modules WHERE course_id = ?1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (module_pos, module) in course.modules().iter().enumerate() {
            let module_id = to_i64("module_id", module.id().value())?;
            sqlx::query(
                r"
                INSERT INTO modules (id, course_id, position, title, description)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(module_id)
            .bind(course_id)
            .bind(to_i64("position", module_pos)?)
            .bind(module.title())
            .bind(module.description())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

            for (lesson_pos, lesson) in module.lessons().iter().enumerate() {
                let lesson_id = to_i64("lesson_id", lesson.id().value())?;
                sqlx::query(
                    r"
                    INSERT INTO lessons (id, module_id, position, title, duration, kind, locked,
                                         completed, content, video_url)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ",
                )
                .bind(lesson_id)
                .bind(module_id)
                .bind(to_i64("position", lesson_pos)?)
                .bind(lesson.title())
                .bind(lesson.duration())
                .bind(lesson_kind_to_str(lesson.kind()))
                .bind(i64::from(lesson.is_locked()))
                .bind(i64::from(lesson.is_completed()))
                .bind(lesson.content())
                .bind(lesson.video_url())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;

                let Some(quiz) = lesson.quiz() else { continue };
                for (question_pos, question) in quiz.questions().iter().enumerate() {
                    let options = serde_json::to_string(question.options()).map_err(ser)?;
                    sqlx::query(
                        r"
                        INSERT INTO quiz_questions (lesson_id, id, position, prompt, options,
                                                    correct_answer, points, explanation)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                        ",
                    )
                    .bind(lesson_id)
                    .bind(to_i64("question_id", question.id().value())?)
                    .bind(to_i64("position", question_pos)?)
                    .bind(question.prompt())
                    .bind(options)
                    .bind(to_i64("correct_answer", question.correct_answer())?)
                    .bind(i64::from(question.points()))
                    .bind(question.explanation())
                    .execute(&mut *tx)
                    .await
                    .map_err(conn)?;
                }
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(
            "SELECT id, title, description, instructor, duration, level FROM courses WHERE id = ?1",
        )
        .bind(to_i64("course_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => Ok(Some(self.load_course(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, title, description, instructor, duration, level FROM courses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in &rows {
            courses.push(self.load_course(row).await?);
        }
        Ok(courses)
    }
}
