use chrono::NaiveDate;
use portal_core::model::{
    CourseId, Employee, EmployeeId, Feedback, FeedbackId, LessonId, LessonKind, ModuleId,
    Question, QuestionId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{CompletionRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn to_i64<T>(field: &'static str, v: T) -> Result<i64, StorageError>
where
    i64: TryFrom<T>,
{
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn module_id_from_i64(v: i64) -> Result<ModuleId, StorageError> {
    Ok(ModuleId::new(i64_to_u64("module_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn employee_id_from_i64(v: i64) -> Result<EmployeeId, StorageError> {
    Ok(EmployeeId::new(i64_to_u64("employee_id", v)?))
}

pub(crate) fn feedback_id_from_i64(v: i64) -> Result<FeedbackId, StorageError> {
    Ok(FeedbackId::new(i64_to_u64("feedback_id", v)?))
}

pub(crate) fn lesson_kind_to_str(kind: LessonKind) -> &'static str {
    match kind {
        LessonKind::Video => "video",
        LessonKind::Text => "text",
        LessonKind::Exercise => "exercise",
        LessonKind::Quiz => "quiz",
    }
}

pub(crate) fn parse_lesson_kind(s: &str) -> Result<LessonKind, StorageError> {
    match s {
        "video" => Ok(LessonKind::Video),
        "text" => Ok(LessonKind::Text),
        "exercise" => Ok(LessonKind::Exercise),
        "quiz" => Ok(LessonKind::Quiz),
        _ => Err(StorageError::Serialization(format!("invalid lesson kind: {s}"))),
    }
}

fn flag(row: &SqliteRow, column: &'static str) -> Result<bool, StorageError> {
    match row.try_get::<i64, _>(column).map_err(ser)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid {column} flag: {other}"
        ))),
    }
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = i64_to_u64("question_id", row.try_get("id").map_err(ser)?)?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct = i64_to_u64("correct_answer", row.try_get("correct_answer").map_err(ser)?)?;
    let correct = usize::try_from(correct).map_err(ser)?;
    let points: i64 = row.try_get("points").map_err(ser)?;
    let points = u32::try_from(points)
        .map_err(|_| StorageError::Serialization(format!("invalid points: {points}")))?;

    let question = Question::new(
        QuestionId::new(id),
        row.try_get::<String, _>("prompt").map_err(ser)?,
        options,
        correct,
        points,
    )
    .map_err(ser)?;

    Ok(match row.try_get::<Option<String>, _>("explanation").map_err(ser)? {
        Some(explanation) => question.with_explanation(explanation),
        None => question,
    })
}

/// Static lesson fields read from a `lessons` row.
pub(crate) struct LessonRow {
    pub module_id: ModuleId,
    pub id: LessonId,
    pub title: String,
    pub duration: String,
    pub kind: LessonKind,
    pub locked: bool,
    pub completed: bool,
    pub content: Option<String>,
    pub video_url: Option<String>,
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<LessonRow, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    Ok(LessonRow {
        module_id: module_id_from_i64(row.try_get("module_id").map_err(ser)?)?,
        id: lesson_id_from_i64(row.try_get("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        duration: row.try_get("duration").map_err(ser)?,
        kind: parse_lesson_kind(&kind)?,
        locked: flag(row, "locked")?,
        completed: flag(row, "completed")?,
        content: row.try_get("content").map_err(ser)?,
        video_url: row.try_get("video_url").map_err(ser)?,
    })
}

pub(crate) fn map_employee_row(row: &SqliteRow) -> Result<Employee, StorageError> {
    let completed: i64 = row.try_get("completed_courses").map_err(ser)?;
    let completed = u32::try_from(completed)
        .map_err(|_| StorageError::Serialization(format!("invalid completed_courses: {completed}")))?;

    Ok(Employee::new(
        employee_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("email").map_err(ser)?,
        row.try_get::<String, _>("department").map_err(ser)?,
        row.try_get::<String, _>("position").map_err(ser)?,
    )
    .map_err(ser)?
    .with_completed_courses(completed))
}

pub(crate) fn map_completion_row(row: &SqliteRow) -> Result<CompletionRecord, StorageError> {
    Ok(CompletionRecord {
        employee_id: employee_id_from_i64(row.try_get("employee_id").map_err(ser)?)?,
        course_id: course_id_from_i64(row.try_get("course_id").map_err(ser)?)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_feedback_row(row: &SqliteRow) -> Result<Feedback, StorageError> {
    let rating: i64 = row.try_get("rating").map_err(ser)?;
    let rating = u8::try_from(rating)
        .map_err(|_| StorageError::Serialization(format!("invalid rating: {rating}")))?;
    let date: NaiveDate = row.try_get("date").map_err(ser)?;

    Feedback::from_persisted(
        feedback_id_from_i64(row.try_get("id").map_err(ser)?)?,
        employee_id_from_i64(row.try_get("employee_id").map_err(ser)?)?,
        row.try_get("employee_name").map_err(ser)?,
        course_id_from_i64(row.try_get("course_id").map_err(ser)?)?,
        row.try_get("course_name").map_err(ser)?,
        row.try_get("manager_name").map_err(ser)?,
        row.try_get("message").map_err(ser)?,
        rating,
        date,
        flag(row, "read")?,
    )
    .map_err(ser)
}
