use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, ModuleId};
use crate::model::quiz::Quiz;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyCourseTitle,

    #[error("module title cannot be empty")]
    EmptyModuleTitle,

    #[error("lesson title cannot be empty")]
    EmptyLessonTitle,

    #[error("lesson {0} is not a quiz lesson and cannot carry a quiz")]
    QuizOnNonQuizLesson(LessonId),

    #[error("duplicate module id {0}")]
    DuplicateModule(ModuleId),

    #[error("duplicate lesson id {0}")]
    DuplicateLesson(LessonId),
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// The kind of content a lesson presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonKind {
    Video,
    Text,
    Exercise,
    Quiz,
}

/// Atomic unit of course content.
///
/// `locked` and `completed` are the static catalog flags; the live state of a
/// lesson during a session is tracked separately by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    duration: String,
    kind: LessonKind,
    locked: bool,
    completed: bool,
    content: Option<String>,
    video_url: Option<String>,
    quiz: Option<Quiz>,
}

impl Lesson {
    /// Creates an unlocked, not-yet-completed lesson.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyLessonTitle` if the title is blank.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        duration: impl Into<String>,
        kind: LessonKind,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyLessonTitle);
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            duration: duration.into().trim().to_owned(),
            kind,
            locked: false,
            completed: false,
            content: None,
            video_url: None,
            quiz: None,
        })
    }

    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = normalize_optional(Some(content.into()));
        self
    }

    #[must_use]
    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = normalize_optional(Some(url.into()));
        self
    }

    /// Attaches a quiz to a quiz lesson.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::QuizOnNonQuizLesson` unless the lesson kind is `Quiz`.
    pub fn with_quiz(mut self, quiz: Quiz) -> Result<Self, CourseError> {
        if self.kind != LessonKind::Quiz {
            return Err(CourseError::QuizOnNonQuizLesson(self.id));
        }
        self.quiz = Some(quiz);
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    #[must_use]
    pub fn kind(&self) -> LessonKind {
        self.kind
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// Ordered group of lessons within a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    title: String,
    description: Option<String>,
    lessons: Vec<Lesson>,
}

impl Module {
    /// Creates a module.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyModuleTitle` for a blank title and
    /// `CourseError::DuplicateLesson` if two lessons share an id.
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        description: Option<String>,
        lessons: Vec<Lesson>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyModuleTitle);
        }
        let mut seen = HashSet::with_capacity(lessons.len());
        for lesson in &lessons {
            if !seen.insert(lesson.id()) {
                return Err(CourseError::DuplicateLesson(lesson.id()));
            }
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: normalize_optional(description),
            lessons,
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id() == id)
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Unvalidated course fields, mirroring how the catalog and storage build courses.
#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub duration: String,
    pub level: String,
    pub modules: Vec<Module>,
}

impl CourseDraft {
    /// Validate the draft into an immutable course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyCourseTitle` for a blank title, and
    /// `DuplicateModule` / `DuplicateLesson` if ids repeat anywhere in the tree.
    pub fn validate(self) -> Result<Course, CourseError> {
        if self.title.trim().is_empty() {
            return Err(CourseError::EmptyCourseTitle);
        }

        let mut modules = HashSet::with_capacity(self.modules.len());
        let mut lessons = HashSet::new();
        for module in &self.modules {
            if !modules.insert(module.id()) {
                return Err(CourseError::DuplicateModule(module.id()));
            }
            for lesson in module.lessons() {
                if !lessons.insert(lesson.id()) {
                    return Err(CourseError::DuplicateLesson(lesson.id()));
                }
            }
        }

        Ok(Course {
            id: CourseId::new(self.id),
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            instructor: self.instructor.trim().to_owned(),
            duration: self.duration.trim().to_owned(),
            level: self.level.trim().to_owned(),
            modules: self.modules,
        })
    }
}

/// A course: immutable tree of modules and lessons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    instructor: String,
    duration: String,
    level: String,
    modules: Vec<Module>,
}

impl Course {
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn instructor(&self) -> &str {
        &self.instructor
    }

    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    /// All lessons in course order, paired with their module.
    pub fn lessons(&self) -> impl Iterator<Item = (&Module, &Lesson)> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons().iter().map(move |l| (m, l)))
    }

    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(|m| m.lessons().len()).sum()
    }

    #[must_use]
    pub fn find_lesson(&self, id: LessonId) -> Option<(&Module, &Lesson)> {
        self.lessons().find(|(_, l)| l.id() == id)
    }

    /// The lesson that follows `id` in sequence: the next lesson of the same
    /// module, else the first lesson of the next non-empty module.
    #[must_use]
    pub fn next_lesson(&self, id: LessonId) -> Option<(&Module, &Lesson)> {
        let mut lessons = self.lessons().skip_while(|(_, l)| l.id() != id);
        lessons.next()?;
        lessons.next()
    }

    #[must_use]
    pub fn first_lesson(&self) -> Option<(&Module, &Lesson)> {
        self.lessons().next()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuestionId;
    use crate::model::quiz::Question;

    fn lesson(id: u64) -> Lesson {
        Lesson::new(LessonId::new(id), format!("Aula {id}"), "10min", LessonKind::Text).unwrap()
    }

    fn course(modules: Vec<Module>) -> Course {
        CourseDraft {
            id: 1,
            title: "Registro".into(),
            modules,
            ..CourseDraft::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn lesson_rejects_blank_title() {
        let err = Lesson::new(LessonId::new(1), "  ", "5min", LessonKind::Video).unwrap_err();
        assert_eq!(err, CourseError::EmptyLessonTitle);
    }

    #[test]
    fn quiz_only_attaches_to_quiz_lessons() {
        let question = Question::new(
            QuestionId::new(1),
            "Q",
            vec!["a".into(), "b".into()],
            0,
            10,
        )
        .unwrap();
        let quiz = Quiz::new(vec![question]).unwrap();

        let err = lesson(1).with_quiz(quiz.clone()).unwrap_err();
        assert_eq!(err, CourseError::QuizOnNonQuizLesson(LessonId::new(1)));

        let quiz_lesson = Lesson::new(LessonId::new(2), "Prova", "15min", LessonKind::Quiz)
            .unwrap()
            .with_quiz(quiz)
            .unwrap();
        assert_eq!(quiz_lesson.quiz().map(Quiz::total_points), Some(10));
    }

    #[test]
    fn course_rejects_duplicate_lessons_across_modules() {
        let m1 = Module::new(ModuleId::new(1), "M1", None, vec![lesson(1)]).unwrap();
        let m2 = Module::new(ModuleId::new(2), "M2", None, vec![lesson(1)]).unwrap();
        let err = CourseDraft {
            id: 1,
            title: "Curso".into(),
            modules: vec![m1, m2],
            ..CourseDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, CourseError::DuplicateLesson(LessonId::new(1)));
    }

    #[test]
    fn course_rejects_blank_title() {
        let err = CourseDraft::default().validate().unwrap_err();
        assert_eq!(err, CourseError::EmptyCourseTitle);
    }

    #[test]
    fn next_lesson_crosses_module_boundaries() {
        let m1 = Module::new(ModuleId::new(1), "M1", None, vec![lesson(1), lesson(2)]).unwrap();
        let empty = Module::new(ModuleId::new(2), "Vazio", None, Vec::new()).unwrap();
        let m3 = Module::new(ModuleId::new(3), "M3", None, vec![lesson(3)]).unwrap();
        let course = course(vec![m1, empty, m3]);

        let (m, l) = course.next_lesson(LessonId::new(1)).unwrap();
        assert_eq!((m.id(), l.id()), (ModuleId::new(1), LessonId::new(2)));

        let (m, l) = course.next_lesson(LessonId::new(2)).unwrap();
        assert_eq!((m.id(), l.id()), (ModuleId::new(3), LessonId::new(3)));

        assert!(course.next_lesson(LessonId::new(3)).is_none());
        assert!(course.next_lesson(LessonId::new(99)).is_none());
        assert_eq!(course.total_lessons(), 3);
    }

    #[test]
    fn module_drops_blank_description() {
        let module = Module::new(ModuleId::new(1), " M1 ", Some("   ".into()), Vec::new()).unwrap();
        assert_eq!(module.title(), "M1");
        assert_eq!(module.description(), None);
    }
}
