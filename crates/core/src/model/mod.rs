mod app_state;
mod course;
mod employee;
mod feedback;
mod ids;
mod quiz;

pub use app_state::{AppState, AppStateError, TransitionError, UserRole, View, keys};
pub use course::{Course, CourseDraft, CourseError, Lesson, LessonKind, Module};
pub use employee::{Employee, EmployeeError};
pub use feedback::{Feedback, FeedbackDraft, FeedbackError};
pub use ids::{CourseId, EmployeeId, FeedbackId, LessonId, ModuleId, ParseIdError, QuestionId};
pub use quiz::{
    AnswerStatus, PASS_THRESHOLD_PERCENT, QuestionOutcome, Question, Quiz, QuizError, QuizResult,
    percentage,
};
