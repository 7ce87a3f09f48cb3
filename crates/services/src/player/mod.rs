mod observer;
mod progress;
mod quiz;
mod shell;
mod tracker;
mod workflow;

// Public API of the player subsystem.
pub use crate::error::PlayerError;
pub use observer::{ChannelObserver, NoopObserver, PlayerEvent, PlayerObserver};
pub use progress::{ModuleProgress, PlayerProgress};
pub use quiz::{QuizAdvance, QuizSession};
pub use shell::{CoursePlayer, LessonView};
pub use tracker::{LessonCompletion, LessonState, ProgressTracker};
pub use workflow::CoursePlayerService;
