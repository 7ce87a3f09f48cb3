#![forbid(unsafe_code)]

pub mod app_services;
pub mod app_state_service;
pub mod catalog_service;
pub mod error;
pub mod feedback_service;
pub mod player;
pub mod portal;
pub mod timer;

pub use portal_core::{Clock, PortalConfig};

pub use app_services::AppServices;
pub use app_state_service::AppStateService;
pub use catalog_service::{CatalogService, CompanyOverview, CourseSummary};
pub use error::{
    AppServicesError, AppStateServiceError, CatalogServiceError, FeedbackServiceError,
    PlayerError, PortalError,
};
pub use feedback_service::FeedbackService;
pub use player::{
    ChannelObserver, CoursePlayer, CoursePlayerService, LessonCompletion, LessonState,
    LessonView, ModuleProgress, NoopObserver, PlayerEvent, PlayerObserver, PlayerProgress,
    ProgressTracker, QuizAdvance, QuizSession,
};
pub use portal::PortalService;
pub use timer::ScheduledCallback;
