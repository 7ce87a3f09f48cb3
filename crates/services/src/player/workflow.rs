use std::sync::Arc;
use std::time::Duration;

use portal_core::model::{CourseId, EmployeeId};
use storage::repository::{CourseRepository, EmployeeRepository};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::observer::PlayerObserver;
use super::shell::CoursePlayer;
use super::tracker::LessonCompletion;
use crate::Clock;
use crate::error::PlayerError;

/// Opens course players and persists course completions.
#[derive(Clone)]
pub struct CoursePlayerService {
    clock: Clock,
    completion_delay: Duration,
    courses: Arc<dyn CourseRepository>,
    employees: Arc<dyn EmployeeRepository>,
}

impl CoursePlayerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        completion_delay: Duration,
        courses: Arc<dyn CourseRepository>,
        employees: Arc<dyn EmployeeRepository>,
    ) -> Self {
        Self {
            clock,
            completion_delay,
            courses,
            employees,
        }
    }

    /// Open a course for `learner` (or anonymously when `None`).
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::CourseNotFound` for an unknown course,
    /// `PlayerError::NoRuntime` outside a tokio runtime, and
    /// `PlayerError::Storage` on storage failures.
    pub async fn start(
        &self,
        course_id: CourseId,
        learner: Option<EmployeeId>,
        observer: Arc<dyn PlayerObserver>,
    ) -> Result<CoursePlayer, PlayerError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(PlayerError::CourseNotFound(course_id))?;
        let runtime = Handle::try_current().map_err(|_| PlayerError::NoRuntime)?;

        debug!(%course_id, lessons = course.total_lessons(), "course player opened");
        Ok(
            CoursePlayer::new(Arc::new(course), observer, runtime, self.completion_delay)
                .with_learner(learner),
        )
    }

    /// Complete the current lesson and record the course if it just finished.
    ///
    /// The course-complete notification is scheduled only once the record is
    /// stored. On failure the completion stays armed, so calling this again
    /// retries the record.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Storage` if the completion cannot be recorded.
    pub async fn complete_current_lesson(
        &self,
        player: &mut CoursePlayer,
    ) -> Result<LessonCompletion, PlayerError> {
        let outcome = player.complete_current_lesson_unannounced();
        self.settle(player, outcome).await
    }

    /// Finish the scored quiz and record the course if it just finished.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Storage` if the completion cannot be recorded.
    pub async fn finish_quiz(
        &self,
        player: &mut CoursePlayer,
    ) -> Result<LessonCompletion, PlayerError> {
        let outcome = player.finish_quiz_unannounced();
        self.settle(player, outcome).await
    }

    async fn settle(
        &self,
        player: &mut CoursePlayer,
        outcome: LessonCompletion,
    ) -> Result<LessonCompletion, PlayerError> {
        if !outcome.course_completed() {
            return Ok(outcome);
        }
        if let Err(err) = self.record(player).await {
            warn!(course_id = %player.course_id(), error = %err, "course completion not recorded");
            player.rearm_completion();
            return Err(err);
        }
        player.announce_if_completed(outcome);
        Ok(outcome)
    }

    async fn record(&self, player: &CoursePlayer) -> Result<(), PlayerError> {
        let Some(employee_id) = player.learner() else {
            return Ok(());
        };

        let course_id = player.course_id();
        let recorded = self
            .employees
            .record_completion(employee_id, course_id, self.clock.now())
            .await?;
        if recorded {
            info!(%employee_id, %course_id, "course completion recorded");
        } else {
            debug!(%employee_id, %course_id, "course was already recorded as completed");
        }
        Ok(())
    }
}
