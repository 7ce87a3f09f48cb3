use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use portal_core::model::{Course, CourseId, EmployeeId, Lesson, LessonId, LessonKind, Module, ModuleId};
use tokio::runtime::Handle;
use tracing::{debug, info};

use super::observer::PlayerObserver;
use super::progress::PlayerProgress;
use super::quiz::QuizSession;
use super::tracker::{LessonCompletion, ProgressTracker};
use crate::timer::ScheduledCallback;

//
// ─── VIEW ──────────────────────────────────────────────────────────────────────
//

/// What the main pane shows for the current lesson.
#[derive(Debug, Clone, Copy)]
pub enum LessonView<'a> {
    /// No lesson is selected (e.g. the first module has no unlocked lesson).
    Empty,
    Video(&'a Lesson),
    Text(&'a Lesson),
    Exercise(&'a Lesson),
    Quiz(&'a Lesson, &'a QuizSession),
    /// A quiz lesson with no questions attached.
    QuizUnavailable(&'a Lesson),
}

//
// ─── PLAYER ────────────────────────────────────────────────────────────────────
//

/// Interactive state of one open course.
///
/// All transitions are synchronous; the only deferred effect is the course
/// completion notification, which is cancelled by `back()` or by dropping
/// the player.
pub struct CoursePlayer {
    course: Arc<Course>,
    tracker: ProgressTracker,
    learner: Option<EmployeeId>,
    current_module: Option<ModuleId>,
    current_lesson: Option<LessonId>,
    expanded: HashSet<ModuleId>,
    quiz: Option<QuizSession>,
    observer: Arc<dyn PlayerObserver>,
    runtime: Handle,
    completion_delay: Duration,
    pending_completion: Option<ScheduledCallback>,
}

impl CoursePlayer {
    #[must_use]
    pub fn new(
        course: Arc<Course>,
        observer: Arc<dyn PlayerObserver>,
        runtime: Handle,
        completion_delay: Duration,
    ) -> Self {
        let tracker = ProgressTracker::new(Arc::clone(&course));
        let first_module = course.modules().first();
        let current_module = first_module.map(Module::id);
        let current_lesson = first_module.and_then(|m| {
            m.lessons()
                .iter()
                .find(|l| tracker.can_select(l.id()))
                .map(Lesson::id)
        });

        let mut player = Self {
            course,
            tracker,
            learner: None,
            current_module,
            current_lesson,
            expanded: current_module.into_iter().collect(),
            quiz: None,
            observer,
            runtime,
            completion_delay,
            pending_completion: None,
        };
        player.reset_quiz();
        player
    }

    /// Attribute completions in this session to an employee.
    #[must_use]
    pub fn with_learner(mut self, learner: Option<EmployeeId>) -> Self {
        self.learner = learner;
        self
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course.id()
    }

    #[must_use]
    pub fn learner(&self) -> Option<EmployeeId> {
        self.learner
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    #[must_use]
    pub fn progress(&self) -> PlayerProgress {
        self.tracker.progress()
    }

    #[must_use]
    pub fn current_module(&self) -> Option<&Module> {
        self.current_module.and_then(|id| self.course.module(id))
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        let module = self.current_module()?;
        self.current_lesson.and_then(|id| module.lesson(id))
    }

    #[must_use]
    pub fn is_expanded(&self, module_id: ModuleId) -> bool {
        self.expanded.contains(&module_id)
    }

    /// Expand or collapse a module in the outline; returns the new state.
    pub fn toggle_module(&mut self, module_id: ModuleId) -> bool {
        if self.course.module(module_id).is_none() {
            return false;
        }
        if self.expanded.remove(&module_id) {
            false
        } else {
            self.expanded.insert(module_id);
            true
        }
    }

    /// Open a lesson of the given module if it is not locked.
    pub fn select_lesson(&mut self, module_id: ModuleId, lesson_id: LessonId) -> bool {
        let in_module = self
            .course
            .module(module_id)
            .is_some_and(|m| m.lesson(lesson_id).is_some());
        if !in_module || !self.tracker.can_select(lesson_id) {
            debug!(%module_id, %lesson_id, "lesson not selectable");
            return false;
        }

        let changed = self.current_lesson != Some(lesson_id);
        self.current_module = Some(module_id);
        self.current_lesson = Some(lesson_id);
        if changed {
            self.reset_quiz();
        }
        true
    }

    /// Move to the lesson after the current one, if it is unlocked.
    pub fn select_next_lesson(&mut self) -> bool {
        let Some(current) = self.current_lesson else {
            return false;
        };
        let Some((module, lesson)) = self.course.next_lesson(current) else {
            return false;
        };
        let (module_id, lesson_id) = (module.id(), lesson.id());
        if self.select_lesson(module_id, lesson_id) {
            self.expanded.insert(module_id);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn view(&self) -> LessonView<'_> {
        let Some(lesson) = self.current_lesson() else {
            return LessonView::Empty;
        };
        match lesson.kind() {
            LessonKind::Video => LessonView::Video(lesson),
            LessonKind::Text => LessonView::Text(lesson),
            LessonKind::Exercise => LessonView::Exercise(lesson),
            LessonKind::Quiz => match &self.quiz {
                Some(session) => LessonView::Quiz(lesson, session),
                None => LessonView::QuizUnavailable(lesson),
            },
        }
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    pub fn quiz_mut(&mut self) -> Option<&mut QuizSession> {
        self.quiz.as_mut()
    }

    /// Mark the current lesson as done.
    ///
    /// Lessons with a quiz are completed through `finish_quiz` instead.
    pub fn complete_current_lesson(&mut self) -> LessonCompletion {
        let outcome = self.complete_current_lesson_unannounced();
        self.announce_if_completed(outcome);
        outcome
    }

    /// Complete the quiz lesson once the attempt has been scored.
    pub fn finish_quiz(&mut self) -> LessonCompletion {
        let outcome = self.finish_quiz_unannounced();
        self.announce_if_completed(outcome);
        outcome
    }

    pub(crate) fn complete_current_lesson_unannounced(&mut self) -> LessonCompletion {
        let Some(lesson_id) = self.current_lesson else {
            return LessonCompletion::Ignored;
        };
        if self.quiz.is_some() {
            debug!(%lesson_id, "quiz lesson must be finished through the quiz");
            return LessonCompletion::Ignored;
        }
        self.tracker.complete_lesson(lesson_id)
    }

    pub(crate) fn finish_quiz_unannounced(&mut self) -> LessonCompletion {
        match self.quiz.as_ref().and_then(QuizSession::finish) {
            Some(lesson_id) => self.tracker.complete_lesson(lesson_id),
            None => LessonCompletion::Ignored,
        }
    }

    /// Schedule the course-complete notification if `outcome` finished the course.
    pub(crate) fn announce_if_completed(&mut self, outcome: LessonCompletion) {
        if outcome.course_completed() {
            self.schedule_completion();
        }
    }

    /// Report the course completion again on the next completion request.
    pub(crate) fn rearm_completion(&mut self) {
        self.tracker.rearm_completion();
    }

    /// Leave the player. Any pending completion notification is dropped.
    pub fn back(&mut self) {
        if let Some(pending) = self.pending_completion.take() {
            pending.cancel();
        }
        self.observer.on_back(self.course.id());
    }

    #[must_use]
    pub fn has_pending_completion(&self) -> bool {
        self.pending_completion
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    fn schedule_completion(&mut self) {
        let course_id = self.course.id();
        let observer = Arc::clone(&self.observer);
        info!(%course_id, delay = ?self.completion_delay, "course completed");
        self.pending_completion = Some(ScheduledCallback::spawn(
            &self.runtime,
            self.completion_delay,
            move || observer.on_course_complete(course_id),
        ));
    }

    fn reset_quiz(&mut self) {
        self.quiz = self.current_lesson().and_then(|lesson| {
            lesson
                .quiz()
                .map(|quiz| QuizSession::new(lesson.id(), quiz.clone()))
        });
    }
}
