use std::collections::HashMap;
use std::sync::Arc;

use portal_core::model::{Course, LessonId, Module, ModuleId};
use tracing::debug;

use super::progress::{ModuleProgress, PlayerProgress, ratio};

/// Live state of a lesson during one player session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonState {
    Locked,
    Unlocked,
    Completed,
}

/// Outcome of asking the tracker to complete a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonCompletion {
    /// Unknown or still locked lesson.
    Ignored,
    AlreadyCompleted,
    Completed {
        lesson_id: LessonId,
        /// Next lesson that this completion unlocked, if any.
        unlocked: Option<LessonId>,
        /// Set only on the completion that finished the course.
        course_completed: bool,
    },
}

impl LessonCompletion {
    #[must_use]
    pub fn course_completed(&self) -> bool {
        matches!(
            self,
            LessonCompletion::Completed {
                course_completed: true,
                ..
            }
        )
    }
}

/// Tracks lesson locking and completion for one course.
///
/// Unlocks are written into the tracker's own state map, so a lesson stays
/// unlocked for the rest of the session.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    course: Arc<Course>,
    states: HashMap<LessonId, LessonState>,
    completion_reported: bool,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(course: Arc<Course>) -> Self {
        let opening = course
            .modules()
            .first()
            .and_then(|m| m.lessons().first())
            .map(|l| l.id());

        let mut states: HashMap<LessonId, LessonState> = course
            .lessons()
            .map(|(_, lesson)| {
                let state = if lesson.is_completed() {
                    LessonState::Completed
                } else if Some(lesson.id()) == opening || !lesson.is_locked() {
                    LessonState::Unlocked
                } else {
                    LessonState::Locked
                };
                (lesson.id(), state)
            })
            .collect();

        // Lessons that start completed open their successor, as if just finished.
        for (_, lesson) in course.lessons().filter(|(_, l)| l.is_completed()) {
            let next = course.next_lesson(lesson.id()).map(|(_, l)| l.id());
            if let Some(state) = next
                .and_then(|id| states.get_mut(&id))
                .filter(|state| **state == LessonState::Locked)
            {
                *state = LessonState::Unlocked;
            }
        }

        let mut tracker = Self {
            course,
            states,
            completion_reported: false,
        };
        // A course that starts complete never reports a transition.
        tracker.completion_reported = tracker.is_course_complete();
        tracker
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn state(&self, lesson_id: LessonId) -> Option<LessonState> {
        self.states.get(&lesson_id).copied()
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: LessonId) -> bool {
        self.state(lesson_id) == Some(LessonState::Completed)
    }

    /// Whether the learner may open this lesson.
    #[must_use]
    pub fn can_select(&self, lesson_id: LessonId) -> bool {
        matches!(
            self.state(lesson_id),
            Some(LessonState::Unlocked | LessonState::Completed)
        )
    }

    pub fn complete_lesson(&mut self, lesson_id: LessonId) -> LessonCompletion {
        match self.state(lesson_id) {
            None | Some(LessonState::Locked) => {
                debug!(%lesson_id, "lesson is locked or unknown, completion ignored");
                return LessonCompletion::Ignored;
            }
            Some(LessonState::Completed) => return self.report_rearmed(lesson_id),
            Some(LessonState::Unlocked) => {}
        }

        self.states.insert(lesson_id, LessonState::Completed);

        let next = self.course.next_lesson(lesson_id).map(|(_, l)| l.id());
        let unlocked = next.filter(|id| self.state(*id) == Some(LessonState::Locked));
        if let Some(id) = unlocked {
            self.states.insert(id, LessonState::Unlocked);
            debug!(%lesson_id, unlocked = %id, "next lesson unlocked");
        }

        let course_completed = !self.completion_reported && self.is_course_complete();
        if course_completed {
            self.completion_reported = true;
        }

        LessonCompletion::Completed {
            lesson_id,
            unlocked,
            course_completed,
        }
    }

    /// Arm the course completion signal again after its report could not be
    /// delivered. The next completion request for any finished lesson reports
    /// the course as just completed.
    pub fn rearm_completion(&mut self) {
        if self.is_course_complete() {
            self.completion_reported = false;
        }
    }

    fn report_rearmed(&mut self, lesson_id: LessonId) -> LessonCompletion {
        if self.completion_reported || !self.is_course_complete() {
            return LessonCompletion::AlreadyCompleted;
        }
        self.completion_reported = true;
        LessonCompletion::Completed {
            lesson_id,
            unlocked: None,
            course_completed: true,
        }
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == LessonState::Completed)
            .count()
    }

    fn completed_in(&self, module: &Module) -> usize {
        module
            .lessons()
            .iter()
            .filter(|l| self.is_completed(l.id()))
            .count()
    }

    /// Percentage of the module's lessons completed; 0 for an empty or unknown module.
    #[must_use]
    pub fn module_progress(&self, module_id: ModuleId) -> f64 {
        self.course
            .module(module_id)
            .map_or(0.0, |m| ratio(self.completed_in(m), m.lessons().len()))
    }

    #[must_use]
    pub fn course_progress(&self) -> f64 {
        ratio(self.completed_count(), self.course.total_lessons())
    }

    #[must_use]
    pub fn is_course_complete(&self) -> bool {
        let total = self.course.total_lessons();
        total > 0 && self.completed_count() == total
    }

    #[must_use]
    pub fn progress(&self) -> PlayerProgress {
        let modules = self
            .course
            .modules()
            .iter()
            .map(|m| {
                let completed = self.completed_in(m);
                ModuleProgress {
                    module_id: m.id(),
                    completed,
                    total: m.lessons().len(),
                    percent: ratio(completed, m.lessons().len()),
                }
            })
            .collect();

        PlayerProgress {
            completed: self.completed_count(),
            total: self.course.total_lessons(),
            percent: self.course_progress(),
            modules,
            is_complete: self.is_course_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{CourseDraft, Lesson, LessonKind};

    fn lesson(id: u64, locked: bool) -> Lesson {
        Lesson::new(LessonId::new(id), format!("L{id}"), "5min", LessonKind::Text)
            .unwrap()
            .with_locked(locked)
    }

    fn course(modules: Vec<Vec<Lesson>>) -> Arc<Course> {
        let modules = modules
            .into_iter()
            .enumerate()
            .map(|(i, lessons)| {
                Module::new(ModuleId::new(i as u64 + 1), format!("M{i}"), None, lessons).unwrap()
            })
            .collect();
        Arc::new(
            CourseDraft {
                id: 1,
                title: "Curso".into(),
                modules,
                ..CourseDraft::default()
            }
            .validate()
            .unwrap(),
        )
    }

    fn two_by_two() -> Arc<Course> {
        course(vec![
            vec![lesson(1, false), lesson(2, true)],
            vec![lesson(3, true), lesson(4, true)],
        ])
    }

    #[test]
    fn opening_lesson_is_always_unlocked() {
        let tracker = ProgressTracker::new(course(vec![vec![lesson(1, true), lesson(2, true)]]));
        assert_eq!(tracker.state(LessonId::new(1)), Some(LessonState::Unlocked));
        assert_eq!(tracker.state(LessonId::new(2)), Some(LessonState::Locked));
    }

    #[test]
    fn completion_unlocks_next_lesson_and_it_stays_unlocked() {
        let mut tracker = ProgressTracker::new(two_by_two());
        let outcome = tracker.complete_lesson(LessonId::new(1));
        assert_eq!(
            outcome,
            LessonCompletion::Completed {
                lesson_id: LessonId::new(1),
                unlocked: Some(LessonId::new(2)),
                course_completed: false,
            }
        );
        assert!(tracker.can_select(LessonId::new(2)));

        // Crossing the module boundary unlocks the first lesson of the next module.
        let outcome = tracker.complete_lesson(LessonId::new(2));
        assert!(matches!(
            outcome,
            LessonCompletion::Completed { unlocked: Some(id), .. } if id == LessonId::new(3)
        ));
        assert!(tracker.can_select(LessonId::new(2)));
        assert!(tracker.can_select(LessonId::new(3)));
    }

    #[test]
    fn locked_and_unknown_lessons_are_ignored() {
        let mut tracker = ProgressTracker::new(two_by_two());
        assert_eq!(tracker.complete_lesson(LessonId::new(4)), LessonCompletion::Ignored);
        assert_eq!(tracker.complete_lesson(LessonId::new(99)), LessonCompletion::Ignored);
        assert_eq!(tracker.completed_count(), 0);
    }

    #[test]
    fn progress_steps_by_quarters_and_reports_completion_once() {
        let mut tracker = ProgressTracker::new(two_by_two());
        let mut reported = 0;
        let mut seen = vec![tracker.course_progress()];
        for id in 1..=4 {
            if tracker.complete_lesson(LessonId::new(id)).course_completed() {
                reported += 1;
            }
            seen.push(tracker.course_progress());
        }
        assert_eq!(seen, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(reported, 1);
        assert_eq!(
            tracker.complete_lesson(LessonId::new(4)),
            LessonCompletion::AlreadyCompleted
        );
        assert!(tracker.is_course_complete());
        assert_eq!(tracker.module_progress(ModuleId::new(2)), 100.0);
    }

    #[test]
    fn statically_completed_lessons_count_toward_progress() {
        let tracker = ProgressTracker::new(course(vec![vec![
            lesson(1, false).with_completed(true),
            lesson(2, true),
        ]]));
        assert_eq!(tracker.course_progress(), 50.0);
        assert_eq!(tracker.module_progress(ModuleId::new(1)), 50.0);
    }

    #[test]
    fn statically_completed_lesson_opens_its_successor() {
        let mut tracker = ProgressTracker::new(course(vec![vec![
            lesson(1, false).with_completed(true),
            lesson(2, true),
            lesson(3, true),
        ]]));
        assert_eq!(tracker.state(LessonId::new(2)), Some(LessonState::Unlocked));
        assert_eq!(tracker.state(LessonId::new(3)), Some(LessonState::Locked));

        tracker.complete_lesson(LessonId::new(2));
        assert!(tracker.complete_lesson(LessonId::new(3)).course_completed());
        assert_eq!(tracker.course_progress(), 100.0);
    }

    #[test]
    fn rearmed_completion_is_reported_again_once() {
        let mut tracker = ProgressTracker::new(course(vec![vec![lesson(1, false)]]));
        assert!(tracker.complete_lesson(LessonId::new(1)).course_completed());

        tracker.rearm_completion();
        assert!(tracker.complete_lesson(LessonId::new(1)).course_completed());
        assert_eq!(
            tracker.complete_lesson(LessonId::new(1)),
            LessonCompletion::AlreadyCompleted
        );
    }

    #[test]
    fn rearming_an_unfinished_course_does_nothing() {
        let mut tracker = ProgressTracker::new(two_by_two());
        tracker.complete_lesson(LessonId::new(1));
        tracker.rearm_completion();
        assert_eq!(
            tracker.complete_lesson(LessonId::new(1)),
            LessonCompletion::AlreadyCompleted
        );
    }

    #[test]
    fn empty_modules_and_courses_report_zero() {
        let tracker = ProgressTracker::new(course(vec![vec![]]));
        assert_eq!(tracker.module_progress(ModuleId::new(1)), 0.0);
        assert_eq!(tracker.course_progress(), 0.0);
        assert!(!tracker.is_course_complete());
        assert_eq!(tracker.module_progress(ModuleId::new(42)), 0.0);
    }

    #[test]
    fn empty_module_is_skipped_when_unlocking() {
        let mut tracker = ProgressTracker::new(course(vec![
            vec![lesson(1, false)],
            vec![],
            vec![lesson(2, true)],
        ]));
        tracker.complete_lesson(LessonId::new(1));
        assert!(tracker.can_select(LessonId::new(2)));
    }

    #[test]
    fn course_complete_at_start_never_reports() {
        let mut tracker = ProgressTracker::new(course(vec![vec![
            lesson(1, false).with_completed(true),
        ]]));
        assert!(tracker.is_course_complete());
        assert_eq!(
            tracker.complete_lesson(LessonId::new(1)),
            LessonCompletion::AlreadyCompleted
        );
    }
}
