use portal_core::model::CourseId;
use tokio::sync::mpsc;

/// Receives the player's outward notifications.
///
/// Completion may be delivered from a runtime task, hence `Send + Sync`.
pub trait PlayerObserver: Send + Sync {
    fn on_back(&self, _course_id: CourseId) {}

    fn on_course_complete(&self, _course_id: CourseId) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PlayerObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Back(CourseId),
    CourseCompleted(CourseId),
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl ChannelObserver {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: PlayerEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl PlayerObserver for ChannelObserver {
    fn on_back(&self, course_id: CourseId) {
        self.send(PlayerEvent::Back(course_id));
    }

    fn on_course_complete(&self, course_id: CourseId) {
        self.send(PlayerEvent::CourseCompleted(course_id));
    }
}
