//! Application-wide queue of ephemeral notifications with timed auto-dismissal.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle, time::Instant};
use tracing::{debug, warn};

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Published(Notification),
    Dismissed(NotificationId),
}

struct QueuedNotification {
    notification: Notification,
    timer: Option<JoinHandle<()>>,
}

struct NotificationQueue {
    next_id: AtomicU64,
    default_duration: Duration,
    entries: Mutex<Vec<QueuedNotification>>,
    events: broadcast::Sender<NotificationEvent>,
}

/// Cloneable handle to the shared notification queue.
#[derive(Clone)]
pub struct NotificationCenter {
    queue: Arc<NotificationQueue>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_NOTIFICATION_DURATION)
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            queue: Arc::new(NotificationQueue {
                next_id: AtomicU64::new(1),
                default_duration,
                entries: Mutex::new(Vec::new()),
                events,
            }),
        }
    }

    /// Publishes an error notification with the default lifetime.
    pub fn publish_error(&self, message: impl Into<String>) -> NotificationId {
        self.publish(message, NotificationKind::Error, self.queue.default_duration)
    }

    pub fn publish(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
    ) -> NotificationId {
        let id = NotificationId(self.queue.next_id.fetch_add(1, Ordering::Relaxed));
        let notification = Notification {
            id,
            message: message.into(),
            kind,
            created_at: Utc::now(),
        };

        // Queue first so a zero-length timer always finds its entry.
        self.entries().push(QueuedNotification {
            notification: notification.clone(),
            timer: None,
        });
        debug!(
            notification_id = id.0,
            kind = ?kind,
            duration_ms = duration.as_millis() as u64,
            "notifications: published"
        );
        let _ = self.queue.events.send(NotificationEvent::Published(notification));

        let Some(deadline) = Instant::now().checked_add(duration) else {
            debug!(
                notification_id = id.0,
                "notifications: duration out of range, entry stays until dismissed"
            );
            return id;
        };
        match Handle::try_current() {
            Ok(handle) => {
                let center = self.clone();
                let timer = handle.spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    center.expire(id);
                });
                if let Some(entry) = self
                    .entries()
                    .iter_mut()
                    .find(|entry| entry.notification.id == id)
                {
                    entry.timer = Some(timer);
                }
            }
            Err(_) => warn!(
                notification_id = id.0,
                "notifications: no runtime available, entry stays until dismissed"
            ),
        }

        id
    }

    /// Removes the notification if it is still queued. Returns whether anything was removed.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let Some(removed) = self.remove(id) else {
            return false;
        };
        if let Some(timer) = removed.timer {
            timer.abort();
        }
        true
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries()
            .iter()
            .map(|entry| entry.notification.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.queue.events.subscribe()
    }

    // Runs on the timer task itself, so the handle must not be aborted here.
    fn expire(&self, id: NotificationId) {
        if self.remove(id).is_some() {
            debug!(notification_id = id.0, "notifications: expired");
        }
    }

    fn remove(&self, id: NotificationId) -> Option<QueuedNotification> {
        let removed = {
            let mut entries = self.entries();
            let index = entries
                .iter()
                .position(|entry| entry.notification.id == id)?;
            entries.remove(index)
        };
        let _ = self.queue.events.send(NotificationEvent::Dismissed(id));
        Some(removed)
    }

    fn entries(&self) -> MutexGuard<'_, Vec<QueuedNotification>> {
        self.queue
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/notifications_tests.rs"]
mod tests;
