//! # Notification Queue
//!
//! Ephemeral toasts. Each entry removes itself after the queue's TTL unless it
//! is dismissed first. Expiry timers only hold a weak reference to the queue,
//! so a timer that fires after a manual dismissal, a `clear_all_notifications`
//! or after the queue was dropped does nothing.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use rf_core::error::{FeedError, Result};
use rf_core::models::{Notification, NotificationId, NotificationKind};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

struct QueueInner {
    ttl: Duration,
    entries: watch::Sender<Vec<Notification>>,
}

impl QueueInner {
    fn remove(&self, id: NotificationId) -> bool {
        self.entries.send_if_modified(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            entries.len() != before
        })
    }
}

#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<QueueInner>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self { inner: Arc::new(QueueInner { ttl, entries }) }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Appends a notification and schedules its expiry.
    ///
    /// Fails with [`FeedError::RuntimeUnavailable`] when called outside a
    /// tokio runtime, before anything is queued.
    pub fn add_notification(&self, kind: NotificationKind, message: impl Into<String>) -> Result<NotificationId> {
        let runtime = Handle::try_current()
            .map_err(|_| FeedError::RuntimeUnavailable("NotificationQueue::add_notification"))?;

        let notification = Notification {
            id: NotificationId::generate(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            is_visible: true,
        };
        let id = notification.id;
        debug!(%id, ?kind, text = %notification.message, "notification queued");
        self.inner.entries.send_modify(|entries| entries.push(notification));

        let queue: Weak<QueueInner> = Arc::downgrade(&self.inner);
        let ttl = self.inner.ttl;
        runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(queue) = queue.upgrade() {
                if queue.remove(id) {
                    debug!(%id, "notification expired");
                }
            }
        });

        Ok(id)
    }

    /// Removes the entry with `id`. Returns `false` if it was already gone.
    pub fn remove_notification(&self, id: NotificationId) -> bool {
        self.inner.remove(id)
    }

    /// Empties the queue. Pending expiry timers are left to fire as no-ops.
    pub fn clear_all_notifications(&self) {
        self.inner.entries.send_if_modified(|entries| {
            let had_entries = !entries.is_empty();
            entries.clear();
            had_entries
        });
    }

    /// Current entries, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.entries.subscribe()
    }
}
