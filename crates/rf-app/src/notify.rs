//! Single-slot transient notifications.

use std::time::{Duration, Instant};

use rf_core::Notification;
use tracing::debug;

struct Slot {
    notification: Notification,
    expires_at: Instant,
}

/// Holds at most one notification. A new one replaces the old one and
/// restarts the timer.
pub struct Notifier {
    ttl: Duration,
    slot: Option<Slot>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn show(&mut self, notification: Notification) {
        self.show_at(notification, Instant::now());
    }

    pub fn show_at(&mut self, notification: Notification, now: Instant) {
        debug!(kind = ?notification.kind, replaced = self.slot.is_some(), "notification shown");
        self.slot = Some(Slot { notification, expires_at: now + self.ttl });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.show(Notification::info(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(Notification::error(message));
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current_at(Instant::now())
    }

    /// The notification still visible at `now`.
    pub fn current_at(&self, now: Instant) -> Option<&Notification> {
        self.slot.as_ref().filter(|s| now < s.expires_at).map(|s| &s.notification)
    }

    /// When the visible notification disappears.
    pub fn deadline(&self) -> Option<Instant> {
        self.slot.as_ref().map(|s| s.expires_at)
    }

    /// Drops an expired notification. Returns true if one was dropped, which
    /// means the view needs a re-render.
    pub fn expire_at(&mut self, now: Instant) -> bool {
        match &self.slot {
            Some(slot) if now >= slot.expires_at => {
                self.slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn dismiss(&mut self) {
        self.slot = None;
    }
}
