//! Transient messages shown to the user.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Error, message: message.into() }
    }
}
