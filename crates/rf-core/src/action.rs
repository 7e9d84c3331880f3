//! User intents bound to rendered controls, and the form values that come
//! with them.

use std::collections::BTreeMap;

use crate::models::Id;
use crate::view::{EditTarget, Navigation};

/// What a rendered control does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Navigate(Navigation),
    Logout,
    SubmitLogin,
    SubmitRegister,
    SubmitThread,
    SubmitReply { thread_id: Id },
    BeginEdit(EditTarget),
    SubmitEdit(EditTarget),
    CancelEdit(EditTarget),
    DeleteThread(Id),
    DeleteReply(Id),
    MakeAdmin(Id),
    RemoveAdmin(Id),
}

impl UiAction {
    /// Form fields the control submits.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::SubmitLogin | Self::SubmitRegister => &["username", "password"],
            Self::SubmitThread => &["title", "text"],
            Self::SubmitReply { .. } => &["text"],
            Self::SubmitEdit(target) => match target.kind {
                crate::view::EditKind::Thread => &["title", "text"],
                crate::view::EditKind::Reply => &["text"],
            },
            _ => &[],
        }
    }
}

/// Named form values submitted with an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    values: BTreeMap<String, String>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Missing fields read as empty.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }
}
