//! # Domain Models
//!
//! The entities the forum backend hands out. The client never keeps a
//! canonical collection of these: every screen fetches fresh copies and
//! drops them when the screen changes.

pub use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Backend identifiers are plain positive integers.
pub type Id = i64;

/// A registered account as reported by `/users/` and `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    /// Flipped server-side by the make-admin / remove-admin endpoints only.
    #[serde(default)]
    pub is_admin: bool,
    pub created: NaiveDateTime,
}

/// A discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: Id,
    pub title: String,
    pub text: String,
    /// Owner of the thread.
    pub user_id: Id,
    pub created: NaiveDateTime,
    #[serde(default)]
    pub edited: bool,
}

/// A reply, always scoped under its parent thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Id,
    pub thread_id: Id,
    pub text: String,
    /// Owner of the reply.
    pub user_id: Id,
    pub created: NaiveDateTime,
    #[serde(default)]
    pub edited: bool,
}

/// Body of `POST /threads/` and `PUT /threads/{id}/edit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDraft {
    pub title: String,
    pub text: String,
}

/// Body of `POST /replies/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReply {
    pub thread_id: Id,
    pub text: String,
}

/// Body of `PUT /replies/{id}/edit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyEdit {
    pub text: String,
}

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

/// Response of `POST /token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

/// Formatting used wherever a timestamp is shown.
pub trait TimestampExt {
    fn display_time(&self) -> String;
}

impl TimestampExt for NaiveDateTime {
    fn display_time(&self) -> String {
        self.format("%Y-%m-%d %H:%M").to_string()
    }
}
