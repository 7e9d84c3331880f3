//! # Session
//!
//! Client-held authentication state. The constructors are the only way to
//! build one, so a resolved user can never exist without the token it was
//! resolved from.

use secrecy::{ExposeSecret, SecretString};

use crate::models::User;

/// Where identity resolution stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No token.
    Anonymous,
    /// A token is held but `/users/me` has not confirmed it yet.
    Resolving,
    /// The token resolved to this user.
    Authenticated(User),
}

/// Token plus resolution status.
#[derive(Debug)]
pub struct Session {
    token: Option<SecretString>,
    status: SessionStatus,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None, status: SessionStatus::Anonymous }
    }

    pub fn resolving(token: SecretString) -> Self {
        Self { token: Some(token), status: SessionStatus::Resolving }
    }

    pub fn authenticated(token: SecretString, user: User) -> Self {
        Self { token: Some(token), status: SessionStatus::Authenticated(user) }
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Raw token for the `Authorization` header.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret())
    }

    /// Gives up the token, dropping the resolved identity with it.
    pub fn into_token(self) -> Option<SecretString> {
        self.token
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// The resolved identity. `None` while resolving.
    pub fn current_user(&self) -> Option<&User> {
        match &self.status {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// A pending resolution counts as not authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Authenticated(_))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}
