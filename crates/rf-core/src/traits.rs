//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{
    Id, NewReply, Registration, Reply, ReplyEdit, Thread, ThreadDraft, TokenGrant, User,
};

/// The forum backend, one method per endpoint.
///
/// Implementations must not touch session or view state: the token is
/// always passed in explicitly by the caller.
#[async_trait]
pub trait ForumApi: Send + Sync {
    // Thread Operations
    async fn list_threads(&self) -> ApiResult<Vec<Thread>>;
    async fn get_thread(&self, id: Id) -> ApiResult<Thread>;
    async fn create_thread(&self, token: &str, thread: &ThreadDraft) -> ApiResult<Thread>;
    async fn update_thread(&self, token: &str, id: Id, thread: &ThreadDraft) -> ApiResult<Thread>;
    async fn delete_thread(&self, token: &str, id: Id) -> ApiResult<()>;

    // Reply Operations
    async fn list_replies(&self, thread_id: Id) -> ApiResult<Vec<Reply>>;
    async fn get_reply(&self, id: Id) -> ApiResult<Reply>;
    async fn create_reply(&self, token: &str, reply: &NewReply) -> ApiResult<Reply>;
    async fn update_reply(&self, token: &str, id: Id, reply: &ReplyEdit) -> ApiResult<Reply>;
    async fn delete_reply(&self, token: &str, id: Id) -> ApiResult<()>;

    // Account Operations
    async fn register(&self, registration: &Registration) -> ApiResult<User>;
    /// Exchanges credentials for a bearer token (form-encoded request).
    async fn issue_token(&self, username: &str, password: &str) -> ApiResult<TokenGrant>;
    /// Resolves the identity behind a token.
    async fn current_user(&self, token: &str) -> ApiResult<User>;
    /// Lists accounts. The token is attached when the caller has one.
    async fn list_users(&self, token: Option<&str>) -> ApiResult<Vec<User>>;
    async fn make_admin(&self, token: &str, user_id: Id) -> ApiResult<User>;
    async fn remove_admin(&self, token: &str, user_id: Id) -> ApiResult<User>;
}

/// Durable client-side storage for the single active bearer token.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    async fn load(&self) -> anyhow::Result<Option<String>>;
    /// Replaces the stored token.
    async fn save(&self, token: &str) -> anyhow::Result<()>;
    /// Removes the stored token. Clearing an empty store succeeds.
    async fn clear(&self) -> anyhow::Result<()>;
}
