//! # Test doubles
//!
//! `FakeForum` is an in-memory backend that applies the server's ownership
//! and admin rules and records every request it receives, so tests can
//! assert on what went over the "wire". `MockTokenStore` comes from
//! `mockall` and is re-exported here.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Id, NewReply, Registration, Reply, ReplyEdit, Thread, ThreadDraft, TokenGrant, User,
};
use crate::traits::ForumApi;

pub use crate::traits::MockTokenStore;

const BAD_TOKEN: &str = "Could not validate credentials";

#[derive(Default)]
struct State {
    users: Vec<(User, String)>,
    tokens: BTreeMap<String, Id>,
    threads: Vec<Thread>,
    replies: Vec<Reply>,
    requests: Vec<String>,
    fail_next: Option<ApiError>,
    next_id: Id,
    clock: i64,
}

impl State {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn now(&mut self) -> NaiveDateTime {
        self.clock += 1;
        base_time() + Duration::minutes(self.clock)
    }

    fn user_for(&self, token: &str) -> ApiResult<User> {
        self.tokens
            .get(token)
            .and_then(|id| self.users.iter().find(|(u, _)| u.id == *id))
            .map(|(u, _)| u.clone())
            .ok_or_else(|| ApiError::AuthRejected(BAD_TOKEN.to_string()))
    }

    fn admin_for(&self, token: &str) -> ApiResult<User> {
        let user = self.user_for(token)?;
        if !user.is_admin {
            return Err(ApiError::PermissionDenied("Admin privileges required".to_string()));
        }
        Ok(user)
    }

    fn thread_index(&self, id: Id) -> ApiResult<usize> {
        self.threads
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ApiError::from_status(404, format!("Thread with ID={id} not found.")))
    }

    fn reply_index(&self, id: Id) -> ApiResult<usize> {
        self.replies
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ApiError::from_status(404, format!("Reply with ID={id} not found.")))
    }

    fn user_index(&self, id: Id) -> ApiResult<usize> {
        self.users
            .iter()
            .position(|(u, _)| u.id == id)
            .ok_or_else(|| ApiError::from_status(404, format!("User with ID={id} not found.")))
    }
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

fn non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        let detail = format!("{field}: String should have at least 1 character");
        return Err(ApiError::from_status(422, detail));
    }
    Ok(())
}

/// Shared in-memory backend. Clones observe the same state.
#[derive(Clone, Default)]
pub struct FakeForum {
    state: Arc<Mutex<State>>,
}

impl FakeForum {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Takes the queued failure, or logs the request and proceeds.
    fn enter(&self, request: &str) -> ApiResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.requests.push(request.to_string());
        let failure = state.fail_next.take();
        match failure {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }

    pub fn add_user(&self, username: &str, password: &str, is_admin: bool) -> User {
        let mut state = self.state();
        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            is_admin,
            created: state.now(),
        };
        state.users.push((user.clone(), password.to_string()));
        user
    }

    pub fn add_thread(&self, owner: Id, title: &str, text: &str) -> Thread {
        let mut state = self.state();
        let thread = Thread {
            id: state.next_id(),
            title: title.to_string(),
            text: text.to_string(),
            user_id: owner,
            created: state.now(),
            edited: false,
        };
        state.threads.push(thread.clone());
        thread
    }

    pub fn add_reply(&self, owner: Id, thread_id: Id, text: &str) -> Reply {
        let mut state = self.state();
        let reply = Reply {
            id: state.next_id(),
            thread_id,
            text: text.to_string(),
            user_id: owner,
            created: state.now(),
            edited: false,
        };
        state.replies.push(reply.clone());
        reply
    }

    /// Issues a token without going through `/token`.
    pub fn token_for(&self, user_id: Id) -> String {
        let mut state = self.state();
        let token = format!("token-{user_id}-{}", state.tokens.len());
        state.tokens.insert(token.clone(), user_id);
        token
    }

    /// Invalidates every issued token, as an expiry would.
    pub fn revoke_tokens(&self) {
        self.state().tokens.clear();
    }

    /// The next call fails with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.state().fail_next = Some(err);
    }

    /// Requests received so far, as `METHOD /path`.
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }

    pub fn thread(&self, id: Id) -> Option<Thread> {
        self.state().threads.iter().find(|t| t.id == id).cloned()
    }

    pub fn replies_of(&self, thread_id: Id) -> Vec<Reply> {
        self.state().replies.iter().filter(|r| r.thread_id == thread_id).cloned().collect()
    }

    pub fn user(&self, id: Id) -> Option<User> {
        self.state().users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone())
    }
}

#[async_trait]
impl ForumApi for FakeForum {
    async fn list_threads(&self) -> ApiResult<Vec<Thread>> {
        let state = self.enter("GET /threads/")?;
        let mut threads = state.threads.clone();
        threads.sort_by_key(|t| t.created);
        Ok(threads)
    }

    async fn get_thread(&self, id: Id) -> ApiResult<Thread> {
        let state = self.enter(&format!("GET /threads/{id}"))?;
        let index = state.thread_index(id)?;
        Ok(state.threads[index].clone())
    }

    async fn create_thread(&self, token: &str, thread: &ThreadDraft) -> ApiResult<Thread> {
        let mut state = self.enter("POST /threads/")?;
        let user = state.user_for(token)?;
        non_empty("title", &thread.title)?;
        non_empty("text", &thread.text)?;
        let created = Thread {
            id: state.next_id(),
            title: thread.title.clone(),
            text: thread.text.clone(),
            user_id: user.id,
            created: state.now(),
            edited: false,
        };
        state.threads.push(created.clone());
        Ok(created)
    }

    async fn update_thread(&self, token: &str, id: Id, thread: &ThreadDraft) -> ApiResult<Thread> {
        let mut state = self.enter(&format!("PUT /threads/{id}/edit"))?;
        let user = state.user_for(token)?;
        let index = state.thread_index(id)?;
        if state.threads[index].user_id != user.id {
            let detail = "Not authorized to edit this thread".to_string();
            return Err(ApiError::PermissionDenied(detail));
        }
        non_empty("title", &thread.title)?;
        non_empty("text", &thread.text)?;
        let stored = &mut state.threads[index];
        stored.title = thread.title.clone();
        stored.text = thread.text.clone();
        stored.edited = true;
        Ok(stored.clone())
    }

    async fn delete_thread(&self, token: &str, id: Id) -> ApiResult<()> {
        let mut state = self.enter(&format!("DELETE /threads/{id}"))?;
        state.admin_for(token)?;
        let index = state.thread_index(id)?;
        state.threads.remove(index);
        state.replies.retain(|r| r.thread_id != id);
        Ok(())
    }

    async fn list_replies(&self, thread_id: Id) -> ApiResult<Vec<Reply>> {
        let state = self.enter(&format!("GET /threads/{thread_id}/replies/"))?;
        state.thread_index(thread_id)?;
        Ok(state.replies.iter().filter(|r| r.thread_id == thread_id).cloned().collect())
    }

    async fn get_reply(&self, id: Id) -> ApiResult<Reply> {
        let state = self.enter(&format!("GET /replies/{id}"))?;
        let index = state.reply_index(id)?;
        Ok(state.replies[index].clone())
    }

    async fn create_reply(&self, token: &str, reply: &NewReply) -> ApiResult<Reply> {
        let mut state = self.enter("POST /replies/")?;
        let user = state.user_for(token)?;
        state.thread_index(reply.thread_id)?;
        non_empty("text", &reply.text)?;
        let created = Reply {
            id: state.next_id(),
            thread_id: reply.thread_id,
            text: reply.text.clone(),
            user_id: user.id,
            created: state.now(),
            edited: false,
        };
        state.replies.push(created.clone());
        Ok(created)
    }

    async fn update_reply(&self, token: &str, id: Id, reply: &ReplyEdit) -> ApiResult<Reply> {
        let mut state = self.enter(&format!("PUT /replies/{id}/edit"))?;
        let user = state.user_for(token)?;
        let index = state.reply_index(id)?;
        if state.replies[index].user_id != user.id {
            return Err(ApiError::PermissionDenied("Not authorized to edit this reply".to_string()));
        }
        non_empty("text", &reply.text)?;
        let stored = &mut state.replies[index];
        stored.text = reply.text.clone();
        stored.edited = true;
        Ok(stored.clone())
    }

    async fn delete_reply(&self, token: &str, id: Id) -> ApiResult<()> {
        let mut state = self.enter(&format!("DELETE /replies/{id}"))?;
        state.admin_for(token)?;
        let index = state.reply_index(id)?;
        state.replies.remove(index);
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> ApiResult<User> {
        let mut state = self.enter("POST /register")?;
        if state.users.iter().any(|(u, _)| u.username == registration.username) {
            return Err(ApiError::from_status(400, "Username already registered"));
        }
        let user = User {
            id: state.next_id(),
            username: registration.username.clone(),
            is_admin: false,
            created: state.now(),
        };
        state.users.push((user.clone(), registration.password.clone()));
        Ok(user)
    }

    async fn issue_token(&self, username: &str, password: &str) -> ApiResult<TokenGrant> {
        let mut state = self.enter("POST /token")?;
        let user_id = state
            .users
            .iter()
            .find(|(u, p)| u.username == username && p == password)
            .map(|(u, _)| u.id)
            .ok_or_else(|| ApiError::AuthRejected("Incorrect username or password".to_string()))?;
        let access_token = format!("token-{user_id}-{}", state.tokens.len());
        state.tokens.insert(access_token.clone(), user_id);
        Ok(TokenGrant { access_token, token_type: "bearer".to_string() })
    }

    async fn current_user(&self, token: &str) -> ApiResult<User> {
        let state = self.enter("GET /users/me")?;
        state.user_for(token)
    }

    async fn list_users(&self, _token: Option<&str>) -> ApiResult<Vec<User>> {
        let state = self.enter("GET /users/")?;
        Ok(state.users.iter().map(|(u, _)| u.clone()).collect())
    }

    async fn make_admin(&self, token: &str, user_id: Id) -> ApiResult<User> {
        let mut state = self.enter(&format!("PUT /users/{user_id}/make-admin"))?;
        state.admin_for(token)?;
        let index = state.user_index(user_id)?;
        state.users[index].0.is_admin = true;
        Ok(state.users[index].0.clone())
    }

    async fn remove_admin(&self, token: &str, user_id: Id) -> ApiResult<User> {
        let mut state = self.enter(&format!("PUT /users/{user_id}/remove-admin"))?;
        state.admin_for(token)?;
        let index = state.user_index(user_id)?;
        state.users[index].0.is_admin = false;
        Ok(state.users[index].0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn owner_rule_is_enforced() {
        let forum = FakeForum::new();
        let alice = forum.add_user("alice", "pw", false);
        let bob = forum.add_user("bob", "pw", false);
        let thread = forum.add_thread(alice.id, "A", "b");

        let bob_token = forum.token_for(bob.id);
        let draft = ThreadDraft { title: "X".into(), text: "y".into() };
        let err = forum.update_thread(&bob_token, thread.id, &draft).await.unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));

        let alice_token = forum.token_for(alice.id);
        let updated = forum.update_thread(&alice_token, thread.id, &draft).await.unwrap();
        assert!(updated.edited);
    }

    #[tokio::test]
    async fn requests_are_logged_and_failures_injected() {
        let forum = FakeForum::new();
        forum.fail_next(ApiError::Network("down".into()));
        assert!(forum.list_threads().await.is_err());
        assert!(forum.list_threads().await.is_ok());
        assert_eq!(forum.requests(), vec!["GET /threads/", "GET /threads/"]);
    }
}
