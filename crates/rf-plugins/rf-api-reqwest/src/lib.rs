//! # rf-api-reqwest
//! rusty-forum/crates/rf-plugins/rf-api-reqwest/src/lib.rs
//! `ForumApi` over HTTP. JSON bodies, bearer tokens in the `Authorization`
//! header, and the form-encoded `/token` exchange.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use rf_core::error::{ApiError, ApiResult};
use rf_core::models::{
    Id, NewReply, Registration, Reply, ReplyEdit, Thread, ThreadDraft, TokenGrant, User,
};
use rf_core::traits::ForumApi;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpForumApi {
    base_url: String,
    http: Client,
}

impl HttpForumApi {
    /// `base_url` is the backend root, e.g. `http://localhost:8000`.
    /// Requests carry no client-side timeout.
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("rusty-forum/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.dispatch(request).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<()> {
        self.dispatch(request).await.map(drop)
    }

    async fn dispatch(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            ApiError::Network(e.to_string())
        })?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "response");
        if status.is_success() {
            return Ok(response);
        }

        let fallback = status.canonical_reason().unwrap_or("Request failed").to_string();
        let body = response.text().await.unwrap_or_default();
        let detail = parse_detail(&body).unwrap_or(fallback);
        Err(ApiError::from_status(status.as_u16(), detail))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Detail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Issues(Vec<Issue>),
}

#[derive(Deserialize)]
struct Issue {
    msg: String,
}

/// Extracts `detail` from an error body. Field-level validation errors
/// arrive as a list and are joined into one line.
pub fn parse_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let detail = match parsed.detail {
        Detail::Message(message) => message,
        Detail::Issues(issues) => issues.into_iter().map(|i| i.msg).collect::<Vec<_>>().join("; "),
    };
    (!detail.trim().is_empty()).then_some(detail)
}

#[async_trait]
impl ForumApi for HttpForumApi {
    async fn list_threads(&self) -> ApiResult<Vec<Thread>> {
        self.fetch(self.http.get(self.url("/threads/"))).await
    }

    async fn get_thread(&self, id: Id) -> ApiResult<Thread> {
        self.fetch(self.http.get(self.url(&format!("/threads/{id}")))).await
    }

    async fn create_thread(&self, token: &str, thread: &ThreadDraft) -> ApiResult<Thread> {
        let request = self.http.post(self.url("/threads/")).bearer_auth(token).json(thread);
        self.fetch(request).await
    }

    async fn update_thread(&self, token: &str, id: Id, thread: &ThreadDraft) -> ApiResult<Thread> {
        let request = self
            .http
            .put(self.url(&format!("/threads/{id}/edit")))
            .bearer_auth(token)
            .json(thread);
        self.fetch(request).await
    }

    async fn delete_thread(&self, token: &str, id: Id) -> ApiResult<()> {
        let request = self.http.delete(self.url(&format!("/threads/{id}"))).bearer_auth(token);
        self.execute(request).await
    }

    async fn list_replies(&self, thread_id: Id) -> ApiResult<Vec<Reply>> {
        self.fetch(self.http.get(self.url(&format!("/threads/{thread_id}/replies/")))).await
    }

    async fn get_reply(&self, id: Id) -> ApiResult<Reply> {
        self.fetch(self.http.get(self.url(&format!("/replies/{id}")))).await
    }

    async fn create_reply(&self, token: &str, reply: &NewReply) -> ApiResult<Reply> {
        let request = self.http.post(self.url("/replies/")).bearer_auth(token).json(reply);
        self.fetch(request).await
    }

    async fn update_reply(&self, token: &str, id: Id, reply: &ReplyEdit) -> ApiResult<Reply> {
        let request = self
            .http
            .put(self.url(&format!("/replies/{id}/edit")))
            .bearer_auth(token)
            .json(reply);
        self.fetch(request).await
    }

    async fn delete_reply(&self, token: &str, id: Id) -> ApiResult<()> {
        let request = self.http.delete(self.url(&format!("/replies/{id}"))).bearer_auth(token);
        self.execute(request).await
    }

    async fn register(&self, registration: &Registration) -> ApiResult<User> {
        self.fetch(self.http.post(self.url("/register")).json(registration)).await
    }

    async fn issue_token(&self, username: &str, password: &str) -> ApiResult<TokenGrant> {
        let request = self
            .http
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)]);
        self.fetch(request).await
    }

    async fn current_user(&self, token: &str) -> ApiResult<User> {
        self.fetch(self.http.get(self.url("/users/me")).bearer_auth(token)).await
    }

    async fn list_users(&self, token: Option<&str>) -> ApiResult<Vec<User>> {
        let mut request = self.http.get(self.url("/users/"));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.fetch(request).await
    }

    async fn make_admin(&self, token: &str, user_id: Id) -> ApiResult<User> {
        let request = self
            .http
            .put(self.url(&format!("/users/{user_id}/make-admin")))
            .bearer_auth(token);
        self.fetch(request).await
    }

    async fn remove_admin(&self, token: &str, user_id: Id) -> ApiResult<User> {
        let request = self
            .http
            .put(self.url(&format!("/users/{user_id}/remove-admin")))
            .bearer_auth(token);
        self.fetch(request).await
    }
}
