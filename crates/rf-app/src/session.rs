//! # Session Store
//!
//! Owns the [`Session`] and the durable token storage behind it. The two
//! are only ever written together: a token is saved to storage before it
//! becomes the in-memory session, and cleared from memory whenever storage
//! is cleared.

use rf_core::permissions::MUST_LOG_IN;
use rf_core::{AppError, ForumApi, Result, Session, TokenStore, User};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};

pub struct SessionStore {
    store: Box<dyn TokenStore>,
    session: Session,
}

impl SessionStore {
    /// Starts anonymous. Call [`SessionStore::restore`] to pick up a saved token.
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        Self { store, session: Session::anonymous() }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.session.bearer()
    }

    /// True only once the token has resolved to a user.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Loads the saved token, if any, and resolves it.
    pub async fn restore(&mut self, api: &dyn ForumApi) -> Result<Option<User>> {
        let saved = self.store.load().await.map_err(|e| AppError::Storage(e.to_string()))?;
        let Some(token) = saved else {
            debug!("no saved session");
            return Ok(None);
        };
        self.session = Session::resolving(SecretString::from(token));
        self.resolve_current_user(api).await.map(Some)
    }

    /// Exchanges credentials for a token and resolves it. The prior session
    /// is left exactly as it was unless every step succeeds.
    pub async fn login(
        &mut self,
        api: &dyn ForumApi,
        username: &str,
        password: &SecretString,
    ) -> Result<User> {
        let grant = api.issue_token(username, password.expose_secret()).await?;
        let user = api.current_user(&grant.access_token).await?;
        self.store
            .save(&grant.access_token)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        self.session = Session::authenticated(SecretString::from(grant.access_token), user.clone());
        info!(user_id = user.id, username = %user.username, "signed in");
        Ok(user)
    }

    /// Clears memory and storage. Safe to call when already signed out.
    pub async fn logout(&mut self) -> Result<()> {
        let had_token = self.session.token().is_some();
        self.session = Session::anonymous();
        self.store.clear().await.map_err(|e| AppError::Storage(e.to_string()))?;
        if had_token {
            info!("signed out");
        }
        Ok(())
    }

    /// Asks the backend who the held token belongs to. Any failure counts as
    /// an implicit logout.
    pub async fn resolve_current_user(&mut self, api: &dyn ForumApi) -> Result<User> {
        let Some(token) = std::mem::take(&mut self.session).into_token() else {
            return Err(AppError::Unauthorized(MUST_LOG_IN.to_string()));
        };
        self.session = Session::resolving(token);
        let resolved = match self.session.bearer() {
            Some(bearer) => api.current_user(bearer).await,
            None => return Err(AppError::Unauthorized(MUST_LOG_IN.to_string())),
        };

        match resolved {
            Ok(user) => {
                if let Some(token) = std::mem::take(&mut self.session).into_token() {
                    self.session = Session::authenticated(token, user.clone());
                }
                info!(user_id = user.id, "session resolved");
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "session could not be resolved, signing out");
                if let Err(storage) = self.logout().await {
                    error!(error = %storage, "could not clear the saved session");
                }
                Err(err.into())
            }
        }
    }
}
