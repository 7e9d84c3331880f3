//! # Forum
//!
//! The client's view model. It owns the session, the view state, the data
//! of the active screen and the notification slot. Every user intent goes
//! through [`Forum::dispatch`]; every screen comes out of [`Forum::render`].
//!
//! A navigation only takes effect once its data has loaded, so a failed
//! fetch leaves the previous screen on display.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rf_core::{
    AppError, EditTarget, Form, ForumApi, Id, Navigation, Notification, Page, Result, Session,
    Snapshot, ThreadPage, TokenStore, UiAction, User, ViewState,
};
use rf_ui::{RenderContext, Rendered};
use tracing::{debug, error, info, warn};

use crate::notify::Notifier;
use crate::session::SessionStore;

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

pub struct Forum {
    pub(crate) api: Box<dyn ForumApi>,
    pub(crate) session: SessionStore,
    pub(crate) view: ViewState,
    pub(crate) page: Page,
    pub(crate) notices: Notifier,
}

impl Forum {
    pub fn new(api: Box<dyn ForumApi>, tokens: Box<dyn TokenStore>, notice_ttl: Duration) -> Self {
        Self {
            api,
            session: SessionStore::new(tokens),
            view: ViewState::default(),
            page: Page::Empty,
            notices: Notifier::new(notice_ttl),
        }
    }

    /// Restores a saved session, then loads the thread list.
    pub async fn start(&mut self) -> Result<()> {
        match self.session.restore(self.api.as_ref()).await {
            Ok(Some(user)) => info!(user_id = user.id, "restored saved session"),
            Ok(None) => {}
            Err(err) if err.is_auth_rejected() => self.notices.error(SESSION_EXPIRED),
            Err(err) => {
                warn!(error = %err, "could not restore saved session");
                self.notices.error(err.user_message());
            }
        }
        self.navigate(Navigation::Home).await
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn session(&self) -> &Session {
        self.session.session()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notices.current()
    }

    /// When the visible notification expires, if there is one.
    pub fn notification_deadline(&self) -> Option<Instant> {
        self.notices.deadline()
    }

    /// Drops an expired notification. True means the screen changed.
    pub fn tick(&mut self) -> bool {
        self.notices.expire_at(Instant::now())
    }

    /// Renders the active screen from the current state.
    pub fn render(&self) -> Result<Rendered> {
        let ctx = RenderContext {
            view: &self.view,
            page: &self.page,
            session: self.session.session(),
            notification: self.notices.current(),
        };
        rf_ui::render(&ctx).map_err(|e| AppError::Render(e.to_string()))
    }

    /// Routes one user intent. Failures have already been reported to the
    /// notification slot when this returns.
    pub async fn dispatch(&mut self, action: UiAction, form: &Form) -> Result<()> {
        debug!(?action, "dispatch");
        match action {
            UiAction::Navigate(to) => self.navigate(to).await,
            UiAction::Logout => self.logout().await,
            UiAction::SubmitLogin => self.login(form).await,
            UiAction::SubmitRegister => self.register(form).await,
            UiAction::SubmitThread => self.create_thread(form).await,
            UiAction::SubmitReply { thread_id } => self.create_reply(thread_id, form).await,
            UiAction::BeginEdit(target) => self.begin_edit(target),
            UiAction::SubmitEdit(target) => self.submit_edit(target, form).await,
            UiAction::CancelEdit(target) => {
                self.cancel_edit(target);
                Ok(())
            }
            UiAction::DeleteThread(id) => self.delete_thread(id).await,
            UiAction::DeleteReply(id) => self.delete_reply(id).await,
            UiAction::MakeAdmin(user_id) => self.make_admin(user_id).await,
            UiAction::RemoveAdmin(user_id) => self.remove_admin(user_id).await,
        }
    }

    /// Fetches the data for `to` and switches to it. On failure the current
    /// screen stays as it was.
    pub async fn navigate(&mut self, to: Navigation) -> Result<()> {
        match self.load(to).await {
            Ok(page) => {
                self.enter(to, page);
                Ok(())
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    /// Re-fetches the active screen.
    pub async fn refresh(&mut self) -> Result<()> {
        let current = self.view.current();
        self.navigate(current).await
    }

    /// Replaces the in-progress content of an open edit form.
    pub fn update_draft(&mut self, target: EditTarget, current: Snapshot) -> bool {
        self.view.editing.update(target, current)
    }

    async fn load(&self, to: Navigation) -> Result<Page> {
        let page = match to {
            Navigation::Home => Page::Threads(self.api.list_threads().await?),
            Navigation::Thread(id) => Page::Thread(self.load_thread(id).await?),
            Navigation::Users => Page::Users(self.api.list_users(self.session.bearer()).await?),
            Navigation::Register | Navigation::Login | Navigation::CreateThread => Page::Form,
        };
        Ok(page)
    }

    async fn load_thread(&self, id: Id) -> Result<ThreadPage> {
        let thread = self.api.get_thread(id).await?;
        let replies = self.api.list_replies(id).await?;

        // Author names are decoration; the page renders without them.
        let authors = match self.api.list_users(self.session.bearer()).await {
            Ok(users) => users
                .into_iter()
                .filter(|u| u.id == thread.user_id || replies.iter().any(|r| r.user_id == u.id))
                .map(|u| (u.id, u))
                .collect(),
            Err(err) => {
                warn!(error = %err, thread_id = id, "could not load author names");
                BTreeMap::new()
            }
        };
        Ok(ThreadPage { thread, replies, authors })
    }

    fn enter(&mut self, to: Navigation, page: Page) {
        if self.view.current() == to {
            if let Page::Thread(fresh) = &page {
                self.view.editing.retain(|target| fresh.contains(target));
            }
        } else {
            self.view.editing.clear();
        }
        self.view.screen = to.screen();
        self.view.selected_thread = match to {
            Navigation::Thread(id) => Some(id),
            _ => None,
        };
        self.page = page;
        debug!(screen = ?self.view.screen, "screen loaded");
    }

    /// Reports `err` to the notification slot. A refused token also signs
    /// the user out and returns to the thread list. A 401 on a request that
    /// carried no token is reported like any other rejection.
    pub(crate) async fn fail(&mut self, err: AppError) -> AppError {
        if !err.is_auth_rejected() || self.session.bearer().is_none() {
            self.reject(err)
        } else {
            warn!("backend refused the session token, signing out");
            if let Err(storage) = self.session.logout().await {
                error!(error = %storage, "could not clear the saved session");
            }
            self.view.editing.clear();
            match self.load(Navigation::Home).await {
                Ok(page) => self.enter(Navigation::Home, page),
                Err(reload) => warn!(error = %reload, "could not reload threads after sign-out"),
            }
            self.notices.error(SESSION_EXPIRED);
            err
        }
    }

    /// Reports `err` without touching the session.
    pub(crate) fn reject(&mut self, err: AppError) -> AppError {
        debug!(error = %err, "action failed");
        self.notices.error(err.user_message());
        err
    }
}
