//! # Mutations
//!
//! Every create, edit, delete and admin change follows the same path:
//! local permission check, field validation, one backend call, then a
//! re-fetch of the screen the user lands on. A failure at any step leaves
//! the view as it was, including any open edit form and its draft.

use rf_core::permissions::{authorize, Action, MUST_LOG_IN};
use rf_core::validation;
use rf_core::{
    AppError, EditKind, EditTarget, Form, Id, Navigation, NewReply, Page, Registration, ReplyEdit,
    Result, Screen, Snapshot, ThreadDraft, User,
};
use secrecy::SecretString;
use tracing::{debug, error, info};

use crate::forum::Forum;

pub const SELECT_THREAD_FIRST: &str = "Please select a thread first.";
pub const NO_LONGER_AVAILABLE: &str = "That post is no longer available.";
pub const UNKNOWN_USER: &str = "That user is no longer listed.";

impl Forum {
    pub async fn login(&mut self, form: &Form) -> Result<()> {
        let checked = validation::credentials(form.get("username"), form.get("password"));
        let (username, password) = match checked {
            Ok(values) => values,
            Err(err) => return Err(self.reject(err)),
        };
        let password = SecretString::from(password.to_string());

        // A refused login is not a refused session: report it without
        // signing anyone out.
        let user = match self.session.login(self.api.as_ref(), &username, &password).await {
            Ok(user) => user,
            Err(err) => return Err(self.reject(err)),
        };
        self.notices.info(format!("Welcome, {}!", user.username));
        self.land(None, Navigation::Home).await
    }

    pub async fn register(&mut self, form: &Form) -> Result<()> {
        let checked = validation::credentials(form.get("username"), form.get("password"));
        let (username, password) = match checked {
            Ok(values) => values,
            Err(err) => return Err(self.reject(err)),
        };
        let registration = Registration { username, password: password.to_string() };

        match self.api.register(&registration).await {
            Ok(user) => {
                info!(user_id = user.id, "account registered");
                self.notices.info("Account created. You can now log in.");
                self.land(None, Navigation::Login).await
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    /// Always ends signed out on the thread list, even if the saved token
    /// could not be removed.
    pub async fn logout(&mut self) -> Result<()> {
        self.view.editing.clear();
        let cleared = self.session.logout().await;
        match &cleared {
            Ok(()) => self.notices.info("Logged out."),
            Err(err) => {
                error!(error = %err, "could not clear the saved session");
                self.notices.error(err.user_message());
            }
        }
        self.land(None, Navigation::Home).await?;
        cleared
    }

    pub async fn create_thread(&mut self, form: &Form) -> Result<()> {
        self.check(authorize(self.session.current_user(), Action::Create))?;
        let draft = match thread_draft(form) {
            Ok(draft) => draft,
            Err(err) => return Err(self.reject(err)),
        };

        let created = match self.session.bearer() {
            Some(token) => self.api.create_thread(token, &draft).await,
            None => return Err(self.reject(AppError::Unauthorized(MUST_LOG_IN.to_string()))),
        };
        match created {
            Ok(thread) => {
                info!(thread_id = thread.id, "thread created");
                self.notices.info("Thread created.");
                self.land(None, Navigation::Thread(thread.id)).await
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn create_reply(&mut self, thread_id: Id, form: &Form) -> Result<()> {
        self.check(authorize(self.session.current_user(), Action::Create))?;
        let on_thread = self.view.screen == Screen::ThreadDetail
            && self.view.selected_thread == Some(thread_id);
        if !on_thread {
            return Err(self.reject(AppError::Validation(SELECT_THREAD_FIRST.to_string())));
        }
        let reply = match validation::reply_text(form.get("text")) {
            Ok(text) => NewReply { thread_id, text },
            Err(err) => return Err(self.reject(err)),
        };

        let created = match self.session.bearer() {
            Some(token) => self.api.create_reply(token, &reply).await,
            None => return Err(self.reject(AppError::Unauthorized(MUST_LOG_IN.to_string()))),
        };
        match created {
            Ok(reply) => {
                info!(reply_id = reply.id, thread_id, "reply posted");
                self.notices.info("Reply posted.");
                self.land(None, Navigation::Thread(thread_id)).await
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    /// Opens the edit form for `target`, snapshotting what is on screen.
    /// Re-opening a form that is already open keeps its draft.
    pub fn begin_edit(&mut self, target: EditTarget) -> Result<()> {
        let found = match &self.page {
            Page::Thread(page) => page.owner_of(target).zip(page.snapshot(target)),
            _ => None,
        };
        let Some((owner_id, snapshot)) = found else {
            return Err(self.reject(AppError::Validation(NO_LONGER_AVAILABLE.to_string())));
        };
        self.check(authorize(self.session.current_user(), Action::Edit { owner_id }))?;

        if self.view.editing.begin(target, snapshot) {
            debug!(?target, "edit opened");
        }
        Ok(())
    }

    /// Closes the edit form and puts the snapshot back on screen. False if
    /// no form was open.
    pub fn cancel_edit(&mut self, target: EditTarget) -> bool {
        let Some(original) = self.view.editing.cancel(target) else {
            return false;
        };
        if let Page::Thread(page) = &mut self.page {
            page.restore(target, &original);
        }
        debug!(?target, "edit cancelled");
        true
    }

    pub async fn submit_edit(&mut self, target: EditTarget, form: &Form) -> Result<()> {
        let typed = match target.kind {
            EditKind::Thread => Snapshot::Thread {
                title: form.get("title").to_string(),
                text: form.get("text").to_string(),
            },
            EditKind::Reply => Snapshot::Reply { text: form.get("text").to_string() },
        };
        self.view.editing.update(target, typed);

        let owner_id = match &self.page {
            Page::Thread(page) => page.owner_of(target),
            _ => None,
        };
        let Some(owner_id) = owner_id else {
            return Err(self.reject(AppError::Validation(NO_LONGER_AVAILABLE.to_string())));
        };
        self.check(authorize(self.session.current_user(), Action::Edit { owner_id }))?;

        let edit = match target.kind {
            EditKind::Thread => thread_draft(form).map(Edit::Thread),
            EditKind::Reply => {
                validation::reply_text(form.get("text")).map(|text| Edit::Reply(ReplyEdit { text }))
            }
        };
        let edit = match edit {
            Ok(edit) => edit,
            Err(err) => return Err(self.reject(err)),
        };

        let saved = match (self.session.bearer(), &edit) {
            (Some(token), Edit::Thread(draft)) => {
                self.api.update_thread(token, target.id, draft).await.map(drop)
            }
            (Some(token), Edit::Reply(reply)) => {
                self.api.update_reply(token, target.id, reply).await.map(drop)
            }
            (None, _) => return Err(self.reject(AppError::Unauthorized(MUST_LOG_IN.to_string()))),
        };
        match saved {
            Ok(()) => {
                info!(?target, "post updated");
                self.notices.info(match target.kind {
                    EditKind::Thread => "Thread updated.",
                    EditKind::Reply => "Reply updated.",
                });
                let here = self.view.current();
                self.land(Some(target), here).await
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn delete_thread(&mut self, id: Id) -> Result<()> {
        let owner_id = match &self.page {
            Page::Thread(page) if page.thread.id == id => Some(page.thread.user_id),
            Page::Threads(threads) => threads.iter().find(|t| t.id == id).map(|t| t.user_id),
            _ => None,
        };
        let Some(owner_id) = owner_id else {
            return Err(self.reject(AppError::Validation(NO_LONGER_AVAILABLE.to_string())));
        };
        self.check(authorize(self.session.current_user(), Action::Delete { owner_id }))?;

        let deleted = match self.session.bearer() {
            Some(token) => self.api.delete_thread(token, id).await,
            None => return Err(self.reject(AppError::Unauthorized(MUST_LOG_IN.to_string()))),
        };
        match deleted {
            Ok(()) => {
                info!(thread_id = id, "thread deleted");
                self.notices.info("Thread deleted.");
                self.land(Some(EditTarget::thread(id)), Navigation::Home).await
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn delete_reply(&mut self, id: Id) -> Result<()> {
        let owner_id = match &self.page {
            Page::Thread(page) => page.reply(id).map(|r| r.user_id),
            _ => None,
        };
        let Some(owner_id) = owner_id else {
            return Err(self.reject(AppError::Validation(NO_LONGER_AVAILABLE.to_string())));
        };
        self.check(authorize(self.session.current_user(), Action::Delete { owner_id }))?;

        let deleted = match self.session.bearer() {
            Some(token) => self.api.delete_reply(token, id).await,
            None => return Err(self.reject(AppError::Unauthorized(MUST_LOG_IN.to_string()))),
        };
        match deleted {
            Ok(()) => {
                info!(reply_id = id, "reply deleted");
                self.notices.info("Reply deleted.");
                let here = self.view.current();
                self.land(Some(EditTarget::reply(id)), here).await
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn make_admin(&mut self, user_id: Id) -> Result<()> {
        let target = self.listed_user(user_id)?;
        let actor = self.session.current_user();
        let verdict = authorize(actor, Action::MakeAdmin { target: &target });
        self.check(verdict)?;

        let promoted = match self.session.bearer() {
            Some(token) => self.api.make_admin(token, user_id).await,
            None => return Err(self.reject(AppError::Unauthorized(MUST_LOG_IN.to_string()))),
        };
        match promoted {
            Ok(user) => {
                info!(user_id, "admin rights granted");
                self.notices.info(format!("{} is now an admin.", user.username));
                self.land(None, Navigation::Users).await
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn remove_admin(&mut self, user_id: Id) -> Result<()> {
        let target = self.listed_user(user_id)?;
        let actor = self.session.current_user();
        let verdict = authorize(actor, Action::RemoveAdmin { target: &target });
        self.check(verdict)?;

        let demoted = match self.session.bearer() {
            Some(token) => self.api.remove_admin(token, user_id).await,
            None => return Err(self.reject(AppError::Unauthorized(MUST_LOG_IN.to_string()))),
        };
        match demoted {
            Ok(user) => {
                info!(user_id, "admin rights removed");
                self.notices.info(format!("{} is no longer an admin.", user.username));
                self.land(None, Navigation::Users).await
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    fn listed_user(&mut self, user_id: Id) -> Result<User> {
        let found = match &self.page {
            Page::Users(users) => users.iter().find(|u| u.id == user_id).cloned(),
            _ => None,
        };
        found.ok_or_else(|| self.reject(AppError::Validation(UNKNOWN_USER.to_string())))
    }

    /// Reports a refused permission check.
    fn check(&mut self, verdict: Result<()>) -> Result<()> {
        verdict.map_err(|err| self.reject(err))
    }

    /// Closes the finished edit and loads where the user ends up.
    async fn land(&mut self, finished: Option<EditTarget>, to: Navigation) -> Result<()> {
        if let Some(target) = finished {
            self.view.editing.finish(target);
        }
        self.navigate(to).await
    }
}

enum Edit {
    Thread(ThreadDraft),
    Reply(ReplyEdit),
}

fn thread_draft(form: &Form) -> Result<ThreadDraft> {
    Ok(ThreadDraft {
        title: validation::title(form.get("title"))?,
        text: validation::thread_text(form.get("text"))?,
    })
}
