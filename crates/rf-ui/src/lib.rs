//! # rf-ui
//!
//! Declarative rendering: `render(context)` turns the current view state
//! into markup plus the table of controls it contains. The permission
//! deriver decides which controls make it into the table; nothing else is
//! bound, so a control that is not rendered cannot be activated.

use askama::Template;
use rf_core::models::{Id, TimestampExt, Reply, Thread, User};
use rf_core::permissions::{admin_controls_for, controls_for};
use rf_core::{
    EditKind, EditTarget, Navigation, Notification, NotificationKind, Page, Screen, Session,
    SessionStatus, Snapshot, ThreadPage, UiAction, ViewState,
};

/// Everything a render reads. A snapshot valid for the duration of one call.
pub struct RenderContext<'a> {
    pub view: &'a ViewState,
    pub page: &'a Page,
    pub session: &'a Session,
    pub notification: Option<&'a Notification>,
}

/// A control id and the action it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub control: String,
    pub action: UiAction,
}

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub markup: String,
    pub bindings: Vec<Binding>,
}

impl Rendered {
    /// The action bound to `control`, if that control was rendered.
    pub fn action(&self, control: &str) -> Option<UiAction> {
        self.bindings.iter().find(|b| b.control == control).map(|b| b.action)
    }

    pub fn has_control(&self, control: &str) -> bool {
        self.action(control).is_some()
    }
}

/// Renders the active screen.
pub fn render(ctx: &RenderContext<'_>) -> Result<Rendered, askama::Error> {
    let mut table = Table::default();
    let chrome = chrome(ctx, &mut table);
    let user = ctx.session.current_user();

    let markup = match (ctx.view.screen, ctx.page) {
        (Screen::Home, Page::Threads(threads)) => home(chrome, threads, user, &mut table).render()?,
        (Screen::ThreadDetail, Page::Thread(page)) => {
            thread_detail(chrome, page, ctx.view, user, &mut table).render()?
        }
        (Screen::Users, Page::Users(users)) => {
            users_page(chrome, users, user, &mut table).render()?
        }
        (Screen::Login, _) => {
            let submit = table.bind("login".to_string(), UiAction::SubmitLogin);
            LoginTemplate { chrome, submit }.render()?
        }
        (Screen::Register, _) => {
            let submit = table.bind("register".to_string(), UiAction::SubmitRegister);
            RegisterTemplate { chrome, submit }.render()?
        }
        (Screen::CreateThread, _) => {
            let submit =
                user.map(|_| table.bind("create-thread".to_string(), UiAction::SubmitThread));
            CreateThreadTemplate {
                chrome,
                can_submit: submit.is_some(),
                submit: submit.unwrap_or_default(),
            }
            .render()?
        }
        _ => LoadingTemplate { chrome }.render()?,
    };

    Ok(Rendered { markup, bindings: table.bindings })
}

#[derive(Default)]
struct Table {
    bindings: Vec<Binding>,
}

impl Table {
    fn bind(&mut self, control: String, action: UiAction) -> String {
        self.bindings.push(Binding { control: control.clone(), action });
        control
    }

    fn control(&mut self, control: String, label: &str, action: UiAction) -> ControlRow {
        ControlRow { control: self.bind(control, action), label: label.to_string() }
    }
}

pub struct ControlRow {
    pub control: String,
    pub label: String,
}

pub struct Chrome {
    pub user_line: String,
    pub nav: Vec<ControlRow>,
    pub has_notice: bool,
    pub notice: String,
}

fn chrome(ctx: &RenderContext<'_>, table: &mut Table) -> Chrome {
    let mut nav = vec![
        table.control("nav-home".into(), "Home", UiAction::Navigate(Navigation::Home)),
        table.control("nav-users".into(), "Users", UiAction::Navigate(Navigation::Users)),
    ];
    let user_line = match ctx.session.status() {
        SessionStatus::Authenticated(user) => {
            nav.push(table.control("logout".into(), "Log out", UiAction::Logout));
            if user.is_admin {
                format!("signed in as {} (admin)", user.username)
            } else {
                format!("signed in as {}", user.username)
            }
        }
        status => {
            let login = UiAction::Navigate(Navigation::Login);
            let register = UiAction::Navigate(Navigation::Register);
            nav.push(table.control("nav-login".into(), "Log in", login));
            nav.push(table.control("nav-register".into(), "Register", register));
            if *status == SessionStatus::Resolving {
                "signing in...".to_string()
            } else {
                "not signed in".to_string()
            }
        }
    };
    let notice = ctx.notification.map(|n| match n.kind {
        NotificationKind::Info => format!("* {}", n.message),
        NotificationKind::Error => format!("! {}", n.message),
    });
    Chrome { user_line, nav, has_notice: notice.is_some(), notice: notice.unwrap_or_default() }
}

pub struct ThreadRow {
    pub control: String,
    pub title: String,
    pub text: String,
    pub created: String,
    pub edited: bool,
}

#[derive(Template)]
#[template(path = "home.txt")]
struct HomeTemplate {
    chrome: Chrome,
    can_create: bool,
    new_control: String,
    threads: Vec<ThreadRow>,
}

fn home(
    chrome: Chrome,
    threads: &[Thread],
    user: Option<&User>,
    table: &mut Table,
) -> HomeTemplate {
    let new_control = user.map(|_| {
        table.bind("new-thread".to_string(), UiAction::Navigate(Navigation::CreateThread))
    });
    let threads = threads
        .iter()
        .map(|t| ThreadRow {
            control: table
                .bind(format!("thread-{}", t.id), UiAction::Navigate(Navigation::Thread(t.id))),
            title: t.title.clone(),
            text: t.text.clone(),
            created: t.created.display_time(),
            edited: t.edited,
        })
        .collect();
    HomeTemplate {
        chrome,
        can_create: new_control.is_some(),
        new_control: new_control.unwrap_or_default(),
        threads,
    }
}

pub struct EditForm {
    pub title: String,
    pub text: String,
    pub controls: Vec<ControlRow>,
}

pub struct PostBlock {
    pub id: Id,
    pub title: String,
    pub text: String,
    pub author: String,
    pub created: String,
    pub edited: bool,
    pub form: Option<EditForm>,
    pub controls: Vec<ControlRow>,
}

#[derive(Template)]
#[template(path = "thread.txt")]
struct ThreadTemplate {
    chrome: Chrome,
    thread: PostBlock,
    replies: Vec<PostBlock>,
    can_reply: bool,
    reply_control: String,
}

fn thread_detail(
    chrome: Chrome,
    page: &ThreadPage,
    view: &ViewState,
    user: Option<&User>,
    table: &mut Table,
) -> ThreadTemplate {
    let thread = thread_block(page, view, user, table);
    let replies = page.replies.iter().map(|r| reply_block(page, r, view, user, table)).collect();
    let reply_control = user.map(|_| {
        table.bind("reply".to_string(), UiAction::SubmitReply { thread_id: page.thread.id })
    });
    ThreadTemplate {
        chrome,
        thread,
        replies,
        can_reply: reply_control.is_some(),
        reply_control: reply_control.unwrap_or_default(),
    }
}

fn thread_block(
    page: &ThreadPage,
    view: &ViewState,
    user: Option<&User>,
    table: &mut Table,
) -> PostBlock {
    let thread = &page.thread;
    let target = EditTarget::thread(thread.id);
    let allowed = controls_for(user, thread);
    let form = view
        .editing
        .get(target)
        .filter(|_| allowed.edit)
        .map(|draft| edit_form(target, &draft.current, table));

    let mut controls = Vec::new();
    if allowed.edit && form.is_none() {
        let edit = UiAction::BeginEdit(target);
        controls.push(table.control(format!("edit-thread-{}", thread.id), "Edit", edit));
    }
    if allowed.delete {
        let delete = UiAction::DeleteThread(thread.id);
        controls.push(table.control(format!("delete-thread-{}", thread.id), "Delete", delete));
    }

    PostBlock {
        id: thread.id,
        title: thread.title.clone(),
        text: thread.text.clone(),
        author: page.author_name(thread.user_id),
        created: thread.created.display_time(),
        edited: thread.edited,
        form,
        controls,
    }
}

fn reply_block(
    page: &ThreadPage,
    reply: &Reply,
    view: &ViewState,
    user: Option<&User>,
    table: &mut Table,
) -> PostBlock {
    let target = EditTarget::reply(reply.id);
    let allowed = controls_for(user, reply);
    let form = view
        .editing
        .get(target)
        .filter(|_| allowed.edit)
        .map(|draft| edit_form(target, &draft.current, table));

    let mut controls = Vec::new();
    if allowed.edit && form.is_none() {
        let edit = UiAction::BeginEdit(target);
        controls.push(table.control(format!("edit-reply-{}", reply.id), "Edit", edit));
    }
    if allowed.delete {
        let delete = UiAction::DeleteReply(reply.id);
        controls.push(table.control(format!("delete-reply-{}", reply.id), "Delete", delete));
    }

    PostBlock {
        id: reply.id,
        title: String::new(),
        text: reply.text.clone(),
        author: page.author_name(reply.user_id),
        created: reply.created.display_time(),
        edited: reply.edited,
        form,
        controls,
    }
}

fn edit_form(target: EditTarget, current: &Snapshot, table: &mut Table) -> EditForm {
    let noun = match target.kind {
        EditKind::Thread => "thread",
        EditKind::Reply => "reply",
    };
    let controls = vec![
        table.control(format!("save-{noun}-{}", target.id), "Save", UiAction::SubmitEdit(target)),
        table.control(
            format!("cancel-{noun}-{}", target.id),
            "Cancel",
            UiAction::CancelEdit(target),
        ),
    ];
    match current {
        Snapshot::Thread { title, text } => {
            EditForm { title: title.clone(), text: text.clone(), controls }
        }
        Snapshot::Reply { text } => EditForm { title: String::new(), text: text.clone(), controls },
    }
}

pub struct UserRow {
    pub username: String,
    pub is_admin: bool,
    pub created: String,
    pub controls: Vec<ControlRow>,
}

#[derive(Template)]
#[template(path = "users.txt")]
struct UsersTemplate {
    chrome: Chrome,
    users: Vec<UserRow>,
}

fn users_page(
    chrome: Chrome,
    users: &[User],
    actor: Option<&User>,
    table: &mut Table,
) -> UsersTemplate {
    let users = users
        .iter()
        .map(|target| {
            let allowed = admin_controls_for(actor, target);
            let mut controls = Vec::new();
            if allowed.make_admin {
                controls.push(table.control(
                    format!("make-admin-{}", target.id),
                    "Make admin",
                    UiAction::MakeAdmin(target.id),
                ));
            }
            if allowed.remove_admin {
                controls.push(table.control(
                    format!("remove-admin-{}", target.id),
                    "Remove admin",
                    UiAction::RemoveAdmin(target.id),
                ));
            }
            UserRow {
                username: target.username.clone(),
                is_admin: target.is_admin,
                created: target.created.display_time(),
                controls,
            }
        })
        .collect();
    UsersTemplate { chrome, users }
}

#[derive(Template)]
#[template(path = "login.txt")]
struct LoginTemplate {
    chrome: Chrome,
    submit: String,
}

#[derive(Template)]
#[template(path = "register.txt")]
struct RegisterTemplate {
    chrome: Chrome,
    submit: String,
}

#[derive(Template)]
#[template(path = "create_thread.txt")]
struct CreateThreadTemplate {
    chrome: Chrome,
    can_submit: bool,
    submit: String,
}

#[derive(Template)]
#[template(path = "loading.txt")]
struct LoadingTemplate {
    chrome: Chrome,
}
