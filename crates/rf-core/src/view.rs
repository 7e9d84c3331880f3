//! # View State
//!
//! Which screen is active, what it was loaded with, and which resources
//! currently show an in-place edit form instead of their normal rendering.

use std::collections::BTreeMap;

use crate::models::{Id, Reply, Thread, User};

/// The screens of the client. Exactly one is rendered at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    ThreadDetail,
    Users,
    Register,
    Login,
    CreateThread,
}

/// A navigation request: the screen plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Home,
    Thread(Id),
    Users,
    Register,
    Login,
    CreateThread,
}

impl Navigation {
    pub fn screen(self) -> Screen {
        match self {
            Self::Home => Screen::Home,
            Self::Thread(_) => Screen::ThreadDetail,
            Self::Users => Screen::Users,
            Self::Register => Screen::Register,
            Self::Login => Screen::Login,
            Self::CreateThread => Screen::CreateThread,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EditKind {
    Thread,
    Reply,
}

/// The resource an edit form is open for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditTarget {
    pub kind: EditKind,
    pub id: Id,
}

impl EditTarget {
    pub fn thread(id: Id) -> Self {
        Self { kind: EditKind::Thread, id }
    }

    pub fn reply(id: Id) -> Self {
        Self { kind: EditKind::Reply, id }
    }
}

/// Editable content of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Thread { title: String, text: String },
    Reply { text: String },
}

impl Snapshot {
    pub fn kind(&self) -> EditKind {
        match self {
            Self::Thread { .. } => EditKind::Thread,
            Self::Reply { .. } => EditKind::Reply,
        }
    }
}

/// One open edit form: what was shown when it opened and what it holds now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub original: Snapshot,
    pub current: Snapshot,
}

/// Open edit forms, keyed by resource so each keeps its own snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edits {
    open: BTreeMap<EditTarget, Draft>,
}

impl Edits {
    /// Opens a form. Re-opening an already open form keeps its snapshot and
    /// returns `false`.
    pub fn begin(&mut self, target: EditTarget, original: Snapshot) -> bool {
        if self.open.contains_key(&target) || original.kind() != target.kind {
            return false;
        }
        let current = original.clone();
        self.open.insert(target, Draft { original, current });
        true
    }

    /// Replaces the draft content of an open form. Never touches the original.
    pub fn update(&mut self, target: EditTarget, current: Snapshot) -> bool {
        match self.open.get_mut(&target) {
            Some(draft) if current.kind() == target.kind => {
                draft.current = current;
                true
            }
            _ => false,
        }
    }

    /// Closes a form without saving, handing back the pre-edit content.
    pub fn cancel(&mut self, target: EditTarget) -> Option<Snapshot> {
        self.open.remove(&target).map(|draft| draft.original)
    }

    /// Closes a form after a successful save.
    pub fn finish(&mut self, target: EditTarget) -> Option<Draft> {
        self.open.remove(&target)
    }

    pub fn get(&self, target: EditTarget) -> Option<&Draft> {
        self.open.get(&target)
    }

    pub fn is_editing(&self, target: EditTarget) -> bool {
        self.open.contains_key(&target)
    }

    pub fn targets(&self) -> impl Iterator<Item = EditTarget> + '_ {
        self.open.keys().copied()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(EditTarget) -> bool) {
        self.open.retain(|target, _| keep(*target));
    }

    pub fn clear(&mut self) {
        self.open.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// Drives the single rendered screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub screen: Screen,
    pub selected_thread: Option<Id>,
    pub editing: Edits,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { screen: Screen::Home, selected_thread: None, editing: Edits::default() }
    }
}

impl ViewState {
    /// The navigation that reproduces the current screen.
    pub fn current(&self) -> Navigation {
        match (self.screen, self.selected_thread) {
            (Screen::ThreadDetail, Some(id)) => Navigation::Thread(id),
            (Screen::ThreadDetail, None) | (Screen::Home, _) => Navigation::Home,
            (Screen::Users, _) => Navigation::Users,
            (Screen::Register, _) => Navigation::Register,
            (Screen::Login, _) => Navigation::Login,
            (Screen::CreateThread, _) => Navigation::CreateThread,
        }
    }
}

/// Data fetched for the active screen. Replaced wholesale on every load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Page {
    /// Nothing loaded yet.
    #[default]
    Empty,
    Threads(Vec<Thread>),
    Thread(ThreadPage),
    Users(Vec<User>),
    /// Screens that are only a form.
    Form,
}

/// One thread with its replies and the authors of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPage {
    pub thread: Thread,
    pub replies: Vec<Reply>,
    pub authors: BTreeMap<Id, User>,
}

impl ThreadPage {
    pub fn reply(&self, id: Id) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, target: EditTarget) -> bool {
        self.owner_of(target).is_some()
    }

    pub fn owner_of(&self, target: EditTarget) -> Option<Id> {
        match target.kind {
            EditKind::Thread => (self.thread.id == target.id).then_some(self.thread.user_id),
            EditKind::Reply => self.reply(target.id).map(|r| r.user_id),
        }
    }

    /// The content currently rendered for `target`.
    pub fn snapshot(&self, target: EditTarget) -> Option<Snapshot> {
        match target.kind {
            EditKind::Thread if self.thread.id == target.id => Some(Snapshot::Thread {
                title: self.thread.title.clone(),
                text: self.thread.text.clone(),
            }),
            EditKind::Thread => None,
            EditKind::Reply => {
                self.reply(target.id).map(|r| Snapshot::Reply { text: r.text.clone() })
            }
        }
    }

    /// Writes `snapshot` back into the rendered copy of `target`.
    pub fn restore(&mut self, target: EditTarget, snapshot: &Snapshot) -> bool {
        match (target.kind, snapshot) {
            (EditKind::Thread, Snapshot::Thread { title, text }) if self.thread.id == target.id => {
                self.thread.title = title.clone();
                self.thread.text = text.clone();
                true
            }
            (EditKind::Reply, Snapshot::Reply { text }) => {
                match self.replies.iter_mut().find(|r| r.id == target.id) {
                    Some(reply) => {
                        reply.text = text.clone();
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    pub fn author_name(&self, user_id: Id) -> String {
        self.authors
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| format!("user #{user_id}"))
    }
}
