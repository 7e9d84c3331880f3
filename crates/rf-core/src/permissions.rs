//! # Permissions
//!
//! Pure mapping from (current user, resource) to the controls that user may
//! see. Renders use [`controls_for`] / [`admin_controls_for`] to filter
//! what they draw; mutations re-check with [`authorize`] before dispatch.

use crate::error::{AppError, Result};
use crate::models::{Id, Reply, Thread, User};

pub const MUST_LOG_IN: &str = "You must be logged in to do that.";

/// Anything carrying an owner.
pub trait Owned {
    fn owner_id(&self) -> Id;
}

impl Owned for Thread {
    fn owner_id(&self) -> Id {
        self.user_id
    }
}

impl Owned for Reply {
    fn owner_id(&self) -> Id {
        self.user_id
    }
}

/// Controls allowed on a thread or reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub edit: bool,
    pub delete: bool,
}

/// Controls allowed on a row of the user list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminControls {
    pub make_admin: bool,
    pub remove_admin: bool,
}

/// Owners may edit, admins may delete. Anonymous users get nothing.
pub fn controls_for<R: Owned + ?Sized>(user: Option<&User>, resource: &R) -> Controls {
    match user {
        None => Controls::default(),
        Some(user) => Controls {
            edit: user.id == resource.owner_id(),
            delete: user.is_admin,
        },
    }
}

/// Admins may promote anyone not already an admin, and demote anyone but
/// themselves.
pub fn admin_controls_for(actor: Option<&User>, target: &User) -> AdminControls {
    match actor {
        Some(actor) if actor.is_admin => AdminControls {
            make_admin: !target.is_admin,
            remove_admin: actor.id != target.id,
        },
        _ => AdminControls::default(),
    }
}

/// A mutation about to be dispatched.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// New thread or reply.
    Create,
    Edit { owner_id: Id },
    Delete { owner_id: Id },
    MakeAdmin { target: &'a User },
    RemoveAdmin { target: &'a User },
}

/// Re-derives the permission for `action`. Errors carry the text shown to
/// the user.
pub fn authorize(user: Option<&User>, action: Action<'_>) -> Result<()> {
    let Some(user) = user else {
        return Err(AppError::Unauthorized(MUST_LOG_IN.to_string()));
    };
    let allowed = match action {
        Action::Create => true,
        Action::Edit { owner_id } => controls_for(Some(user), &OwnerOnly(owner_id)).edit,
        Action::Delete { owner_id } => controls_for(Some(user), &OwnerOnly(owner_id)).delete,
        Action::MakeAdmin { target } => admin_controls_for(Some(user), target).make_admin,
        Action::RemoveAdmin { target } => admin_controls_for(Some(user), target).remove_admin,
    };
    if allowed {
        return Ok(());
    }
    let reason = match action {
        Action::Create => MUST_LOG_IN,
        Action::Edit { .. } => "You can only edit your own posts.",
        Action::Delete { .. } => "Only admins can delete posts.",
        Action::MakeAdmin { .. } | Action::RemoveAdmin { .. } if !user.is_admin => {
            "Only admins can manage users."
        }
        Action::MakeAdmin { .. } => "That user is already an admin.",
        Action::RemoveAdmin { .. } => "You cannot remove your own admin rights.",
    };
    Err(AppError::Unauthorized(reason.to_string()))
}

struct OwnerOnly(Id);

impl Owned for OwnerOnly {
    fn owner_id(&self) -> Id {
        self.0
    }
}
