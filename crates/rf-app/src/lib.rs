//! rusty-forum/crates/rf-app/src/lib.rs
//!
//! Client application layer: the session store, the view model that routes
//! every user intent, and the mutation flows built on top of `rf-core`.

pub mod coordinator;
pub mod forum;
pub mod notify;
pub mod session;

pub use forum::{Forum, SESSION_EXPIRED};
pub use notify::Notifier;
pub use session::SessionStore;

#[cfg(test)]
mod tests;
