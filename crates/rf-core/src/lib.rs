//! rusty-forum/crates/rf-core/src/lib.rs
//!
//! Domain models, ports, and the pure decision logic of the Rusty-Forum
//! client: who may do what, and what the view is showing.

pub mod action;
pub mod error;
pub mod models;
pub mod notification;
pub mod permissions;
pub mod session;
pub mod traits;
pub mod validation;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exporting for easier access in other crates
pub use action::*;
pub use error::*;
pub use models::*;
pub use notification::*;
pub use session::*;
pub use traits::*;
pub use view::*;
