//! Reply policy for ZapRelay.
//!
//! Provides:
//! - **Contacts**: the allow-list of senders that may receive replies
//! - **Toggles**: global and group reply switches
//! - **Store**: the shared, file-backed view of both

pub mod contacts;
pub mod store;
pub mod toggles;

pub use contacts::{ContactEntry, MAX_CONTACTS};
pub use store::{Authorization, PolicyStore};
pub use toggles::PolicyConfig;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Policy file {path} could not be accessed: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Contact {0} is already on the list")]
    DuplicateContact(String),

    #[error("Contact list is full ({0} entries)")]
    ContactLimit(usize),

    #[error("No contact {0} on the list")]
    UnknownContact(String),

    #[error("Invalid contact field: '{0}'")]
    InvalidContact(String),
}
