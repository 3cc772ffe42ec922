//! Lock- and audit-backed uniqueness guard for (subject, destination)
//! pairs (C5). Enforces at-most-one successful submission per key.

#![deny(unsafe_code)]

mod error;
mod guard;
mod key;
mod lock;

pub use error::DuplicateError;
pub use guard::{DuplicateGuard, SubmissionHandle};
pub use key::SubmissionKey;
