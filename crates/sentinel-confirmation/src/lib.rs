//! Confirmation consumption registry (C4): records consumed confirmations,
//! blocks and logs replay, and is recoverable from the audit trail alone.

#![deny(unsafe_code)]

mod confirmation;
mod error;
mod registry;

pub use confirmation::{Confirmation, FrictionEvidence};
pub use error::ConfirmationError;
pub use registry::ConfirmationRegistry;
