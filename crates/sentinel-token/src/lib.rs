//! Single-use, content-bound, expiring authorization tokens (C3). A token
//! authorizes exactly one side-effectful operation and is invalidated
//! atomically on use.

#![deny(unsafe_code)]

mod error;
mod operation;
mod registry;
mod token;

pub use error::TokenError;
pub use operation::CanonicalOperation;
pub use registry::{refresh_expiry, TokenRegistry};
pub use token::{AuthorizationToken, TokenStatus};
