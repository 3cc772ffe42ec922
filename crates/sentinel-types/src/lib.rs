//! Shared identifiers, canonical encoding, and hashing for the governance core.
//!
//! Every crate in this workspace that needs to hash "the same thing" imports
//! [`Hash256`] from here rather than calling `blake3` directly — see the
//! module doc on [`hash`] for why that matters.

#![deny(unsafe_code)]

pub mod detail;
pub mod hash;
pub mod ids;

pub use detail::{canonical_details_hash, DetailValue, Details};
pub use hash::{Hash256, HashError};
pub use ids::{ActorId, ConfirmationId, DestinationId, RecordId, RequestId, SubjectId, TokenId};
