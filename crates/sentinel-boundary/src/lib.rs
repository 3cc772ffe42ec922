//! Static and runtime boundary policing between governance-core phases
//! (C2). Keeps network clients, browser/UI automation, and any
//! deliberation-bypassing action out of phases that must stay read-only
//! or side-effect-free.
//!
//! Grounded on the Python original's `governance_friction/boundaries.py`
//! (`Phase10BoundaryGuard`) — same forbidden module/action vocabulary,
//! translated to a config struct plus pure check methods instead of a
//! runtime import hook.

#![deny(unsafe_code)]

mod error;
mod guard;

pub use error::BoundaryError;
pub use guard::{BoundaryGuard, ImportCategory, PhaseBoundary};
