//! Scope/Attestation types and the structured policy configuration
//! document shared across the governance core (distilled §3, §6).

#![deny(unsafe_code)]

mod config;
mod scope;

pub use config::{PolicyConfig, MIN_COOLDOWN_SECONDS, MIN_DELIBERATION_SECONDS};
pub use scope::{Attestation, Scope, SubjectPattern};
