//! The deliberation/edit/challenge/cooldown gate (C6). The only path to a
//! confirmation runs through this state machine; no auto-approval,
//! timeout-approval, batch-approval, or skip exists anywhere in its API.

#![deny(unsafe_code)]

mod error;
mod gate;
mod state;

pub use error::FrictionError;
pub use gate::FrictionGate;
pub use state::GateState;
