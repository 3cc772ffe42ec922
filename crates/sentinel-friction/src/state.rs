use std::time::Instant;

use sentinel_types::ActorId;

/// Distilled §4.6 state machine: `initial → deliberating → edit-pending →
/// challenge-pending → cooling-down → ready → (consumed)`. `Initial` has
/// no stored entry — absence of an entry for a subject *is* the initial
/// state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Deliberating,
    EditPending,
    ChallengePending,
    CoolingDown,
    Ready,
}

pub(crate) struct FrictionState {
    pub(crate) state: GateState,
    pub(crate) approver: ActorId,
    pub(crate) presented_content: Vec<u8>,
    pub(crate) deliberation_start: Instant,
    pub(crate) challenge_question: Option<String>,
    pub(crate) cooldown_start: Option<Instant>,
}

impl FrictionState {
    pub(crate) fn new(approver: ActorId, presented_content: Vec<u8>) -> Self {
        Self {
            state: GateState::Deliberating,
            approver,
            presented_content,
            deliberation_start: Instant::now(),
            challenge_question: None,
            cooldown_start: None,
        }
    }
}
