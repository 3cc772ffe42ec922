//! Property-based tests over the invariants that have to hold for
//! arbitrary inputs, not just the handful of examples the unit tests in
//! each crate already cover: hash-chain integrity under arbitrary append
//! sequences, and content-binding rejecting any operation substitution.

use proptest::prelude::*;
use sentinel_audit::{AuditAppend, AuditKind, AuditLog, Outcome, SubjectRef};
use sentinel_policy::{Attestation, Scope};
use sentinel_token::{CanonicalOperation, TokenRegistry};
use sentinel_types::{ActorId, Details, DetailValue};

fn arb_detail_value() -> impl Strategy<Value = DetailValue> {
    prop_oneof![
        Just(DetailValue::Null),
        any::<bool>().prop_map(DetailValue::Bool),
        any::<i64>().prop_map(DetailValue::Int),
        "[a-zA-Z0-9 _-]{0,24}".prop_map(DetailValue::Str),
    ]
}

fn arb_details() -> impl Strategy<Value = Details> {
    prop::collection::btree_map("[a-z]{1,8}", arb_detail_value(), 0..5)
}

fn arb_kind() -> impl Strategy<Value = AuditKind> {
    prop_oneof![
        Just(AuditKind::TokenIssued),
        Just(AuditKind::TokenConsumed),
        Just(AuditKind::ConfirmationIssued),
        Just(AuditKind::ConfirmationConsumed),
        Just(AuditKind::DuplicateBlocked),
        Just(AuditKind::TamperingDetected),
        "[a-z]{1,10}".prop_map(AuditKind::Custom),
    ]
}

proptest! {
    /// Any sequence of appends with arbitrary actors, kinds, and detail
    /// maps must still produce a chain that verifies end to end, and the
    /// chain length must match the number of appends.
    #[test]
    fn chain_verifies_for_arbitrary_append_sequences(
        entries in prop::collection::vec((".{1,16}", arb_kind(), arb_details()), 0..30)
    ) {
        let log = AuditLog::new();
        let count = entries.len();
        for (actor_name, kind, details) in entries {
            log.append(AuditAppend {
                actor: ActorId::new(actor_name),
                kind,
                outcome: Outcome::Success,
                subjects: vec![SubjectRef::Decision("d".to_string())],
                details,
            })
            .unwrap();
        }
        prop_assert_eq!(log.len(), count);
        prop_assert!(log.verify_chain().is_ok());
    }

    /// A token minted for one canonical operation must never validate
    /// against any other operation that differs in kind, target, or
    /// parameters.
    #[test]
    fn token_rejects_any_operation_substitution(
        kind_a in "[a-z]{3,10}",
        target_a in "[a-zA-Z0-9./:]{3,20}",
        kind_b in "[a-z]{3,10}",
        target_b in "[a-zA-Z0-9./:]{3,20}",
    ) {
        prop_assume!(kind_a != kind_b || target_a != target_b);

        let registry = TokenRegistry::new();
        let original = CanonicalOperation::new(kind_a, target_a.clone(), Details::new());
        let substituted = CanonicalOperation::new(kind_b, target_b, Details::new());

        let attestation = Attestation::new(
            Scope::new(vec![target_a], vec![]),
            ActorId::new("attester"),
            chrono::Utc::now(),
            chrono::Utc::now() + chrono::Duration::hours(1),
        );
        let token = registry
            .generate(ActorId::new("approver"), &original, chrono::Duration::hours(1), &attestation)
            .unwrap();
        prop_assert!(registry.validate(&token, &[original]).is_ok());
        prop_assert!(registry.validate(&token, &[substituted]).is_err());
    }

    /// Hashing the same canonical operation twice must always agree, and
    /// changing any single field must always disagree — the content-binding
    /// mechanism C3/C4/C1 all share.
    #[test]
    fn canonical_hash_is_deterministic_and_sensitive_to_every_field(
        kind in "[a-z]{3,10}",
        target in "[a-zA-Z0-9./:]{3,20}",
        extra_byte in any::<u8>(),
    ) {
        let a = CanonicalOperation::new(kind.clone(), target.clone(), Details::new());
        let b = CanonicalOperation::new(kind.clone(), target.clone(), Details::new());
        prop_assert_eq!(a.canonical_hash(), b.canonical_hash());

        let mut tweaked_target = target.clone();
        tweaked_target.push(extra_byte as char);
        let c = CanonicalOperation::new(kind, tweaked_target, Details::new());
        prop_assert_ne!(a.canonical_hash(), c.canonical_hash());
    }
}
