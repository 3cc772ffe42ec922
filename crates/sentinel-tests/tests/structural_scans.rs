//! Repo-wide structural scans: properties that are really about the
//! *shape* of the source, not its runtime behavior, and so are cheaper and
//! more direct to check with `include_str!` than by trying to provoke them
//! at runtime.

use std::path::Path;

fn read_crate_file(relative: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

#[test]
fn audit_log_has_no_mutating_verbs_anywhere_in_its_public_surface() {
    let source = read_crate_file("crates/sentinel-audit/src/log.rs");
    for verb in ["fn delete", "fn update", "fn truncate", "fn clear", "fn disable", "fn remove_record", "fn rewrite"] {
        assert!(!source.contains(verb), "found forbidden verb `{verb}` in sentinel-audit's AuditLog");
    }
}

#[test]
fn friction_gate_has_no_bypass_or_auto_approve_methods() {
    let source = read_crate_file("crates/sentinel-friction/src/gate.rs");
    for verb in ["fn auto_approve", "fn skip_", "fn bypass_", "fn force_ready", "fn disable_friction"] {
        assert!(!source.contains(verb), "found forbidden verb `{verb}` in FrictionGate");
    }
}

#[test]
fn rubber_stamp_detector_has_no_rejecting_or_blocking_method() {
    let source = read_crate_file("crates/sentinel-advisor/src/detector.rs");
    for verb in ["fn reject", "fn block", "fn deny", "fn veto"] {
        assert!(!source.contains(verb), "found forbidden verb `{verb}` in RubberStampDetector — C7 must stay advisory-only");
    }
}

#[test]
fn pipeline_crate_never_imports_a_network_crate_outside_the_feature_gated_client_module() {
    let lib_source = read_crate_file("crates/sentinel-pipeline/src/lib.rs");
    let pipeline_source = read_crate_file("crates/sentinel-pipeline/src/pipeline.rs");
    let error_source = read_crate_file("crates/sentinel-pipeline/src/error.rs");

    for forbidden in ["reqwest::", "hyper::", "use reqwest", "use hyper"] {
        assert!(!lib_source.contains(forbidden), "found `{forbidden}` in sentinel-pipeline's lib.rs");
        assert!(!pipeline_source.contains(forbidden), "found `{forbidden}` in sentinel-pipeline's pipeline.rs");
        assert!(!error_source.contains(forbidden), "found `{forbidden}` in sentinel-pipeline's error.rs");
    }

    let clients_source = read_crate_file("crates/sentinel-pipeline/src/clients.rs");
    assert!(
        clients_source.contains("#[cfg(feature = \"reqwest_clients\")]"),
        "expected the reqwest-backed clients to stay behind the reqwest_clients feature gate"
    );
}

#[test]
fn boundary_guard_default_forbidden_actions_are_self_consistent() {
    let source = read_crate_file("crates/sentinel-boundary/src/guard.rs");
    // Every bypass/disable/reduce/skip action name in the default list must
    // actually be routed to `BypassAttempt`, not the generic automation
    // branch, or the distinction the error taxonomy draws is dead weight.
    for literal in ["bypass_deliberation", "bypass_edit", "bypass_challenge", "bypass_cooldown", "disable_friction", "reduce_friction", "skip_friction"] {
        assert!(source.contains(literal), "expected `{literal}` in DEFAULT_FORBIDDEN_ACTIONS");
    }
    assert!(source.contains("forbidden.starts_with(\"bypass\")"));
}

#[test]
fn every_sentinel_crate_denies_unsafe_code() {
    let crates = [
        "sentinel-types",
        "sentinel-audit",
        "sentinel-boundary",
        "sentinel-policy",
        "sentinel-token",
        "sentinel-confirmation",
        "sentinel-duplicate",
        "sentinel-friction",
        "sentinel-advisor",
        "sentinel-pipeline",
    ];
    for crate_name in crates {
        let lib = read_crate_file(&format!("crates/{crate_name}/src/lib.rs"));
        assert!(lib.contains("#![deny(unsafe_code)]"), "{crate_name}'s lib.rs is missing #![deny(unsafe_code)]");
    }
}
