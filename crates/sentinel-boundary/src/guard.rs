//! Boundary guard: forbidden-import, forbidden-action, and read-only-phase
//! checks. Grounded on the Python original's `Phase10BoundaryGuard`
//! (`governance_friction/boundaries.py`) — same default literal module and
//! action names, same substring-matching behavior.

use std::collections::BTreeSet;

use crate::error::BoundaryError;

/// Why an import is forbidden — lets `check_single_import` raise the right
/// taxonomy member instead of a single generic variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportCategory {
    Network,
    Automation,
    Generic,
}

/// Per-phase configuration. Holds only configuration — no per-call state.
/// All checks below are pure functions modulo this struct (distilled §4.2).
#[derive(Debug, Clone)]
pub struct PhaseBoundary {
    forbidden_network_imports: BTreeSet<String>,
    forbidden_automation_imports: BTreeSet<String>,
    forbidden_actions: BTreeSet<String>,
    read_only_phases: BTreeSet<String>,
}

const WRITE_VERBS: &[&str] = &[
    "write", "update", "delete", "insert", "modify", "create", "set", "put", "post", "patch",
    "remove", "add", "append", "clear", "reset", "save",
];

const DEFAULT_NETWORK_IMPORTS: &[&str] = &[
    "reqwest", "hyper", "tokio::net", "std::net", "surf", "ureq",
];

const DEFAULT_AUTOMATION_IMPORTS: &[&str] = &[
    "thirtyfour", "fantoccini", "headless_chrome", "enigo", "rdev",
];

const DEFAULT_FORBIDDEN_ACTIONS: &[&str] = &[
    "auto_approve",
    "auto_submit",
    "auto_confirm",
    "infer_decision",
    "suggest_decision",
    "recommend_action",
    "classify_vulnerability",
    "classify_bug",
    "assign_severity",
    "compute_confidence",
    "generate_proof",
    "execute_action",
    "bypass_deliberation",
    "bypass_edit",
    "bypass_challenge",
    "bypass_cooldown",
    "bypass_audit",
    "bypass_friction",
    "disable_friction",
    "reduce_friction",
    "skip_friction",
];

impl Default for PhaseBoundary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PhaseBoundary {
    pub fn empty() -> Self {
        Self {
            forbidden_network_imports: BTreeSet::new(),
            forbidden_automation_imports: BTreeSet::new(),
            forbidden_actions: BTreeSet::new(),
            read_only_phases: BTreeSet::new(),
        }
    }

    /// The literal defaults this governance core ships with — network
    /// clients, browser/UI automation crates, and the automation/bypass
    /// action names forbidden anywhere in the research-assistant pipeline.
    pub fn with_defaults() -> Self {
        let mut b = Self::empty();
        for m in DEFAULT_NETWORK_IMPORTS {
            b.forbidden_network_imports.insert((*m).to_string());
        }
        for m in DEFAULT_AUTOMATION_IMPORTS {
            b.forbidden_automation_imports.insert((*m).to_string());
        }
        for a in DEFAULT_FORBIDDEN_ACTIONS {
            b.forbidden_actions.insert((*a).to_string());
        }
        b
    }

    pub fn with_read_only_phases(mut self, phases: impl IntoIterator<Item = String>) -> Self {
        self.read_only_phases.extend(phases);
        self
    }

    pub fn forbid_import(mut self, category: ImportCategory, name: impl Into<String>) -> Self {
        match category {
            ImportCategory::Network => {
                self.forbidden_network_imports.insert(name.into());
            }
            ImportCategory::Automation => {
                self.forbidden_automation_imports.insert(name.into());
            }
            ImportCategory::Generic => {
                self.forbidden_automation_imports.insert(name.into());
            }
        }
        self
    }

    pub fn forbid_action(mut self, name: impl Into<String>) -> Self {
        self.forbidden_actions.insert(name.into());
        self
    }
}

/// A check surface over a single phase's [`PhaseBoundary`] configuration.
pub struct BoundaryGuard {
    boundary: PhaseBoundary,
}

impl BoundaryGuard {
    pub fn new(boundary: PhaseBoundary) -> Self {
        Self { boundary }
    }

    /// Validate a caller-supplied list of currently-active module/crate
    /// names (there is no `sys.modules` equivalent in Rust; the host is
    /// expected to supply its own dependency graph or active-feature list
    /// at construction time — distilled §9 "module-load-time side-effectful
    /// boundary validation maps to an initialization routine the host
    /// invokes").
    pub fn validate_all_imports(&self, active_modules: &[&str]) -> Result<(), BoundaryError> {
        for module in active_modules {
            self.check_single_import(module)?;
        }
        Ok(())
    }

    pub fn check_single_import(&self, module_name: &str) -> Result<(), BoundaryError> {
        if self.matches_forbidden(&self.boundary.forbidden_network_imports, module_name) {
            tracing::warn!(module = module_name, "boundary violation: forbidden network import");
            return Err(BoundaryError::NetworkAttempt(module_name.to_string()));
        }
        if self.matches_forbidden(&self.boundary.forbidden_automation_imports, module_name) {
            tracing::warn!(module = module_name, "boundary violation: forbidden automation import");
            return Err(BoundaryError::AutomationAttempt(module_name.to_string()));
        }
        Ok(())
    }

    fn matches_forbidden(&self, set: &BTreeSet<String>, module_name: &str) -> bool {
        set.contains(module_name)
            || set.iter().any(|forbidden| {
                module_name == forbidden || module_name.starts_with(&format!("{forbidden}::"))
            })
    }

    pub fn check_action(&self, action: &str) -> Result<(), BoundaryError> {
        let action_lower = action.to_lowercase();

        if let Some(forbidden) = self.boundary.forbidden_actions.iter().find(|f| action_lower.contains(f.as_str())) {
            if forbidden.starts_with("bypass")
                || matches!(forbidden.as_str(), "disable_friction" | "reduce_friction" | "skip_friction")
            {
                tracing::warn!(action, matched = %forbidden, "boundary violation: friction bypass attempt");
                return Err(BoundaryError::BypassAttempt(action.to_string()));
            }
            tracing::warn!(action, matched = %forbidden, "boundary violation: forbidden automation action");
            return Err(BoundaryError::AutomationAttempt(action.to_string()));
        }

        if action_lower.starts_with("auto_") {
            tracing::warn!(action, "boundary violation: auto_-prefixed action");
            return Err(BoundaryError::AutomationAttempt(action.to_string()));
        }

        Ok(())
    }

    pub fn check_write(&self, phase: &str, operation: &str) -> Result<(), BoundaryError> {
        if !self.is_read_only_phase(phase) {
            return Ok(());
        }

        let op_lower = operation.to_lowercase();
        if WRITE_VERBS.iter().any(|verb| op_lower.contains(verb)) {
            tracing::warn!(phase, operation, "boundary violation: write attempt against a read-only phase");
            return Err(BoundaryError::ReadOnlyViolation {
                phase: phase.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    fn is_read_only_phase(&self, phase: &str) -> bool {
        let normalized_hyphen = phase.to_lowercase().replace(['_', ' '], "-");
        let normalized_underscore = phase.to_lowercase().replace(['-', ' '], "_");

        self.boundary.read_only_phases.iter().any(|ro| {
            let ro_hyphen = ro.replace('_', "-");
            let ro_underscore = ro.replace('-', "_");
            normalized_hyphen == ro_hyphen
                || normalized_underscore == ro_underscore
                || normalized_hyphen.contains(&ro_hyphen)
                || normalized_underscore.contains(&ro_underscore)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> BoundaryGuard {
        BoundaryGuard::new(
            PhaseBoundary::with_defaults()
                .with_read_only_phases(["decision_workflow".to_string(), "submission_workflow".to_string()]),
        )
    }

    #[test]
    fn network_import_is_flagged_as_network_attempt() {
        let err = guard().check_single_import("reqwest").unwrap_err();
        assert!(matches!(err, BoundaryError::NetworkAttempt(_)));
    }

    #[test]
    fn submodule_of_forbidden_import_is_flagged() {
        let err = guard().check_single_import("std::net::TcpStream").unwrap_err();
        assert!(matches!(err, BoundaryError::NetworkAttempt(_)));
    }

    #[test]
    fn unrelated_import_is_allowed() {
        assert!(guard().check_single_import("serde").is_ok());
    }

    #[test]
    fn auto_prefixed_action_is_automation_attempt() {
        let err = guard().check_action("auto_submit_report").unwrap_err();
        assert!(matches!(err, BoundaryError::AutomationAttempt(_)));
    }

    #[test]
    fn bypass_action_is_bypass_attempt() {
        let err = guard().check_action("bypass_cooldown").unwrap_err();
        assert!(matches!(err, BoundaryError::BypassAttempt(_)));
    }

    #[test]
    fn classify_vulnerability_is_forbidden() {
        assert!(guard().check_action("classify_vulnerability").is_err());
    }

    #[test]
    fn benign_action_is_allowed() {
        assert!(guard().check_action("record_edit").is_ok());
    }

    #[test]
    fn write_to_read_only_phase_is_blocked() {
        let err = guard().check_write("decision-workflow", "update_decision").unwrap_err();
        assert!(matches!(err, BoundaryError::ReadOnlyViolation { .. }));
    }

    #[test]
    fn read_from_read_only_phase_is_allowed() {
        assert!(guard().check_write("decision-workflow", "get_decision").is_ok());
    }

    #[test]
    fn write_to_non_read_only_phase_is_allowed() {
        assert!(guard().check_write("friction_gate", "update_state").is_ok());
    }

    #[test]
    fn phase_name_normalization_hyphen_vs_underscore() {
        assert!(guard().check_write("submission-workflow", "save_result").is_err());
        assert!(guard().check_write("submission_workflow", "save_result").is_err());
    }

    #[test]
    fn validate_all_imports_stops_at_first_violation() {
        let err = guard()
            .validate_all_imports(&["serde", "reqwest", "selenium"])
            .unwrap_err();
        assert!(matches!(err, BoundaryError::NetworkAttempt(_)));
    }
}
