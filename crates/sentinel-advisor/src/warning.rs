use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningLevel {
    None,
    Low,
    Medium,
    High,
}

/// Purely informational. There is no method on this type — or on
/// [`crate::RubberStampDetector`] — that can block, reject, or prevent a
/// confirmation (distilled §4.7: "C7 never blocks. It has no blocking
/// method.").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RubberStampWarning {
    pub warning_level: WarningLevel,
    pub reason: String,
    pub decision_count: usize,
    pub approval_rate: f64,
    pub average_deliberation_seconds: f64,
    pub is_cold_start: bool,
}

impl RubberStampWarning {
    /// Callers may choose to suppress display of advisory-silent warnings.
    pub fn is_advisory_silent(&self) -> bool {
        self.warning_level == WarningLevel::None || self.is_cold_start
    }
}
