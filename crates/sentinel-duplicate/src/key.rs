use sentinel_types::{DestinationId, SubjectId};
use serde::{Deserialize, Serialize};

/// Uniqueness key: (subject-id, destination-id) — e.g. (decision-id,
/// platform). The guard enforces at-most-one successful submission per
/// key (distilled §4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionKey {
    pub subject: SubjectId,
    pub destination: DestinationId,
}

impl SubmissionKey {
    pub fn new(subject: SubjectId, destination: DestinationId) -> Self {
        Self { subject, destination }
    }

    pub fn as_subject_string(&self) -> String {
        format!("{}:{}", self.subject, self.destination)
    }
}

impl std::fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_subject_string())
    }
}
