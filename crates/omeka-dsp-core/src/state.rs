//! Per-record sync state machine
//!
//! State transitions:
//! ```text
//! Lookup → NotFound → Create → Verify
//!        → Found → CompareTimestamp → Skip
//!                                   → Diff → ApplyEach
//! ```

use serde::{Deserialize, Serialize};

/// Where a record is in its synchronisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordState {
    /// Querying the target by identifier
    Lookup,
    /// No target record exists
    NotFound,
    /// Building and submitting the creation payload
    Create,
    /// Re-looking up the created record to obtain its reference
    Verify,
    /// A target record exists and has been fetched
    Found,
    /// Comparing source and target modification times
    CompareTimestamp,
    /// Source is not newer, nothing to do
    Skip,
    /// Computing field changes
    Diff,
    /// Resolving and applying each operation
    ApplyEach,
}

impl RecordState {
    /// Check if a state transition is valid
    pub fn can_transition_to(&self, target: &RecordState) -> bool {
        matches!(
            (self, target),
            (RecordState::Lookup, RecordState::NotFound)
                | (RecordState::Lookup, RecordState::Found)
                | (RecordState::NotFound, RecordState::Create)
                | (RecordState::Create, RecordState::Verify)
                | (RecordState::Found, RecordState::CompareTimestamp)
                | (RecordState::CompareTimestamp, RecordState::Skip)
                | (RecordState::CompareTimestamp, RecordState::Diff)
                | (RecordState::Diff, RecordState::ApplyEach)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecordState::Verify | RecordState::Skip | RecordState::ApplyEach
        )
    }
}

impl Default for RecordState {
    fn default() -> Self {
        RecordState::Lookup
    }
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordState::Lookup => write!(f, "lookup"),
            RecordState::NotFound => write!(f, "not found"),
            RecordState::Create => write!(f, "create"),
            RecordState::Verify => write!(f, "verify"),
            RecordState::Found => write!(f, "found"),
            RecordState::CompareTimestamp => write!(f, "compare timestamp"),
            RecordState::Skip => write!(f, "skip"),
            RecordState::Diff => write!(f, "diff"),
            RecordState::ApplyEach => write!(f, "apply"),
        }
    }
}
