//! Error types for omeka-dsp-core

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for synchronisation.
///
/// All variants except [`SyncError::Authentication`] and
/// [`SyncError::ProjectNotFound`] are scoped to a single record, media
/// item or operation and never abort a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Network or HTTP failure talking to either store
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// A controlled-vocabulary label has no node in the target taxonomy
    #[error("No match found for value '{label}' in list '{vocabulary}'")]
    VocabularyMiss { vocabulary: String, label: String },

    /// Media content type outside the recognised file families
    #[error("Format is not supported: {0}")]
    UnsupportedMediaType(String),

    /// No value node matches the value the diff was computed against
    #[error("Stale snapshot: no '{field}' value node matching '{value}'")]
    StaleSnapshot { field: String, value: String },

    /// Source record lacks data required to sync it
    #[error("Malformed source record: {0}")]
    MalformedSourceRecord(String),

    /// Media payload requested without an uploaded file or parent reference
    #[error("Missing media attachment for {0}")]
    MissingMediaAttachment(String),

    /// Login against the target store failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The target project could not be resolved
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// A response did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SyncError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Authentication(_) | SyncError::ProjectNotFound(_)
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_prerequisites_are_fatal() {
        assert!(SyncError::Authentication("bad password".into()).is_fatal());
        assert!(SyncError::ProjectNotFound("0856".into()).is_fatal());
        assert!(!SyncError::RemoteUnavailable("timeout".into()).is_fatal());
        assert!(!SyncError::UnsupportedMediaType("application/zip".into()).is_fatal());
        assert!(!SyncError::StaleSnapshot {
            field: "subject".into(),
            value: "x".into()
        }
        .is_fatal());
    }

    #[test]
    fn vocabulary_miss_names_label_and_list() {
        let err = SyncError::VocabularyMiss {
            vocabulary: "Thema".into(),
            label: "Bauwerk".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Bauwerk"));
        assert!(msg.contains("Thema"));
    }
}
