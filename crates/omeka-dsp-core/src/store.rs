use async_trait::async_trait;

use crate::error::Result;
use crate::operation::Operation;
use crate::payload::CreatePayload;
use crate::source::SourceRecord;
use crate::target::{RecordKind, TargetRecord, TargetRef};
use crate::vocabulary::ControlledVocabulary;

/// The target repository records are written to.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Log in. Failure aborts the run.
    async fn authenticate(&self) -> Result<()>;

    /// IRI of the project records are attached to. Failure aborts the run.
    async fn project_iri(&self) -> Result<String>;

    /// Every controlled vocabulary of a project.
    async fn list_vocabularies(&self, project_iri: &str) -> Result<Vec<ControlledVocabulary>>;

    /// Find a record of `kind` by its stable identifier.
    async fn lookup(&self, kind: RecordKind, identifier: &str) -> Result<Option<TargetRef>>;

    /// Fetch the full snapshot of a record.
    async fn fetch_full(&self, target: &TargetRef) -> Result<TargetRecord>;

    /// Create a record attached to a project.
    async fn create_record(&self, payload: &CreatePayload, project_iri: &str) -> Result<TargetRef>;

    /// Apply a single resolved value operation.
    async fn apply_operation(&self, target: &TargetRef, operation: &Operation) -> Result<()>;

    /// Copy a file into the target's asset storage. Returns the internal filename.
    async fn upload_asset(&self, source_url: &str) -> Result<String>;
}

/// The source catalogue records are read from.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// All top-level records to synchronise.
    async fn list_records(&self) -> Result<Vec<SourceRecord>>;

    /// Media records attached to a top-level record.
    async fn list_media(&self, record: &SourceRecord) -> Result<Vec<SourceRecord>>;
}
