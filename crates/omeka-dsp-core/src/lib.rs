//! Omeka DSP Core - Reconciliation engine for Omeka S to DSP synchronisation
//!
//! This crate provides everything between the two remote APIs:
//!
//! - **Source/Target**: Typed records for both stores (PropertyEntry, TypedValue, RecordKind)
//! - **Fields**: The declared field table shared by both data models
//! - **Extract**: Canonical scalar and set values from source property entries
//! - **Vocabulary**: Controlled vocabularies and the label → node IRI index
//! - **Diff**: Scalar and set rules producing field changes
//! - **Resolve**: Binding changes to the versioned value nodes they act on
//! - **Payload**: Creation payloads for new records and media
//! - **Wire**: DSP JSON-LD encoding and decoding
//! - **Orchestrator**: Per-record state machine (Lookup→Create|Diff→Apply) over the store traits
//!
//! # Data flow
//!
//! ```text
//! SourceRecord → extract → RecordDiffer ─┬→ resolve → TargetStore::apply_operation
//!                              ↑         │
//!                       VocabularyIndex  └ (not found) → PayloadBuilder → TargetStore::create_record
//! ```

pub mod cancel;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod fields;
pub mod operation;
pub mod orchestrator;
pub mod payload;
pub mod resolve;
pub mod source;
pub mod state;
pub mod store;
pub mod target;
pub mod vocabulary;
pub mod wire;

pub use cancel::CancellationToken;
pub use config::{ConfigError, MediaTypeTable, OntologyConfig, RunOptions, SyncConfig};
pub use diff::{sync_scalar, sync_set, RecordDiffer};
pub use error::{Result, SyncError};
pub use extract::{extract_field, extract_label, extract_scalar, extract_set, CanonicalValue};
pub use fields::{field, fields_for, Cardinality, FieldSpec, FIELDS};
pub use operation::{Action, Change, ChangeAction, Operation, OperationAction};
pub use orchestrator::{RecordOutcome, RunContext, SyncOrchestrator, SyncReport};
pub use payload::{CreatePayload, FileAttachment, MediaAttachment, NewValue, PayloadBuilder};
pub use resolve::resolve;
pub use source::{PropertyEntry, SourceRecord};
pub use state::RecordState;
pub use store::{SourceStore, TargetStore};
pub use target::{FileValueKind, RecordKind, TargetRecord, TargetRef, TypedValue, ValueKind};
pub use vocabulary::{ControlledVocabulary, VocabularyIndex, VocabularyNode};
