//! Target records as stored in the DSP repository.
//!
//! DSP versions individual values rather than whole resources, so every
//! [`TypedValue`] carries its own node id that update and delete requests
//! must address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::MediaTypeTable;
use crate::error::{Result, SyncError};

/// Wire type of a value node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Text,
    List,
    Uri,
    Link,
}

impl ValueKind {
    /// The `@type` used on the wire, e.g. `knora-api:TextValue`.
    pub fn wire_type(&self) -> &'static str {
        match self {
            ValueKind::Text => "knora-api:TextValue",
            ValueKind::List => "knora-api:ListValue",
            ValueKind::Uri => "knora-api:UriValue",
            ValueKind::Link => "knora-api:LinkValue",
        }
    }

    pub fn from_wire_type(wire: &str) -> Option<Self> {
        match wire {
            "knora-api:TextValue" => Some(ValueKind::Text),
            "knora-api:ListValue" => Some(ValueKind::List),
            "knora-api:UriValue" => Some(ValueKind::Uri),
            "knora-api:LinkValue" => Some(ValueKind::Link),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Text => write!(f, "TextValue"),
            ValueKind::List => write!(f, "ListValue"),
            ValueKind::Uri => write!(f, "UriValue"),
            ValueKind::Link => write!(f, "LinkValue"),
        }
    }
}

/// One versioned value node on a target record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedValue {
    Text { value: String, node_id: String },
    ListRef { list_node: String, node_id: String },
    Uri { value: String, node_id: String },
    Link { target_iri: String, node_id: String },
}

impl TypedValue {
    pub fn node_id(&self) -> &str {
        match self {
            TypedValue::Text { node_id, .. }
            | TypedValue::ListRef { node_id, .. }
            | TypedValue::Uri { node_id, .. }
            | TypedValue::Link { node_id, .. } => node_id,
        }
    }

    /// The value in the same canonical form the differ compares against.
    pub fn decoded(&self) -> &str {
        match self {
            TypedValue::Text { value, .. } => value,
            TypedValue::ListRef { list_node, .. } => list_node,
            TypedValue::Uri { value, .. } => value,
            TypedValue::Link { target_iri, .. } => target_iri,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Text { .. } => ValueKind::Text,
            TypedValue::ListRef { .. } => ValueKind::List,
            TypedValue::Uri { .. } => ValueKind::Uri,
            TypedValue::Link { .. } => ValueKind::Link,
        }
    }
}

/// File value wrapper attached to media records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileValueKind {
    /// Resource property, e.g. `knora-api:hasStillImageFileValue`
    pub property: &'static str,
    /// Value type, e.g. `knora-api:StillImageFileValue`
    pub value_type: &'static str,
}

/// Resource classes of the target ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Plain metadata record
    Object,
    MediaImage,
    MediaDocument,
    MediaText,
    MediaArchive,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Object,
        RecordKind::MediaImage,
        RecordKind::MediaDocument,
        RecordKind::MediaText,
        RecordKind::MediaArchive,
    ];

    /// Class name inside the project ontology (without prefix).
    pub fn class_name(&self) -> &'static str {
        match self {
            RecordKind::Object => "sgb_OBJECT",
            RecordKind::MediaImage => "sgb_MEDIA_IMAGE",
            RecordKind::MediaDocument => "sgb_MEDIA_DOCUMENT",
            RecordKind::MediaText => "sgb_MEDIA_TEXT",
            RecordKind::MediaArchive => "sgb_MEDIA_ARCHIV",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.class_name() == name)
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, RecordKind::Object)
    }

    pub fn file_value(&self) -> Option<FileValueKind> {
        match self {
            RecordKind::Object => None,
            RecordKind::MediaImage => Some(FileValueKind {
                property: "knora-api:hasStillImageFileValue",
                value_type: "knora-api:StillImageFileValue",
            }),
            RecordKind::MediaDocument => Some(FileValueKind {
                property: "knora-api:hasDocumentFileValue",
                value_type: "knora-api:DocumentFileValue",
            }),
            RecordKind::MediaText => Some(FileValueKind {
                property: "knora-api:hasTextFileValue",
                value_type: "knora-api:TextFileValue",
            }),
            RecordKind::MediaArchive => Some(FileValueKind {
                property: "knora-api:hasArchiveFileValue",
                value_type: "knora-api:ArchiveFileValue",
            }),
        }
    }

    /// Pick the media record kind for a declared content type.
    pub fn for_content_type(content_type: &str, table: &MediaTypeTable) -> Result<Self> {
        table
            .classify(content_type)
            .ok_or_else(|| SyncError::UnsupportedMediaType(content_type.to_string()))
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

/// Reference to an existing target record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub iri: String,
    pub kind: RecordKind,
}

/// Full snapshot of a target record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub iri: String,
    pub kind: RecordKind,
    /// Last modification, falling back to the creation date
    pub last_modified: Option<DateTime<Utc>>,
    /// Value nodes keyed by field name without ontology prefix
    pub fields: BTreeMap<String, Vec<TypedValue>>,
}

impl TargetRecord {
    pub fn new(iri: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            iri: iri.into(),
            kind,
            last_modified: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, field: &str, value: TypedValue) -> Self {
        self.fields.entry(field.to_string()).or_default().push(value);
        self
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    pub fn reference(&self) -> TargetRef {
        TargetRef {
            iri: self.iri.clone(),
            kind: self.kind,
        }
    }

    pub fn values(&self, field: &str) -> &[TypedValue] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Decoded scalar value of a field, or `""` when absent.
    pub fn scalar(&self, field: &str) -> &str {
        self.values(field)
            .first()
            .map(TypedValue::decoded)
            .unwrap_or("")
    }

    /// Decoded values of a multi-valued field.
    pub fn set(&self, field: &str) -> std::collections::BTreeSet<String> {
        self.values(field)
            .iter()
            .map(|v| v.decoded().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }
}
