//! Creation payloads for records that do not exist on the target yet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::MediaTypeTable;
use crate::diff::RecordDiffer;
use crate::error::{Result, SyncError};
use crate::extract::{extract_present, extract_scalar, CanonicalValue};
use crate::fields::{fields_for, FieldSpec, FORMAT_PROPERTY_ID, FORMAT_TERM, PARENT_LINK, TITLE};
use crate::source::SourceRecord;
use crate::target::{FileValueKind, RecordKind, ValueKind};
use crate::vocabulary::VocabularyIndex;

/// A value to be written, before the target has assigned it a node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewValue {
    Text(String),
    ListRef(String),
    Uri(String),
    Link(String),
}

impl NewValue {
    pub fn of_kind(kind: ValueKind, value: impl Into<String>) -> Self {
        let value = value.into();
        match kind {
            ValueKind::Text => NewValue::Text(value),
            ValueKind::List => NewValue::ListRef(value),
            ValueKind::Uri => NewValue::Uri(value),
            ValueKind::Link => NewValue::Link(value),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            NewValue::Text(_) => ValueKind::Text,
            NewValue::ListRef(_) => ValueKind::List,
            NewValue::Uri(_) => ValueKind::Uri,
            NewValue::Link(_) => ValueKind::Link,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NewValue::Text(v) | NewValue::ListRef(v) | NewValue::Uri(v) | NewValue::Link(v) => v,
        }
    }
}

/// Uploaded file and owning record a media payload requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    /// Filename assigned by the ingest service
    pub internal_filename: String,
    pub parent_iri: String,
}

/// File value attached to a media payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub kind: FileValueKind,
    pub internal_filename: String,
}

/// Everything needed to create one target record.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePayload {
    pub identifier: String,
    pub kind: RecordKind,
    /// Resource label
    pub label: String,
    /// Values keyed by field name without ontology prefix
    pub fields: BTreeMap<String, Vec<NewValue>>,
    pub file: Option<FileAttachment>,
}

impl CreatePayload {
    pub fn values(&self, field: &str) -> &[NewValue] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Point the file value at an uploaded asset. No-op without a file value.
    pub fn set_internal_filename(&mut self, internal_filename: impl Into<String>) {
        if let Some(file) = self.file.as_mut() {
            file.internal_filename = internal_filename.into();
        }
    }
}

/// Builds creation payloads, resolving vocabulary labels on the way.
pub struct PayloadBuilder<'a> {
    vocabularies: &'a VocabularyIndex,
    media_types: &'a MediaTypeTable,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(vocabularies: &'a VocabularyIndex, media_types: &'a MediaTypeTable) -> Self {
        Self {
            vocabularies,
            media_types,
        }
    }

    /// Payload for a plain metadata record.
    pub fn build_record(&self, source: &SourceRecord) -> Result<CreatePayload> {
        self.build(source, RecordKind::Object)
    }

    /// Record kind of a media source, from its declared content type.
    pub fn media_kind(&self, source: &SourceRecord) -> Result<RecordKind> {
        let content_type = extract_scalar(source.entries(FORMAT_TERM), FORMAT_PROPERTY_ID);
        RecordKind::for_content_type(&content_type, self.media_types)
    }

    /// Payload for a media record.
    ///
    /// The content type is checked before the attachment, so an unsupported
    /// type is reported even when nothing was uploaded.
    pub fn build_media(
        &self,
        source: &SourceRecord,
        attachment: Option<&MediaAttachment>,
    ) -> Result<CreatePayload> {
        let kind = self.media_kind(source)?;
        let mut payload = self.build(source, kind)?;

        let attachment = attachment
            .ok_or_else(|| SyncError::MissingMediaAttachment(payload.identifier.clone()))?;
        let file_kind = kind
            .file_value()
            .ok_or_else(|| SyncError::UnsupportedMediaType(kind.to_string()))?;

        payload.file = Some(FileAttachment {
            kind: file_kind,
            internal_filename: attachment.internal_filename.clone(),
        });
        payload.fields.insert(
            PARENT_LINK.to_string(),
            vec![NewValue::Link(attachment.parent_iri.clone())],
        );
        Ok(payload)
    }

    fn build(&self, source: &SourceRecord, kind: RecordKind) -> Result<CreatePayload> {
        let identifier = source
            .identifier()
            .ok_or_else(|| SyncError::MalformedSourceRecord("missing identifier".into()))?
            .to_string();

        let differ = RecordDiffer::new(self.vocabularies);
        let fields: BTreeMap<String, Vec<NewValue>> = fields_for(kind)
            .filter_map(|field| {
                let value = differ.resolve_labels(field, extract_present(source, field)?)?;
                Some((field.name.to_string(), Self::wrap(field, value)))
            })
            .collect();

        let label = fields
            .get(TITLE)
            .and_then(|v| v.first())
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| identifier.clone());

        Ok(CreatePayload {
            identifier,
            kind,
            label,
            fields,
            file: None,
        })
    }

    fn wrap(field: &FieldSpec, value: CanonicalValue) -> Vec<NewValue> {
        match value {
            CanonicalValue::Scalar(v) => vec![NewValue::of_kind(field.kind, v)],
            CanonicalValue::Set(values) => values
                .into_iter()
                .map(|v| NewValue::of_kind(field.kind, v))
                .collect(),
        }
    }
}
