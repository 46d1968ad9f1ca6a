//! Source records as delivered by the Omeka S API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One property value on a source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyEntry {
    /// Plain literal (`@value`)
    Literal { property_id: u32, value: String },
    /// Labelled URI (`@id` plus `o:label`)
    UriRef {
        property_id: u32,
        label: String,
        iri: String,
    },
}

impl PropertyEntry {
    pub fn literal(property_id: u32, value: impl Into<String>) -> Self {
        PropertyEntry::Literal {
            property_id,
            value: value.into(),
        }
    }

    pub fn uri(property_id: u32, label: impl Into<String>, iri: impl Into<String>) -> Self {
        PropertyEntry::UriRef {
            property_id,
            label: label.into(),
            iri: iri.into(),
        }
    }

    pub fn property_id(&self) -> u32 {
        match self {
            PropertyEntry::Literal { property_id, .. } => *property_id,
            PropertyEntry::UriRef { property_id, .. } => *property_id,
        }
    }
}

/// Snapshot of an Omeka item or media record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Omeka internal id (`o:id`), used to list an item's media
    pub omeka_id: Option<u64>,
    /// Last modification time (`o:modified`)
    pub modified: Option<DateTime<Utc>>,
    /// Whether the record is publicly visible (`o:is_public`)
    pub is_public: bool,
    /// Download location of the attached file, media records only
    pub original_url: Option<String>,
    /// Property entries keyed by term, e.g. `dcterms:title`
    pub properties: BTreeMap<String, Vec<PropertyEntry>>,
}

/// Term holding the stable external identifier.
pub const IDENTIFIER_TERM: &str = "dcterms:identifier";
/// Omeka property id of `dcterms:identifier`.
pub const IDENTIFIER_PROPERTY_ID: u32 = 10;

impl SourceRecord {
    pub fn new() -> Self {
        Self {
            is_public: true,
            ..Default::default()
        }
    }

    /// Builder-style helper that appends an entry under `term`.
    pub fn with_entry(mut self, term: &str, entry: PropertyEntry) -> Self {
        self.properties
            .entry(term.to_string())
            .or_default()
            .push(entry);
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Entries stored under a term; empty when the term is absent.
    pub fn entries(&self, term: &str) -> &[PropertyEntry] {
        self.properties
            .get(term)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The stable external identifier, if the record carries a non-empty one.
    pub fn identifier(&self) -> Option<&str> {
        self.entries(IDENTIFIER_TERM).iter().find_map(|e| match e {
            PropertyEntry::Literal { property_id, value }
                if *property_id == IDENTIFIER_PROPERTY_ID && !value.is_empty() =>
            {
                Some(value.as_str())
            }
            _ => None,
        })
    }
}
