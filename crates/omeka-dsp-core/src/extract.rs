//! Canonical values extracted from Omeka property entries.
//!
//! Multi-valued fields are reduced to a set of strings. URI entries are
//! rendered as Markdown-style links (`[label](iri)`) and every occurrence of
//! the set delimiter inside a value is escaped, so a set can later be joined
//! into a single string and split again without losing value boundaries.

use std::collections::BTreeSet;

use crate::fields::{FieldSpec, ScalarSource};
use crate::source::{PropertyEntry, SourceRecord};

/// Delimiter used when a set is serialised to one string.
pub const SET_DELIMITER: char = ';';
/// Escape sequence standing in for a literal delimiter.
pub const ESCAPED_DELIMITER: &str = "&#59";

/// Result of extracting a declared field from a source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    Scalar(String),
    Set(BTreeSet<String>),
}

impl CanonicalValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CanonicalValue::Scalar(v) => v.is_empty(),
            CanonicalValue::Set(s) => s.is_empty(),
        }
    }
}

/// Literal value of the first entry with `property_id`, or `""`.
///
/// A matching URI entry has no literal value and yields `""`.
pub fn extract_scalar(entries: &[PropertyEntry], property_id: u32) -> String {
    entries
        .iter()
        .find(|e| e.property_id() == property_id)
        .map(|e| match e {
            PropertyEntry::Literal { value, .. } => value.clone(),
            PropertyEntry::UriRef { .. } => String::new(),
        })
        .unwrap_or_default()
}

/// Label of the first URI entry with `property_id`, or `""`.
pub fn extract_label(entries: &[PropertyEntry], property_id: u32) -> String {
    entries
        .iter()
        .find(|e| e.property_id() == property_id)
        .map(|e| match e {
            PropertyEntry::UriRef { label, .. } => label.clone(),
            PropertyEntry::Literal { .. } => String::new(),
        })
        .unwrap_or_default()
}

/// All literal values and labelled URIs as an escaped set.
pub fn extract_set(entries: &[PropertyEntry]) -> BTreeSet<String> {
    entries
        .iter()
        .map(|e| match e {
            PropertyEntry::Literal { value, .. } => escape(value),
            PropertyEntry::UriRef { label, iri, .. } => {
                format!("[{}]({})", escape(label), escape(iri))
            }
        })
        .filter(|v| !v.is_empty())
        .collect()
}

/// Extract a declared field according to its cardinality.
pub fn extract_field(record: &SourceRecord, field: &FieldSpec) -> CanonicalValue {
    let entries = record.entries(field.term);
    if field.is_set() {
        CanonicalValue::Set(extract_set(entries))
    } else {
        CanonicalValue::Scalar(match field.scalar_source {
            ScalarSource::Value => extract_scalar(entries, field.property_id),
            ScalarSource::Label => extract_label(entries, field.property_id),
        })
    }
}

/// Like [`extract_field`], but `None` when the source has no data for it.
pub fn extract_present(record: &SourceRecord, field: &FieldSpec) -> Option<CanonicalValue> {
    let value = extract_field(record, field);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn escape(value: &str) -> String {
    value.replace(SET_DELIMITER, ESCAPED_DELIMITER)
}

pub fn unescape(value: &str) -> String {
    value.replace(ESCAPED_DELIMITER, &SET_DELIMITER.to_string())
}

/// Join an extracted set into one delimited string.
pub fn serialize_set(values: &BTreeSet<String>) -> String {
    let delimiter = SET_DELIMITER.to_string();
    values
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(delimiter.as_str())
}

/// Split a delimited string back into the original, unescaped values.
pub fn deserialize_set(serialized: &str) -> BTreeSet<String> {
    serialized
        .split(SET_DELIMITER)
        .filter(|v| !v.is_empty())
        .map(unescape)
        .collect()
}
