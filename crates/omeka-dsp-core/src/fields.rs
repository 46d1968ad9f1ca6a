//! Declared fields shared by the Omeka and DSP data models.

use serde::{Deserialize, Serialize};

use crate::target::{RecordKind, ValueKind};

/// How many values a field holds on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// At most one value
    Scalar,
    /// Zero or more values, unique by decoded value
    Set,
}

/// Which part of a source entry a scalar field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarSource {
    /// The literal `@value` of the first entry with the property id
    Value,
    /// The `o:label` of the first entry with the property id
    Label,
}

/// Record kinds a field is declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    All,
    ObjectOnly,
    MediaOnly,
}

impl Applicability {
    pub fn covers(&self, kind: RecordKind) -> bool {
        match self {
            Applicability::All => true,
            Applicability::ObjectOnly => !kind.is_media(),
            Applicability::MediaOnly => kind.is_media(),
        }
    }
}

/// A field synchronised between the two stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Property name in the target ontology (without prefix)
    pub name: &'static str,
    /// Omeka term holding the source entries
    pub term: &'static str,
    /// Omeka property id; scalar extraction filters on it
    pub property_id: u32,
    pub cardinality: Cardinality,
    pub scalar_source: ScalarSource,
    pub kind: ValueKind,
    /// Controlled vocabulary backing a `List` field
    pub vocabulary: Option<&'static str>,
    pub applies_to: Applicability,
}

impl FieldSpec {
    const fn scalar(name: &'static str, term: &'static str, property_id: u32, kind: ValueKind) -> Self {
        Self {
            name,
            term,
            property_id,
            cardinality: Cardinality::Scalar,
            scalar_source: ScalarSource::Value,
            kind,
            vocabulary: None,
            applies_to: Applicability::All,
        }
    }

    const fn set(name: &'static str, term: &'static str, property_id: u32) -> Self {
        Self {
            name,
            term,
            property_id,
            cardinality: Cardinality::Set,
            scalar_source: ScalarSource::Value,
            kind: ValueKind::Text,
            vocabulary: None,
            applies_to: Applicability::All,
        }
    }

    const fn vocabulary(mut self, vocabulary: &'static str) -> Self {
        self.kind = ValueKind::List;
        self.vocabulary = Some(vocabulary);
        self
    }

    const fn by_label(mut self) -> Self {
        self.scalar_source = ScalarSource::Label;
        self
    }

    const fn only(mut self, applies_to: Applicability) -> Self {
        self.applies_to = applies_to;
        self
    }

    pub fn is_set(&self) -> bool {
        self.cardinality == Cardinality::Set
    }
}

/// Field carrying the title, also used as the resource label.
pub const TITLE: &str = "title";
/// Field carrying the stable identifier.
pub const IDENTIFIER: &str = "identifier";
/// Link from a media record to the record it belongs to.
pub const PARENT_LINK: &str = "partOf_MetadataValue";

/// Every field the synchroniser reads and writes, in payload order.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::scalar(IDENTIFIER, "dcterms:identifier", 10, ValueKind::Text),
    FieldSpec::scalar(TITLE, "dcterms:title", 1, ValueKind::Text),
    FieldSpec::scalar("description", "dcterms:description", 4, ValueKind::Text),
    FieldSpec::set("subject", "dcterms:subject", 3).vocabulary("Thema"),
    FieldSpec::scalar("temporal", "dcterms:temporal", 41, ValueKind::List).vocabulary("Era"),
    FieldSpec::scalar("language", "dcterms:language", 12, ValueKind::Text),
    FieldSpec::set("isPartOf", "dcterms:isPartOf", 33).only(Applicability::ObjectOnly),
    FieldSpec::set("creator", "dcterms:creator", 2).only(Applicability::MediaOnly),
    FieldSpec::set("publisher", "dcterms:publisher", 5).only(Applicability::MediaOnly),
    FieldSpec::scalar("date", "dcterms:date", 7, ValueKind::Text).only(Applicability::MediaOnly),
    FieldSpec::scalar("extent", "dcterms:extent", 25, ValueKind::Text).only(Applicability::MediaOnly),
    FieldSpec::scalar("type", "dcterms:type", 8, ValueKind::List)
        .vocabulary("DCMI Type Vocabulary")
        .by_label()
        .only(Applicability::MediaOnly),
    FieldSpec::scalar("format", "dcterms:format", 9, ValueKind::List)
        .vocabulary("Internet Media Type")
        .only(Applicability::MediaOnly),
    FieldSpec::set("source", "dcterms:source", 11).only(Applicability::MediaOnly),
    FieldSpec::set("relation", "dcterms:relation", 13).only(Applicability::MediaOnly),
    FieldSpec::scalar("rights", "dcterms:rights", 15, ValueKind::Text).only(Applicability::MediaOnly),
    FieldSpec::scalar("license", "dcterms:license", 49, ValueKind::Uri).only(Applicability::MediaOnly),
];

/// Look up a declared field by target name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Fields declared on a record kind.
pub fn fields_for(kind: RecordKind) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |f| f.applies_to.covers(kind))
}

/// Omeka term holding a media record's content type.
pub const FORMAT_TERM: &str = "dcterms:format";
/// Omeka property id of `dcterms:format`.
pub const FORMAT_PROPERTY_ID: u32 = 9;
