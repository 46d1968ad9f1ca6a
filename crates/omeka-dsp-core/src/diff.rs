//! Field-by-field comparison of a source record against its target snapshot.
//!
//! Scalar fields follow a five-case table (create, update, delete or nothing).
//! Multi-valued fields are compared as sets and only ever produce creates and
//! deletes: a value that changes, even only in case or whitespace, becomes a
//! delete of the old value plus a create of the new one.

use std::collections::BTreeSet;

use crate::extract::{extract_field, CanonicalValue};
use crate::fields::{fields_for, Cardinality, FieldSpec};
use crate::operation::Change;
use crate::source::SourceRecord;
use crate::target::TargetRecord;
use crate::vocabulary::VocabularyIndex;

/// Scalar rule: compare the target's value with the source's.
pub fn sync_scalar(field: &FieldSpec, old: &str, new: &str) -> Option<Change> {
    match (old.is_empty(), new.is_empty()) {
        (true, true) => None,
        (true, false) => Some(Change::create(field.name, field.kind, Cardinality::Scalar, new)),
        (false, true) => Some(Change::delete(field.name, field.kind, Cardinality::Scalar, old)),
        (false, false) if old != new => Some(Change::update(
            field.name,
            field.kind,
            Cardinality::Scalar,
            old,
            new,
        )),
        (false, false) => None,
    }
}

/// Set rule: create what is new, delete what is gone, never update.
pub fn sync_set(field: &FieldSpec, old: &BTreeSet<String>, new: &BTreeSet<String>) -> Vec<Change> {
    let creates = new
        .difference(old)
        .map(|v| Change::create(field.name, field.kind, Cardinality::Set, v.as_str()));
    let deletes = old
        .difference(new)
        .map(|v| Change::delete(field.name, field.kind, Cardinality::Set, v.as_str()));
    creates.chain(deletes).collect()
}

/// Computes the changes that make a target record match a source record.
pub struct RecordDiffer<'a> {
    vocabularies: &'a VocabularyIndex,
}

impl<'a> RecordDiffer<'a> {
    pub fn new(vocabularies: &'a VocabularyIndex) -> Self {
        Self { vocabularies }
    }

    /// Diff every field declared on the target's record kind.
    pub fn diff(&self, source: &SourceRecord, target: &TargetRecord) -> Vec<Change> {
        fields_for(target.kind)
            .flat_map(|field| self.diff_field(source, target, field))
            .collect()
    }

    /// Diff one field. Vocabulary-backed fields with an unresolvable label
    /// yield no changes.
    pub fn diff_field(
        &self,
        source: &SourceRecord,
        target: &TargetRecord,
        field: &FieldSpec,
    ) -> Vec<Change> {
        let Some(new) = self.canonical(source, field) else {
            return Vec::new();
        };

        match new {
            CanonicalValue::Scalar(new) => {
                sync_scalar(field, target.scalar(field.name), &new).into_iter().collect()
            }
            CanonicalValue::Set(new) => sync_set(field, &target.set(field.name), &new),
        }
    }

    /// Source value of a field in the form stored on the target: vocabulary
    /// labels are replaced by node IRIs.
    pub fn canonical(&self, source: &SourceRecord, field: &FieldSpec) -> Option<CanonicalValue> {
        self.resolve_labels(field, extract_field(source, field))
    }

    /// Replace vocabulary labels in an extracted value by node IRIs. `None`
    /// when any label has no node.
    pub fn resolve_labels(&self, field: &FieldSpec, value: CanonicalValue) -> Option<CanonicalValue> {
        let Some(vocabulary) = field.vocabulary else {
            return Some(value);
        };

        match value {
            CanonicalValue::Scalar(label) if label.is_empty() => Some(CanonicalValue::Scalar(label)),
            CanonicalValue::Scalar(label) => self
                .vocabularies
                .resolve(vocabulary, &label)
                .map(|iri| CanonicalValue::Scalar(iri.to_string())),
            CanonicalValue::Set(labels) => {
                let mut resolved = BTreeSet::new();
                let mut complete = true;
                for label in &labels {
                    match self.vocabularies.resolve(vocabulary, label) {
                        Some(iri) => {
                            resolved.insert(iri.to_string());
                        }
                        None => complete = false,
                    }
                }
                complete.then_some(CanonicalValue::Set(resolved))
            }
        }
    }
}
