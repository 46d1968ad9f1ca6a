//! Controlled vocabularies (DSP lists) and their flattened label index.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, SyncError};

/// A node of a controlled vocabulary tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyNode {
    pub iri: String,
    pub label: String,
    #[serde(default)]
    pub children: Vec<VocabularyNode>,
}

impl VocabularyNode {
    pub fn new(iri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: VocabularyNode) -> Self {
        self.children.push(child);
        self
    }
}

/// A named vocabulary tree as fetched for the target project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlledVocabulary {
    pub iri: String,
    /// The list's own label, e.g. `Thema`
    pub name: String,
    pub nodes: Vec<VocabularyNode>,
}

impl ControlledVocabulary {
    pub fn new(iri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: VocabularyNode) -> Self {
        self.nodes.push(node);
        self
    }
}

/// Flattened `(vocabulary, label) -> node IRI` lookup.
///
/// Lookups are exact and case-sensitive. When a label occurs more than once
/// inside one vocabulary, the first node in pre-order wins.
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    entries: HashMap<String, HashMap<String, String>>,
}

impl VocabularyIndex {
    /// Build the index from every vocabulary of a project.
    pub fn from_vocabularies(vocabularies: &[ControlledVocabulary]) -> Self {
        let mut entries: HashMap<String, HashMap<String, String>> = HashMap::new();

        for vocabulary in vocabularies {
            let labels = entries.entry(vocabulary.name.clone()).or_default();
            for node in &vocabulary.nodes {
                Self::collect(node, labels);
            }
        }

        Self { entries }
    }

    fn collect(node: &VocabularyNode, labels: &mut HashMap<String, String>) {
        labels
            .entry(node.label.clone())
            .or_insert_with(|| node.iri.clone());
        for child in &node.children {
            Self::collect(child, labels);
        }
    }

    /// Resolve a label to its node IRI.
    ///
    /// A miss is logged as a warning and returns `None`.
    pub fn resolve(&self, vocabulary: &str, label: &str) -> Option<&str> {
        match self.lookup(vocabulary, label) {
            Ok(iri) => Some(iri),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    /// Resolve a label, reporting a miss as [`SyncError::VocabularyMiss`]
    /// without logging it.
    pub fn lookup(&self, vocabulary: &str, label: &str) -> Result<&str> {
        self.entries
            .get(vocabulary)
            .and_then(|labels| labels.get(label))
            .map(String::as_str)
            .ok_or_else(|| SyncError::VocabularyMiss {
                vocabulary: vocabulary.to_string(),
                label: label.to_string(),
            })
    }

    pub fn contains_vocabulary(&self, vocabulary: &str) -> bool {
        self.entries.contains_key(vocabulary)
    }

    /// Total number of indexed labels.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
