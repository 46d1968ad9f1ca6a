//! Configuration for omeka-dsp-core
//!
//! Everything the engine needs to know about the target project is carried in
//! an explicit [`SyncConfig`] handed to the orchestrator, so several projects
//! can be synchronised from the same process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::target::RecordKind;

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Target ontology naming
    pub ontology: OntologyConfig,
    /// Run behaviour
    pub run: RunOptions,
    /// Content type to media class mapping
    pub media_types: MediaTypeTable,
}

/// Naming of the project ontology on the DSP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// DSP API host, e.g. `https://api.dasch.swiss`
    pub api_host: String,
    /// Four-character project shortcode
    pub shortcode: String,
    /// Ontology name, also used as the JSON-LD prefix
    pub name: String,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            api_host: "http://0.0.0.0:3333".to_string(),
            shortcode: "0856".to_string(),
            name: "StadtGeschichteBasel_v1".to_string(),
        }
    }
}

impl OntologyConfig {
    pub fn ontology_iri(&self) -> String {
        format!(
            "{}/ontology/{}/{}/v2#",
            self.api_host.trim_end_matches('/'),
            self.shortcode,
            self.name
        )
    }

    /// Prefixed property or class name, e.g. `StadtGeschichteBasel_v1:title`.
    pub fn term(&self, local: &str) -> String {
        format!("{}:{}", self.name, local)
    }

    /// Strip the ontology prefix from a JSON-LD key.
    pub fn local_name<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
    }

    /// JSON-LD `@context` for request bodies.
    pub fn context(&self) -> serde_json::Value {
        serde_json::json!({
            "rdf": "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
            "knora-api": "http://api.knora.org/ontology/knora-api/v2#",
            "rdfs": "http://www.w3.org/2000/01/rdf-schema#",
            (self.name.clone()): self.ontology_iri(),
        })
    }
}

/// Run behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Maximum top-level records processed concurrently
    pub workers: usize,
    /// Compute and log changes without writing anything
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            dry_run: false,
        }
    }
}

/// Content types accepted for each media file family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaTypeTable {
    pub image: BTreeSet<String>,
    pub document: BTreeSet<String>,
    pub text: BTreeSet<String>,
    pub archive: BTreeSet<String>,
}

impl Default for MediaTypeTable {
    fn default() -> Self {
        fn set(types: &[&str]) -> BTreeSet<String> {
            types.iter().map(|t| t.to_string()).collect()
        }
        Self {
            image: set(&["image/tiff", "image/jpg", "image/jpeg", "image/png", "image/gif"]),
            document: set(&["application/pdf"]),
            text: set(&["text/csv", "text/markdown", "text/plain", "application/json"]),
            archive: BTreeSet::new(),
        }
    }
}

impl MediaTypeTable {
    /// Media record kind for a content type, matched case-insensitively.
    pub fn classify(&self, content_type: &str) -> Option<RecordKind> {
        let normalized = content_type.trim().to_ascii_lowercase();
        if self.image.contains(&normalized) {
            Some(RecordKind::MediaImage)
        } else if self.text.contains(&normalized) {
            Some(RecordKind::MediaText)
        } else if self.document.contains(&normalized) {
            Some(RecordKind::MediaDocument)
        } else if self.archive.contains(&normalized) {
            Some(RecordKind::MediaArchive)
        } else {
            None
        }
    }
}

impl SyncConfig {
    pub fn new(ontology: OntologyConfig) -> Self {
        Self {
            ontology,
            ..Default::default()
        }
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ontology.api_host.trim().is_empty() {
            return Err(ConfigError::MissingField("ontology.api_host".to_string()));
        }
        if self.ontology.shortcode.trim().is_empty() {
            return Err(ConfigError::MissingField("ontology.shortcode".to_string()));
        }
        if self.ontology.name.trim().is_empty() {
            return Err(ConfigError::MissingField("ontology.name".to_string()));
        }
        if self.run.workers == 0 {
            return Err(ConfigError::OutOfRange(
                "run.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// Required field is missing
    #[error("Missing field: {0}")]
    MissingField(String),
}
