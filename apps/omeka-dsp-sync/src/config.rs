//! Configuration file loading
//!
//! The file mirrors [`AppConfig`]:
//!
//! ```toml
//! [omeka]
//! api_url = "https://omeka.unibe.ch/api/"
//! key_identity = "…"
//! key_credential = "…"
//! item_set_id = "10780"
//!
//! [dsp]
//! api_host = "https://api.dasch.swiss"
//! ingest_host = "https://ingest.dasch.swiss"
//! shortcode = "0856"
//! user = "sync@example.org"
//!
//! [sync.ontology]
//! name = "StadtGeschichteBasel_v1"
//!
//! [sync.run]
//! workers = 4
//! ```
//!
//! Environment variables override file values; `DSP_PWD` is usually only
//! given there.

use std::path::Path;

use omeka_dsp_core::{ConfigError, SyncConfig};
use omeka_dsp_http::{DspConfig, OmekaConfig};
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading the configuration
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read config file: {0}")]
    Io(String),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub omeka: OmekaConfig,
    pub dsp: DspConfig,
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read `path` if given, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let mut config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| LoadError::Io(e.to_string()))?;
                Self::from_toml(&content).map_err(|e| LoadError::Parse(e.to_string()))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.align_ontology();
        config.validate()?;
        Ok(config)
    }

    /// Override values with the variables `lookup` returns.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overrides: [(&str, &mut String); 10] = [
            ("OMEKA_API_URL", &mut self.omeka.api_url),
            ("KEY_IDENTITY", &mut self.omeka.key_identity),
            ("KEY_CREDENTIAL", &mut self.omeka.key_credential),
            ("ITEM_SET_ID", &mut self.omeka.item_set_id),
            ("PROJECT_SHORT_CODE", &mut self.dsp.shortcode),
            ("API_HOST", &mut self.dsp.api_host),
            ("INGEST_HOST", &mut self.dsp.ingest_host),
            ("DSP_USER", &mut self.dsp.user),
            ("DSP_PWD", &mut self.dsp.password),
            ("ONTOLOGY_NAME", &mut self.sync.ontology.name),
        ];

        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }

    /// The ontology lives on the DSP host and project being written to.
    pub fn align_ontology(&mut self) {
        self.sync.ontology = self.dsp.ontology(&self.sync.ontology.name);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.omeka.validate()?;
        self.dsp.validate()?;
        self.sync.validate()
    }
}
