//! Connection settings for the two remote APIs

use omeka_dsp_core::{ConfigError, OntologyConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Omeka S API access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmekaConfig {
    /// API base, e.g. `https://omeka.unibe.ch/api/`
    pub api_url: String,
    pub key_identity: String,
    pub key_credential: String,
    /// Item set whose items are synchronised
    pub item_set_id: String,
    pub timeout_secs: u64,
}

impl Default for OmekaConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            key_identity: String::new(),
            key_credential: String::new(),
            item_set_id: String::new(),
            timeout_secs: 30,
        }
    }
}

impl OmekaConfig {
    /// API base with a trailing slash, so relative endpoints join under it.
    pub fn base_url(&self) -> String {
        if self.api_url.ends_with('/') {
            self.api_url.clone()
        } else {
            format!("{}/", self.api_url)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::MissingField("OMEKA_API_URL".to_string()));
        }
        if self.item_set_id.trim().is_empty() {
            return Err(ConfigError::MissingField("ITEM_SET_ID".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "omeka.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// DSP API access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DspConfig {
    /// API host, e.g. `https://api.dasch.swiss`
    pub api_host: String,
    /// Ingest service host for asset uploads
    pub ingest_host: String,
    /// Project shortcode
    pub shortcode: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            api_host: "http://0.0.0.0:3333".to_string(),
            ingest_host: "http://0.0.0.0:3340".to_string(),
            shortcode: "0856".to_string(),
            user: String::new(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl DspConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_host.trim_end_matches('/'), path)
    }

    pub fn ingest_url(&self, path: &str) -> String {
        format!("{}{}", self.ingest_host.trim_end_matches('/'), path)
    }

    /// Ontology naming on this server.
    pub fn ontology(&self, name: &str) -> OntologyConfig {
        OntologyConfig {
            api_host: self.api_host.clone(),
            shortcode: self.shortcode.clone(),
            name: name.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_host.trim().is_empty() {
            return Err(ConfigError::MissingField("API_HOST".to_string()));
        }
        if self.ingest_host.trim().is_empty() {
            return Err(ConfigError::MissingField("INGEST_HOST".to_string()));
        }
        if self.shortcode.trim().is_empty() {
            return Err(ConfigError::MissingField("PROJECT_SHORT_CODE".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::MissingField("DSP_USER".to_string()));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingField("DSP_PWD".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "dsp.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
