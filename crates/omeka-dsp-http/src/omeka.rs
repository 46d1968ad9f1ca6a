//! Omeka S source client
//!
//! API docs: https://omeka.org/s/docs/developer/api/

use async_trait::async_trait;
use omeka_dsp_core::wire::parse_timestamp;
use omeka_dsp_core::{PropertyEntry, Result, SourceRecord, SourceStore, SyncError};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::OmekaConfig;
use crate::http::{HttpClient, HttpError};

/// Items fetched per page.
pub const PER_PAGE: &str = "100";

#[derive(Debug, Deserialize)]
struct OmekaLiteral {
    #[serde(rename = "@value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct OmekaValue {
    property_id: u32,
    #[serde(rename = "@value")]
    value: Option<Value>,
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "o:label")]
    label: Option<String>,
}

/// Text of a literal; numbers and booleans keep their JSON spelling.
fn literal_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

impl OmekaValue {
    fn into_entry(self) -> Option<PropertyEntry> {
        match (self.value.and_then(literal_text), self.id) {
            (Some(value), _) => Some(PropertyEntry::literal(self.property_id, value)),
            (None, Some(iri)) => Some(PropertyEntry::uri(
                self.property_id,
                self.label.unwrap_or_default(),
                iri,
            )),
            (None, None) => None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct OmekaResource {
    #[serde(rename = "o:id")]
    id: Option<u64>,
    #[serde(rename = "o:modified")]
    modified: Option<OmekaLiteral>,
    #[serde(rename = "o:is_public", default = "default_true")]
    is_public: bool,
    #[serde(rename = "o:original_url")]
    original_url: Option<String>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl OmekaResource {
    fn into_record(self) -> SourceRecord {
        let mut record = SourceRecord::new();
        record.omeka_id = self.id;
        record.modified = self.modified.and_then(|m| parse_timestamp(&m.value));
        record.is_public = self.is_public;
        record.original_url = self.original_url.filter(|url| !url.is_empty());

        for (term, value) in self.properties {
            // Property values are arrays of objects carrying `property_id`.
            let Value::Array(values) = value else {
                continue;
            };
            for raw in values {
                if raw.get("property_id").is_none() {
                    continue;
                }
                let entry = serde_json::from_value::<OmekaValue>(raw)
                    .map_err(|e| e.to_string())
                    .and_then(|v| v.into_entry().ok_or_else(|| "no value or URI".to_string()));
                match entry {
                    Ok(entry) => record = record.with_entry(&term, entry),
                    Err(e) => tracing::warn!(
                        "item {:?}: skipping a '{}' value: {}",
                        record.omeka_id,
                        term,
                        e
                    ),
                }
            }
        }

        record
    }
}

/// Parse one page of an items or media listing.
pub fn parse_resources(json: &str) -> Result<Vec<SourceRecord>> {
    let resources: Vec<OmekaResource> = serde_json::from_str(json)?;
    Ok(resources
        .into_iter()
        .map(OmekaResource::into_record)
        .collect())
}

pub struct OmekaClient {
    http: HttpClient,
    config: OmekaConfig,
}

impl OmekaClient {
    pub fn new(config: OmekaConfig) -> std::result::Result<Self, HttpError> {
        let http = HttpClient::new(
            concat!("omeka2dsp/", env!("CARGO_PKG_VERSION")),
            config.timeout(),
        )?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> Result<String> {
        let base = url::Url::parse(&self.config.base_url())
            .map_err(|e| SyncError::RemoteUnavailable(format!("Invalid Omeka URL: {}", e)))?;
        base.join(path)
            .map(|u| u.to_string())
            .map_err(|e| SyncError::RemoteUnavailable(format!("Invalid Omeka URL: {}", e)))
    }

    /// Fetch every page, following `rel="next"` links.
    async fn get_paginated(&self, url: &str, params: &[(&str, &str)]) -> Result<Vec<SourceRecord>> {
        let mut records = Vec::new();
        let mut response = self.http.get_with_params(url, params).await?;

        loop {
            let page = response.error_for_status()?;
            records.extend(parse_resources(&page.body)?);

            let Some(next) = page.next_link() else {
                break;
            };
            tracing::debug!("Fetching next page: {}", next);
            response = self.http.get(&next, None).await?;
        }

        Ok(records)
    }

    /// All items of the configured item set.
    pub async fn items(&self) -> Result<Vec<SourceRecord>> {
        let url = self.endpoint("items")?;
        let params = [
            ("item_set_id", self.config.item_set_id.as_str()),
            ("key_identity", self.config.key_identity.as_str()),
            ("key_credential", self.config.key_credential.as_str()),
            ("per_page", PER_PAGE),
        ];
        let items = self.get_paginated(&url, &params).await?;
        tracing::info!("Fetched {} items from item set {}", items.len(), self.config.item_set_id);
        Ok(items)
    }

    /// Media attached to an item.
    pub async fn media(&self, item_id: u64) -> Result<Vec<SourceRecord>> {
        let url = self.endpoint("media")?;
        let item_id = item_id.to_string();
        let params = [
            ("item_id", item_id.as_str()),
            ("key_identity", self.config.key_identity.as_str()),
            ("key_credential", self.config.key_credential.as_str()),
        ];
        self.get_paginated(&url, &params).await
    }
}

#[async_trait]
impl SourceStore for OmekaClient {
    async fn list_records(&self) -> Result<Vec<SourceRecord>> {
        self.items().await
    }

    async fn list_media(&self, record: &SourceRecord) -> Result<Vec<SourceRecord>> {
        match record.omeka_id {
            Some(id) => self.media(id).await,
            None => Ok(Vec::new()),
        }
    }
}
