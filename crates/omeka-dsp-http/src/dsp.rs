//! DSP target client
//!
//! API docs: https://docs.dasch.swiss/latest/DSP-API/03-endpoints/

use async_trait::async_trait;
use omeka_dsp_core::wire::{
    decode_search_result, decode_target_record, decode_vocabulary, encode_create_payload,
    encode_value_request, lookup_query,
};
use omeka_dsp_core::{
    Action, ControlledVocabulary, CreatePayload, OntologyConfig, Operation, RecordKind, Result,
    SyncError, TargetRecord, TargetRef, TargetStore,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::config::DspConfig;
use crate::http::{HttpClient, HttpError, HttpResponse};

const SPARQL_CONTENT_TYPE: &str = "application/sparql-query; charset=utf-8";

// ===== Response Types =====

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    project: ProjectInfo,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListsResponse {
    #[serde(default)]
    lists: Vec<ListInfo>,
}

#[derive(Debug, Deserialize)]
struct ListInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestResponse {
    internal_filename: String,
}

// ===== Response Parsing =====

/// Access token from `POST /v2/authentication`.
pub fn parse_token(json: &str) -> Result<String> {
    let response: TokenResponse = serde_json::from_str(json)?;
    Ok(response.token)
}

/// Project IRI from `GET /admin/projects/shortcode/{shortcode}`.
pub fn parse_project_iri(json: &str) -> Result<String> {
    let response: ProjectResponse = serde_json::from_str(json)?;
    Ok(response.project.id)
}

/// Root node IRIs from `GET /admin/lists?projectIri=…`.
pub fn parse_list_iris(json: &str) -> Result<Vec<String>> {
    let response: ListsResponse = serde_json::from_str(json)?;
    Ok(response.lists.into_iter().map(|l| l.id).collect())
}

/// IRI of a newly created resource.
pub fn parse_created_iri(json: &str) -> Result<String> {
    let response: CreatedResource = serde_json::from_str(json)?;
    Ok(response.id)
}

/// Internal filename assigned by the ingest service.
pub fn parse_internal_filename(json: &str) -> Result<String> {
    let response: IngestResponse = serde_json::from_str(json)?;
    Ok(response.internal_filename)
}

/// Last path segment of a download URL.
pub fn filename_from_url(source_url: &str) -> Result<String> {
    let url = url::Url::parse(source_url)
        .map_err(|e| SyncError::MalformedSourceRecord(format!("{}: {}", source_url, e)))?;
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(|name| {
            urlencoding::decode(name)
                .map(|n| n.into_owned())
                .unwrap_or_else(|_| name.to_string())
        })
        .ok_or_else(|| {
            SyncError::MalformedSourceRecord(format!("no filename in URL {}", source_url))
        })
}

// ===== Client =====

pub struct DspClient {
    http: HttpClient,
    config: DspConfig,
    ontology: OntologyConfig,
    token: RwLock<Option<String>>,
}

impl DspClient {
    pub fn new(config: DspConfig, ontology: OntologyConfig) -> std::result::Result<Self, HttpError> {
        let http = HttpClient::new(
            concat!("omeka2dsp/", env!("CARGO_PKG_VERSION")),
            config.timeout(),
        )?;
        Ok(Self {
            http,
            config,
            ontology,
            token: RwLock::new(None),
        })
    }

    pub fn ontology(&self) -> &OntologyConfig {
        &self.ontology
    }

    async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn get(&self, path: &str) -> Result<HttpResponse> {
        let token = self.token().await;
        let response = self
            .http
            .get(&self.config.api_url(path), token.as_deref())
            .await?;
        Ok(response.error_for_status()?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let token = self.token().await;
        let response = self
            .http
            .send_json(
                method,
                &self.config.api_url(path),
                body,
                token.as_deref(),
                headers,
            )
            .await?;
        Ok(response.error_for_status()?)
    }

    async fn vocabulary(&self, list_iri: &str) -> Result<ControlledVocabulary> {
        let path = format!("/v2/lists/{}", urlencoding::encode(list_iri));
        let response = self.get(&path).await?;
        decode_vocabulary(&response.body)
    }
}

#[async_trait]
impl TargetStore for DspClient {
    async fn authenticate(&self) -> Result<()> {
        let body = json!({
            "email": self.config.user,
            "password": self.config.password,
        });
        let response = self
            .http
            .send_json(
                Method::POST,
                &self.config.api_url("/v2/authentication"),
                &body,
                None,
                &[],
            )
            .await
            .and_then(HttpResponse::error_for_status)
            .map_err(|e| SyncError::Authentication(e.to_string()))?;

        let token = parse_token(&response.body)
            .map_err(|e| SyncError::Authentication(e.to_string()))?;
        *self.token.write().await = Some(token);
        tracing::info!("Authenticated as {}", self.config.user);
        Ok(())
    }

    async fn project_iri(&self) -> Result<String> {
        let path = format!(
            "/admin/projects/shortcode/{}",
            urlencoding::encode(&self.config.shortcode)
        );
        let response = self
            .get(&path)
            .await
            .map_err(|e| SyncError::ProjectNotFound(format!("{}: {}", self.config.shortcode, e)))?;
        let iri = parse_project_iri(&response.body)
            .map_err(|e| SyncError::ProjectNotFound(format!("{}: {}", self.config.shortcode, e)))?;
        tracing::info!("Project {} is {}", self.config.shortcode, iri);
        Ok(iri)
    }

    async fn list_vocabularies(&self, project_iri: &str) -> Result<Vec<ControlledVocabulary>> {
        let path = format!("/admin/lists?projectIri={}", urlencoding::encode(project_iri));
        let response = self.get(&path).await?;
        let list_iris = parse_list_iris(&response.body)?;

        let mut vocabularies = Vec::with_capacity(list_iris.len());
        for list_iri in list_iris {
            match self.vocabulary(&list_iri).await {
                Ok(vocabulary) => vocabularies.push(vocabulary),
                Err(e) => tracing::warn!("Skipping list {}: {}", list_iri, e),
            }
        }
        tracing::info!("Loaded {} controlled vocabularies", vocabularies.len());
        Ok(vocabularies)
    }

    async fn lookup(&self, kind: RecordKind, identifier: &str) -> Result<Option<TargetRef>> {
        let query = lookup_query(&self.ontology, kind, identifier);
        let token = self.token().await;
        let response = self
            .http
            .post_raw(
                &self.config.api_url("/v2/searchextended"),
                SPARQL_CONTENT_TYPE,
                query.into_bytes(),
                token.as_deref(),
            )
            .await?
            .error_for_status()?;

        Ok(decode_search_result(&response.body)?.map(|iri| TargetRef { iri, kind }))
    }

    async fn fetch_full(&self, target: &TargetRef) -> Result<TargetRecord> {
        let path = format!("/v2/resources/{}", urlencoding::encode(&target.iri));
        let response = self.get(&path).await?;
        decode_target_record(&response.body, &self.ontology)
    }

    async fn create_record(&self, payload: &CreatePayload, project_iri: &str) -> Result<TargetRef> {
        let body = encode_create_payload(payload, project_iri, &self.ontology);
        let headers: &[(&str, &str)] = if payload.file.is_some() {
            &[("X-Asset-Ingested", "true")]
        } else {
            &[]
        };
        let response = self
            .send(Method::POST, "/v2/resources", &body, headers)
            .await?;
        let iri = parse_created_iri(&response.body)?;
        tracing::debug!("{}: created {} {}", payload.identifier, payload.kind, iri);
        Ok(TargetRef {
            iri,
            kind: payload.kind,
        })
    }

    async fn apply_operation(&self, target: &TargetRef, operation: &Operation) -> Result<()> {
        let body = encode_value_request(target, operation, &self.ontology);
        let (method, path) = match operation.action() {
            Action::Create => (Method::POST, "/v2/values"),
            Action::Update => (Method::PUT, "/v2/values"),
            Action::Delete => (Method::POST, "/v2/values/delete"),
        };
        self.send(method, path, &body, &[]).await?;
        Ok(())
    }

    async fn upload_asset(&self, source_url: &str) -> Result<String> {
        let filename = filename_from_url(source_url)?;
        let bytes = self.http.get_bytes(source_url).await?;

        let url = self.config.ingest_url(&format!(
            "/projects/{}/assets/ingest/{}",
            self.config.shortcode,
            urlencoding::encode(&filename)
        ));
        let token = self.token().await;
        let response = self
            .http
            .post_raw(&url, "application/octet-stream", bytes, token.as_deref())
            .await?
            .error_for_status()?;

        let internal = parse_internal_filename(&response.body)?;
        tracing::debug!("Uploaded {} as {}", filename, internal);
        Ok(internal)
    }
}
