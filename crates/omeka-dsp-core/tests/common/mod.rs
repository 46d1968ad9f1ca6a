//! In-memory stores and record builders for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use omeka_dsp_core::{
    ControlledVocabulary, CreatePayload, Operation, PropertyEntry, RecordKind, Result,
    SourceRecord, SourceStore, SyncError, TargetRecord, TargetRef, TargetStore, VocabularyNode,
};

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn vocabularies() -> Vec<ControlledVocabulary> {
    vec![
        ControlledVocabulary::new("http://rdfh.ch/lists/0856/thema", "Thema")
            .with_node(
                VocabularyNode::new("http://rdfh.ch/lists/0856/bauwerk", "Bauwerk").with_child(
                    VocabularyNode::new("http://rdfh.ch/lists/0856/bruecke", "Brücke"),
                ),
            ),
        ControlledVocabulary::new("http://rdfh.ch/lists/0856/era", "Era")
            .with_node(VocabularyNode::new("http://rdfh.ch/lists/0856/mittelalter", "Mittelalter")),
        ControlledVocabulary::new("http://rdfh.ch/lists/0856/imt", "Internet Media Type")
            .with_node(VocabularyNode::new("http://rdfh.ch/lists/0856/jpeg", "image/jpeg")),
    ]
}

pub fn item(identifier: &str, omeka_id: u64) -> SourceRecord {
    let mut record = SourceRecord::new()
        .with_entry("dcterms:identifier", PropertyEntry::literal(10, identifier))
        .with_entry("dcterms:title", PropertyEntry::literal(1, format!("Titel {}", identifier)))
        .with_modified(at(10, 12));
    record.omeka_id = Some(omeka_id);
    record
}

pub fn media(identifier: &str, content_type: &str) -> SourceRecord {
    let mut record = SourceRecord::new()
        .with_entry("dcterms:identifier", PropertyEntry::literal(10, identifier))
        .with_entry("dcterms:title", PropertyEntry::literal(1, "Foto"))
        .with_entry("dcterms:format", PropertyEntry::literal(9, content_type))
        .with_modified(at(10, 12));
    record.original_url = Some(format!("https://omeka.example.org/files/original/{}.jpg", identifier));
    record
}

/// Target store backed by a map, recording every write.
#[derive(Default)]
pub struct MemoryTarget {
    records: Mutex<HashMap<(RecordKind, String), TargetRecord>>,
    vocabularies: Vec<ControlledVocabulary>,
    pub created: Mutex<Vec<CreatePayload>>,
    pub applied: Mutex<Vec<(TargetRef, Operation)>>,
    pub uploads: Mutex<Vec<String>>,
    failing_fields: HashSet<String>,
    fail_auth: bool,
    fail_project: bool,
    fail_create: bool,
    fail_upload: bool,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self {
            vocabularies: vocabularies(),
            ..Default::default()
        }
    }

    pub fn with_record(self, identifier: &str, record: TargetRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert((record.kind, identifier.to_string()), record);
        self
    }

    pub fn failing_field(mut self, field: &str) -> Self {
        self.failing_fields.insert(field.to_string());
        self
    }

    pub fn failing_auth(mut self) -> Self {
        self.fail_auth = true;
        self
    }

    pub fn failing_project(mut self) -> Self {
        self.fail_project = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn created_identifiers(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.identifier.clone())
            .collect()
    }

    pub fn applied_operations(&self) -> Vec<Operation> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .map(|(_, op)| op.clone())
            .collect()
    }
}

#[async_trait]
impl TargetStore for MemoryTarget {
    async fn authenticate(&self) -> Result<()> {
        if self.fail_auth {
            return Err(SyncError::Authentication("401 Unauthorized".into()));
        }
        Ok(())
    }

    async fn project_iri(&self) -> Result<String> {
        if self.fail_project {
            return Err(SyncError::RemoteUnavailable("404 Not Found".into()));
        }
        Ok("http://rdfh.ch/projects/0856".into())
    }

    async fn list_vocabularies(&self, _project_iri: &str) -> Result<Vec<ControlledVocabulary>> {
        Ok(self.vocabularies.clone())
    }

    async fn lookup(&self, kind: RecordKind, identifier: &str) -> Result<Option<TargetRef>> {
        // Let concurrent workers interleave between lookup and create.
        tokio::task::yield_now().await;
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(kind, identifier.to_string()))
            .map(TargetRecord::reference))
    }

    async fn fetch_full(&self, target: &TargetRef) -> Result<TargetRecord> {
        self.records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.iri == target.iri)
            .cloned()
            .ok_or_else(|| SyncError::RemoteUnavailable(format!("404 {}", target.iri)))
    }

    async fn create_record(&self, payload: &CreatePayload, _project_iri: &str) -> Result<TargetRef> {
        if self.fail_create {
            return Err(SyncError::RemoteUnavailable("500 Internal Server Error".into()));
        }
        let mut records = self.records.lock().unwrap();
        let iri = format!("http://rdfh.ch/0856/res{}", records.len() + 1);
        let record = TargetRecord::new(iri, payload.kind).with_last_modified(at(20, 0));
        let reference = record.reference();
        records.insert((payload.kind, payload.identifier.clone()), record);
        self.created.lock().unwrap().push(payload.clone());
        Ok(reference)
    }

    async fn apply_operation(&self, target: &TargetRef, operation: &Operation) -> Result<()> {
        if self.failing_fields.contains(&operation.field) {
            return Err(SyncError::RemoteUnavailable("400 Bad Request".into()));
        }
        self.applied
            .lock()
            .unwrap()
            .push((target.clone(), operation.clone()));
        Ok(())
    }

    async fn upload_asset(&self, source_url: &str) -> Result<String> {
        if self.fail_upload {
            return Err(SyncError::RemoteUnavailable("503 Service Unavailable".into()));
        }
        self.uploads.lock().unwrap().push(source_url.to_string());
        Ok(format!("ingested-{}", self.uploads.lock().unwrap().len()))
    }
}

/// Source store serving fixed records and media keyed by item id.
#[derive(Default)]
pub struct MemorySource {
    pub records: Vec<SourceRecord>,
    media: HashMap<u64, Vec<SourceRecord>>,
}

impl MemorySource {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            media: HashMap::new(),
        }
    }

    pub fn with_media(mut self, item_id: u64, media: SourceRecord) -> Self {
        self.media.entry(item_id).or_default().push(media);
        self
    }
}

#[async_trait]
impl SourceStore for MemorySource {
    async fn list_records(&self) -> Result<Vec<SourceRecord>> {
        Ok(self.records.clone())
    }

    async fn list_media(&self, record: &SourceRecord) -> Result<Vec<SourceRecord>> {
        Ok(record
            .omeka_id
            .and_then(|id| self.media.get(&id).cloned())
            .unwrap_or_default())
    }
}
