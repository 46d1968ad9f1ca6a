//! End-to-end synchronisation runs against in-memory stores

mod common;

use std::sync::Arc;

use common::{at, item, media, MemorySource, MemoryTarget};
use omeka_dsp_core::{
    Action, CancellationToken, PropertyEntry, RecordKind, SourceRecord, SyncConfig, SyncError,
    SyncOrchestrator, SyncReport, TargetRecord, TypedValue,
};

fn text(value: &str, node_id: &str) -> TypedValue {
    TypedValue::Text {
        value: value.into(),
        node_id: node_id.into(),
    }
}

fn existing(iri: &str, identifier: &str, title: &str) -> TargetRecord {
    TargetRecord::new(iri, RecordKind::Object)
        .with_value("identifier", text(identifier, "v-id"))
        .with_value("title", text(title, "v-title"))
        .with_last_modified(at(5, 0))
}

async fn run_with(
    target: Arc<MemoryTarget>,
    source: MemorySource,
    config: SyncConfig,
) -> Result<SyncReport, SyncError> {
    let records = source.records.clone();
    let orchestrator = SyncOrchestrator::new(target, Arc::new(source), config);
    orchestrator.run(records, &CancellationToken::new()).await
}

async fn run(target: Arc<MemoryTarget>, source: MemorySource) -> SyncReport {
    run_with(target, source, SyncConfig::default()).await.unwrap()
}

// === Existing records ===

#[tokio::test]
async fn test_emptied_description_is_deleted() {
    let source = item("abb13025", 1);
    let target = Arc::new(MemoryTarget::new().with_record(
        "abb13025",
        existing("http://rdfh.ch/0856/a", "abb13025", "Titel abb13025")
            .with_value("description", text("old text", "v-desc")),
    ));

    let report = run(target.clone(), MemorySource::new(vec![source])).await;

    let ops = target.applied_operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].field, "description");
    assert_eq!(ops[0].action(), Action::Delete);
    assert_eq!(ops[0].target_node_id(), Some("v-desc"));
    assert_eq!(report.updated, 1);
    assert_eq!(report.operations_applied, 1);
}

#[tokio::test]
async fn test_new_subject_label_is_added() {
    let source = item("abb13025", 1)
        .with_entry("dcterms:subject", PropertyEntry::literal(3, "Bauwerk"))
        .with_entry("dcterms:subject", PropertyEntry::literal(3, "Brücke"));
    let target = Arc::new(MemoryTarget::new().with_record(
        "abb13025",
        existing("http://rdfh.ch/0856/a", "abb13025", "Titel abb13025").with_value(
            "subject",
            TypedValue::ListRef {
                list_node: "http://rdfh.ch/lists/0856/bruecke".into(),
                node_id: "v-s1".into(),
            },
        ),
    ));

    run(target.clone(), MemorySource::new(vec![source])).await;

    let ops = target.applied_operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].action(), Action::Create);
    assert_eq!(ops[0].new_value(), Some("http://rdfh.ch/lists/0856/bauwerk"));
}

#[tokio::test]
async fn test_older_source_is_skipped_despite_differences() {
    let source = item("abb13025", 1)
        .with_entry("dcterms:description", PropertyEntry::literal(4, "neu"))
        .with_modified(at(1, 0));
    let target = Arc::new(MemoryTarget::new().with_record(
        "abb13025",
        existing("http://rdfh.ch/0856/a", "abb13025", "ganz anderer Titel"),
    ));

    let report = run(target.clone(), MemorySource::new(vec![source])).await;

    assert!(target.applied_operations().is_empty());
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.updated, 0);
}

#[tokio::test]
async fn test_failed_operation_does_not_block_others() {
    let source = item("abb13025", 1)
        .with_entry("dcterms:description", PropertyEntry::literal(4, "Beschreibung"));
    let target = Arc::new(
        MemoryTarget::new()
            .with_record(
                "abb13025",
                existing("http://rdfh.ch/0856/a", "abb13025", "alter Titel"),
            )
            .failing_field("title"),
    );

    let report = run(target.clone(), MemorySource::new(vec![source])).await;

    let ops = target.applied_operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].field, "description");
    assert_eq!(report.operations_applied, 1);
    assert_eq!(report.operations_failed, 1);
}

#[tokio::test]
async fn test_unresolved_vocabulary_label_leaves_field_alone() {
    let source = item("abb13025", 1)
        .with_entry("dcterms:subject", PropertyEntry::literal(3, "Burg"));
    let target = Arc::new(MemoryTarget::new().with_record(
        "abb13025",
        existing("http://rdfh.ch/0856/a", "abb13025", "Titel abb13025").with_value(
            "subject",
            TypedValue::ListRef {
                list_node: "http://rdfh.ch/lists/0856/bruecke".into(),
                node_id: "v-s1".into(),
            },
        ),
    ));

    let report = run(target.clone(), MemorySource::new(vec![source])).await;

    assert!(target.applied_operations().is_empty());
    assert_eq!(report.unchanged, 1);
}

// === New records and media ===

#[tokio::test]
async fn test_new_record_is_created_before_its_media() {
    let source = MemorySource::new(vec![item("abb13025", 1)])
        .with_media(1, media("m13025_1", "image/jpeg"))
        .with_media(1, media("m13025_2", "application/pdf"));
    let target = Arc::new(MemoryTarget::new());

    let report = run(target.clone(), source).await;

    assert_eq!(
        target.created_identifiers(),
        vec!["abb13025", "m13025_1", "m13025_2"]
    );
    let created = target.created.lock().unwrap();
    assert_eq!(created[1].kind, RecordKind::MediaImage);
    assert_eq!(created[2].kind, RecordKind::MediaDocument);
    assert_eq!(
        created[1].values("partOf_MetadataValue")[0].as_str(),
        "http://rdfh.ch/0856/res1"
    );
    assert_eq!(
        created[1].file.as_ref().map(|f| f.internal_filename.as_str()),
        Some("ingested-1")
    );
    assert_eq!(target.uploads.lock().unwrap().len(), 2);
    assert_eq!(report.created, 3);
}

#[tokio::test]
async fn test_unsupported_media_type_is_never_uploaded() {
    let source = MemorySource::new(vec![item("abb13025", 1)])
        .with_media(1, media("m13025_1", "application/zip"));
    let target = Arc::new(MemoryTarget::new());

    let report = run(target.clone(), source).await;

    assert_eq!(target.created_identifiers(), vec!["abb13025"]);
    assert!(target.uploads.lock().unwrap().is_empty());
    assert_eq!(report.created, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn test_failed_upload_creates_no_media() {
    let source = MemorySource::new(vec![item("abb13025", 1)])
        .with_media(1, media("m13025_1", "image/jpeg"));
    let target = Arc::new(MemoryTarget::new().failing_upload());

    let report = run(target.clone(), source).await;

    assert_eq!(target.created_identifiers(), vec!["abb13025"]);
    assert_eq!(report.created, 1);
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn test_private_media_is_skipped() {
    let mut private = media("m13025_1", "image/png");
    private.is_public = false;
    let source = MemorySource::new(vec![item("abb13025", 1)]).with_media(1, private);
    let target = Arc::new(MemoryTarget::new());

    let report = run(target.clone(), source).await;

    assert_eq!(target.created_identifiers(), vec!["abb13025"]);
    assert!(target.uploads.lock().unwrap().is_empty());
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_media_of_failed_parent_is_not_attempted() {
    let source = MemorySource::new(vec![item("abb13025", 1)])
        .with_media(1, media("m13025_1", "image/jpeg"));
    let target = Arc::new(MemoryTarget::new().failing_create());

    let report = run(target.clone(), source).await;

    assert!(target.uploads.lock().unwrap().is_empty());
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_existing_media_is_diffed() {
    let parent = existing("http://rdfh.ch/0856/a", "abb13025", "Titel abb13025");
    let media_record = TargetRecord::new("http://rdfh.ch/0856/m", RecordKind::MediaImage)
        .with_value("title", text("Foto", "v-t"))
        .with_value("creator", text("Anna", "v-c1"))
        .with_last_modified(at(5, 0));
    let mut source_media = media("m13025_1", "image/jpeg")
        .with_entry("dcterms:creator", PropertyEntry::literal(2, "Hans"));
    source_media.original_url = None;

    let target = Arc::new(
        MemoryTarget::new()
            .with_record("abb13025", parent)
            .with_record("m13025_1", media_record),
    );
    let source = MemorySource::new(vec![item("abb13025", 1)]).with_media(1, source_media);

    run(target.clone(), source).await;

    let ops: Vec<_> = target
        .applied
        .lock()
        .unwrap()
        .iter()
        .filter(|(t, _)| t.kind == RecordKind::MediaImage)
        .map(|(_, op)| op.to_string())
        .collect();
    assert!(ops.contains(&"created creator 'Hans'".to_string()));
    assert!(ops.contains(&"deleted creator 'Anna'".to_string()));
    assert!(target.uploads.lock().unwrap().is_empty());
}

// === Run-level behaviour ===

#[tokio::test]
async fn test_authentication_failure_aborts_run() {
    let target = Arc::new(MemoryTarget::new().failing_auth());
    let result = run_with(
        target.clone(),
        MemorySource::new(vec![item("abb13025", 1)]),
        SyncConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(SyncError::Authentication(_))));
    assert!(target.created_identifiers().is_empty());
}

#[tokio::test]
async fn test_missing_project_aborts_run() {
    let target = Arc::new(MemoryTarget::new().failing_project());
    let result = run_with(
        target,
        MemorySource::new(vec![item("abb13025", 1)]),
        SyncConfig::default(),
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, SyncError::ProjectNotFound(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_record_without_identifier_does_not_stop_run() {
    let mut anonymous = SourceRecord::new()
        .with_entry("dcterms:title", PropertyEntry::literal(1, "Ohne Signatur"));
    anonymous.omeka_id = Some(7);
    let target = Arc::new(MemoryTarget::new());

    let report = run(
        target.clone(),
        MemorySource::new(vec![anonymous, item("abb14375", 2)]),
    )
    .await;

    assert_eq!(target.created_identifiers(), vec!["abb14375"]);
    assert_eq!(report.failed, 1);
    assert_eq!(report.created, 1);
}

#[tokio::test]
async fn test_cancelled_run_starts_no_records() {
    let target = Arc::new(MemoryTarget::new());
    let source = MemorySource::new(vec![item("abb13025", 1), item("abb14375", 2)]);
    let records = source.records.clone();
    let orchestrator = SyncOrchestrator::new(target.clone(), Arc::new(source), SyncConfig::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = orchestrator.run(records, &cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.total(), 0);
    assert!(target.created_identifiers().is_empty());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let mut config = SyncConfig::default();
    config.run.dry_run = true;

    let target = Arc::new(MemoryTarget::new().with_record(
        "abb14375",
        existing("http://rdfh.ch/0856/b", "abb14375", "alter Titel"),
    ));
    let source = MemorySource::new(vec![item("abb13025", 1), item("abb14375", 2)])
        .with_media(1, media("m13025_1", "image/jpeg"));

    let report = run_with(target.clone(), source, config).await.unwrap();

    assert!(target.created_identifiers().is_empty());
    assert!(target.applied_operations().is_empty());
    assert!(target.uploads.lock().unwrap().is_empty());
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.operations_applied, 1);
}

#[tokio::test]
async fn test_parallel_workers_process_every_record() {
    let mut config = SyncConfig::default();
    config.run.workers = 4;

    let records: Vec<SourceRecord> = (0..12)
        .map(|i| item(&format!("abb{:05}", i), i as u64))
        .collect();
    let target = Arc::new(MemoryTarget::new());

    let report = run_with(target.clone(), MemorySource::new(records), config)
        .await
        .unwrap();

    let mut created = target.created_identifiers();
    created.sort();
    created.dedup();
    assert_eq!(created.len(), 12);
    assert_eq!(report.created, 12);
}

#[tokio::test]
async fn test_shared_identifier_is_created_once() {
    let mut config = SyncConfig::default();
    config.run.workers = 2;
    let records = vec![item("abb13025", 1), item("abb13025", 2)];
    let target = Arc::new(MemoryTarget::new());
    let orchestrator = SyncOrchestrator::new(
        target.clone(),
        Arc::new(MemorySource::new(records.clone())),
        config,
    );

    let report = orchestrator
        .run(records, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(target.created_identifiers(), vec!["abb13025"]);
    assert_eq!(report.created, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(orchestrator.locked_identifiers(), 0);
}
