//! Drives source records through lookup, create-or-diff and apply.
//!
//! Top-level records run on a bounded pool of `run.workers` concurrent
//! futures. Each record holds a per-identifier lock for its whole sync,
//! including its media, so no two workers ever touch the same target record.
//! Media are synchronised sequentially after their parent's reference is
//! known.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cancel::CancellationToken;
use crate::config::SyncConfig;
use crate::diff::RecordDiffer;
use crate::error::{Result, SyncError};
use crate::operation::Change;
use crate::payload::{MediaAttachment, PayloadBuilder};
use crate::resolve::resolve_all;
use crate::source::SourceRecord;
use crate::state::RecordState;
use crate::store::{SourceStore, TargetStore};
use crate::target::{RecordKind, TargetRecord, TargetRef};
use crate::vocabulary::VocabularyIndex;

/// How one record or media item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new target record was created
    Created(TargetRef),
    /// Dry run: a record would have been created
    WouldCreate,
    /// Changes were applied to an existing record
    Updated {
        target: TargetRef,
        applied: usize,
        failed: usize,
    },
    /// The record exists and needed no changes
    Unchanged(TargetRef),
    /// Deliberately not synchronised
    Skipped,
    /// Synchronisation failed; the error has been logged
    Failed,
    /// Not started because the run was cancelled
    Cancelled,
}

impl RecordOutcome {
    /// Reference of the target record, when one is known.
    pub fn target(&self) -> Option<&TargetRef> {
        match self {
            RecordOutcome::Created(target)
            | RecordOutcome::Updated { target, .. }
            | RecordOutcome::Unchanged(target) => Some(target),
            _ => None,
        }
    }
}

/// Counters for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub operations_applied: usize,
    pub operations_failed: usize,
    /// The run stopped early on a cancellation request
    pub cancelled: bool,
}

impl SyncReport {
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Created(_) | RecordOutcome::WouldCreate => self.created += 1,
            RecordOutcome::Updated {
                applied, failed, ..
            } => {
                self.updated += 1;
                self.operations_applied += applied;
                self.operations_failed += failed;
            }
            RecordOutcome::Unchanged(_) => self.unchanged += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Failed => self.failed += 1,
            RecordOutcome::Cancelled => self.cancelled = true,
        }
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.operations_applied += other.operations_applied;
        self.operations_failed += other.operations_failed;
        self.cancelled |= other.cancelled;
    }

    /// Records and media that reached an outcome.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped + self.failed
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "created {}, updated {}, unchanged {}, skipped {}, failed {}; operations applied {}, failed {}",
            self.created,
            self.updated,
            self.unchanged,
            self.skipped,
            self.failed,
            self.operations_applied,
            self.operations_failed
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Prerequisites resolved once per run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub project_iri: String,
    pub vocabularies: VocabularyIndex,
}

/// Whether a source record must be diffed against its target.
///
/// Without a timestamp on either side the record is always diffed.
pub fn source_is_newer(source: Option<DateTime<Utc>>, target: Option<DateTime<Utc>>) -> bool {
    match (source, target) {
        (Some(source), Some(target)) => source > target,
        _ => true,
    }
}

fn advance(identifier: &str, state: &mut RecordState, next: RecordState) {
    debug_assert!(
        state.can_transition_to(&next),
        "invalid transition {} -> {}",
        state,
        next
    );
    tracing::debug!("{}: {} -> {}", identifier, state, next);
    *state = next;
}

pub struct SyncOrchestrator {
    target: Arc<dyn TargetStore>,
    source: Arc<dyn SourceStore>,
    config: SyncConfig,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SyncOrchestrator {
    pub fn new(target: Arc<dyn TargetStore>, source: Arc<dyn SourceStore>, config: SyncConfig) -> Self {
        Self {
            target,
            source,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Authenticate, resolve the project and index its vocabularies.
    ///
    /// Failing to authenticate or to resolve the project is fatal. A failed
    /// vocabulary listing is logged and leaves the index empty, which omits
    /// every vocabulary field that has labels on the source.
    pub async fn prepare(&self) -> Result<RunContext> {
        self.target.authenticate().await.map_err(|e| match e {
            SyncError::Authentication(_) => e,
            other => SyncError::Authentication(other.to_string()),
        })?;
        tracing::info!("Login successful");

        let project_iri = self.target.project_iri().await.map_err(|e| match e {
            SyncError::ProjectNotFound(_) => e,
            other => SyncError::ProjectNotFound(other.to_string()),
        })?;
        tracing::info!("Project IRI: {}", project_iri);

        let vocabularies = match self.target.list_vocabularies(&project_iri).await {
            Ok(vocabularies) => {
                tracing::info!("Got {} lists from project", vocabularies.len());
                VocabularyIndex::from_vocabularies(&vocabularies)
            }
            Err(e) => {
                tracing::error!("Failed to retrieve lists: {}", e);
                VocabularyIndex::default()
            }
        };

        Ok(RunContext {
            project_iri,
            vocabularies,
        })
    }

    /// Synchronise a batch of top-level records and their media.
    ///
    /// Returns an error only when a run prerequisite fails.
    pub async fn run(&self, records: Vec<SourceRecord>, cancel: &CancellationToken) -> Result<SyncReport> {
        let context = self.prepare().await?;
        let workers = self.config.run.workers.max(1);

        let reports: Vec<SyncReport> = stream::iter(records)
            .map(|record| self.sync_with_media(&context, record, cancel))
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut report = SyncReport::default();
        for partial in reports {
            report.merge(partial);
        }
        tracing::info!("Sync finished: {}", report);
        Ok(report)
    }

    /// Synchronise one top-level record, then its media.
    pub async fn sync_with_media(
        &self,
        context: &RunContext,
        record: SourceRecord,
        cancel: &CancellationToken,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        if cancel.is_cancelled() {
            report.record(&RecordOutcome::Cancelled);
            return report;
        }

        let Some(identifier) = record.identifier().map(str::to_string) else {
            let e = SyncError::MalformedSourceRecord("missing identifier".into());
            tracing::error!("item {:?}: {}", record.omeka_id, e);
            report.record(&RecordOutcome::Failed);
            return report;
        };

        let lock = self.record_lock(&identifier);
        let guard = lock.lock().await;
        let report = self.sync_locked(context, &record, &identifier, report).await;
        drop(guard);
        self.release_lock(&identifier, lock);
        report
    }

    async fn sync_locked(
        &self,
        context: &RunContext,
        record: &SourceRecord,
        identifier: &str,
        mut report: SyncReport,
    ) -> SyncReport {
        let outcome = self
            .sync_record(context, record, identifier, RecordKind::Object, None)
            .await;
        report.record(&outcome);

        let media = match self.source.list_media(record).await {
            Ok(media) => media,
            Err(e) => {
                tracing::error!("{}: could not list media: {}", identifier, e);
                return report;
            }
        };

        for item in &media {
            let outcome = match outcome.target() {
                Some(parent) => self.sync_media(context, item, parent).await,
                None => {
                    tracing::warn!(
                        "{}: parent {} not available, skipping media",
                        item.identifier().unwrap_or("<unknown>"),
                        identifier
                    );
                    RecordOutcome::Skipped
                }
            };
            report.record(&outcome);
        }

        report
    }

    /// Synchronise one media record attached to `parent`.
    pub async fn sync_media(
        &self,
        context: &RunContext,
        media: &SourceRecord,
        parent: &TargetRef,
    ) -> RecordOutcome {
        let Some(identifier) = media.identifier() else {
            let e = SyncError::MalformedSourceRecord("missing identifier".into());
            tracing::error!("media {:?}: {}", media.omeka_id, e);
            return RecordOutcome::Failed;
        };

        let builder = PayloadBuilder::new(&context.vocabularies, &self.config.media_types);
        let kind = match builder.media_kind(media) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::error!("{}: could not create resource. {}", identifier, e);
                return RecordOutcome::Failed;
            }
        };

        self.sync_record(context, media, identifier, kind, Some(parent))
            .await
    }

    async fn sync_record(
        &self,
        context: &RunContext,
        source: &SourceRecord,
        identifier: &str,
        kind: RecordKind,
        parent: Option<&TargetRef>,
    ) -> RecordOutcome {
        match self.drive(context, source, identifier, kind, parent).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("{}: {}", identifier, e);
                RecordOutcome::Failed
            }
        }
    }

    async fn drive(
        &self,
        context: &RunContext,
        source: &SourceRecord,
        identifier: &str,
        kind: RecordKind,
        parent: Option<&TargetRef>,
    ) -> Result<RecordOutcome> {
        let noun = if kind.is_media() { "media" } else { "object" };
        let mut state = RecordState::Lookup;

        let Some(existing) = self.target.lookup(kind, identifier).await? else {
            advance(identifier, &mut state, RecordState::NotFound);
            return self
                .create(context, source, identifier, kind, parent, &mut state)
                .await;
        };

        advance(identifier, &mut state, RecordState::Found);
        let snapshot = self.target.fetch_full(&existing).await?;

        advance(identifier, &mut state, RecordState::CompareTimestamp);
        if !source_is_newer(source.modified, snapshot.last_modified) {
            advance(identifier, &mut state, RecordState::Skip);
            tracing::info!("{}: {} exists already", identifier, noun);
            return Ok(RecordOutcome::Unchanged(existing));
        }

        advance(identifier, &mut state, RecordState::Diff);
        tracing::info!(
            "{}: {} exists already, but it was modified. Update {} ...",
            identifier,
            noun,
            noun
        );
        let changes = RecordDiffer::new(&context.vocabularies).diff(source, &snapshot);
        if changes.is_empty() {
            tracing::info!("{}: no field changes", identifier);
            return Ok(RecordOutcome::Unchanged(existing));
        }

        advance(identifier, &mut state, RecordState::ApplyEach);
        let (applied, failed) = self.apply_each(identifier, &snapshot, &changes).await;
        Ok(RecordOutcome::Updated {
            target: existing,
            applied,
            failed,
        })
    }

    async fn create(
        &self,
        context: &RunContext,
        source: &SourceRecord,
        identifier: &str,
        kind: RecordKind,
        parent: Option<&TargetRef>,
        state: &mut RecordState,
    ) -> Result<RecordOutcome> {
        let builder = PayloadBuilder::new(&context.vocabularies, &self.config.media_types);
        let dry_run = self.config.run.dry_run;

        let payload = match parent {
            None => builder.build_record(source)?,
            Some(parent) => {
                if !source.is_public {
                    tracing::info!("{}: media is not public", identifier);
                    return Ok(RecordOutcome::Skipped);
                }
                let url = source
                    .original_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| SyncError::MissingMediaAttachment(identifier.to_string()))?;

                tracing::info!("{}: adding media to {} ...", identifier, kind);
                let attachment = MediaAttachment {
                    internal_filename: String::new(),
                    parent_iri: parent.iri.clone(),
                };
                let mut payload = builder.build_media(source, Some(&attachment))?;
                if !dry_run {
                    let internal_filename = self.target.upload_asset(url).await?;
                    payload.set_internal_filename(internal_filename);
                }
                payload
            }
        };

        advance(identifier, state, RecordState::Create);
        if dry_run {
            tracing::info!(
                "{}: dry run, would create {} with {} fields",
                identifier,
                payload.kind,
                payload.fields.len()
            );
            return Ok(RecordOutcome::WouldCreate);
        }

        let created = self.target.create_record(&payload, &context.project_iri).await?;
        tracing::info!("{}: resource created", identifier);

        advance(identifier, state, RecordState::Verify);
        let verified = match self.target.lookup(payload.kind, identifier).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::warn!("{}: created record not found on lookup", identifier);
                created
            }
            Err(e) => {
                tracing::warn!("{}: lookup after create failed: {}", identifier, e);
                created
            }
        };
        Ok(RecordOutcome::Created(verified))
    }

    /// Resolve and apply every change independently. Returns applied and
    /// failed counts; a stale change counts as failed.
    async fn apply_each(
        &self,
        identifier: &str,
        snapshot: &TargetRecord,
        changes: &[Change],
    ) -> (usize, usize) {
        let operations = resolve_all(identifier, changes, snapshot);
        let mut failed = changes.len() - operations.len();
        let mut applied = 0;
        let target = snapshot.reference();

        for operation in &operations {
            if self.config.run.dry_run {
                tracing::info!("{}: dry run, would have {}", identifier, operation);
                applied += 1;
                continue;
            }
            match self.target.apply_operation(&target, operation).await {
                Ok(()) => {
                    tracing::info!("{}: {}", identifier, operation);
                    applied += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "{}: {} of {} failed: {}",
                        identifier,
                        operation.action(),
                        operation.field,
                        e
                    );
                    failed += 1;
                }
            }
        }

        (applied, failed)
    }

    /// Identifiers with a record sync in progress or waiting.
    pub fn locked_identifiers(&self) -> usize {
        self.lock_map().len()
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record_lock(&self, identifier: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.lock_map()
            .entry(identifier.to_string())
            .or_default()
            .clone()
    }

    /// Drop the map entry once no other worker holds or awaits it.
    fn release_lock(&self, identifier: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.lock_map();
        drop(lock);
        if locks
            .get(identifier)
            .is_some_and(|l| Arc::strong_count(l) == 1)
        {
            locks.remove(identifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn newer_source_is_diffed() {
        assert!(source_is_newer(Some(at(12)), Some(at(10))));
        assert!(!source_is_newer(Some(at(10)), Some(at(12))));
        assert!(!source_is_newer(Some(at(10)), Some(at(10))));
    }

    #[test]
    fn missing_timestamps_are_diffed() {
        assert!(source_is_newer(None, Some(at(10))));
        assert!(source_is_newer(Some(at(10)), None));
        assert!(source_is_newer(None, None));
    }

    #[test]
    fn report_counts_outcomes() {
        let target = TargetRef {
            iri: "http://rdfh.ch/0856/a".into(),
            kind: RecordKind::Object,
        };
        let mut report = SyncReport::default();
        report.record(&RecordOutcome::Created(target.clone()));
        report.record(&RecordOutcome::Updated {
            target: target.clone(),
            applied: 3,
            failed: 1,
        });
        report.record(&RecordOutcome::Unchanged(target));
        report.record(&RecordOutcome::Skipped);
        report.record(&RecordOutcome::Failed);

        assert_eq!(report.total(), 5);
        assert_eq!(report.operations_applied, 3);
        assert_eq!(report.operations_failed, 1);
        assert!(!report.cancelled);

        let mut merged = SyncReport::default();
        merged.record(&RecordOutcome::Cancelled);
        merged.merge(report);
        assert!(merged.cancelled);
        assert_eq!(merged.created, 1);
    }

    #[test]
    fn report_display() {
        let report = SyncReport {
            created: 2,
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "created 2, updated 0, unchanged 0, skipped 0, failed 0; operations applied 0, failed 0 (cancelled)"
        );
    }
}
