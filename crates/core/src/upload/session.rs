//! The session facade: one instance per upload flow.
//!
//! Binds configuration, intake, the entry store, validation, and the
//! orchestrator behind a single API, and owns the notifier the whole
//! pipeline emits through. Everything the server (or a test) does to the
//! pipeline goes through this type.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::events::{Notifier, UploadEvent};

use super::intake::{FileAcceptor, FileCandidate, IntakeReport};
use super::orchestrator::{SubmissionOrchestrator, SubmissionSummary, SubmitError};
use super::preview::{LocalPreviewAllocator, PreviewAllocator};
use super::store::{StoreError, UploadStore};
use super::transfer::{Transfer, TransferSimulator};
use super::types::{default_categories, Category, MetadataPatch, UploadEntry, UploadStatus};
use super::validate::{self, ValidationError};

/// Error type for session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Per-status entry counts, for the session view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadStats {
    pub total: usize,
    pub pending: usize,
    pub uploading: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct UploadSession {
    id: String,
    config: Config,
    store: UploadStore,
    acceptor: FileAcceptor,
    orchestrator: SubmissionOrchestrator,
    notifier: Notifier,
    categories: Vec<Category>,
}

impl UploadSession {
    /// Create a session with the default collaborators: local preview
    /// allocator and the randomized transfer simulator.
    pub fn new(config: Config) -> Self {
        let allocator: Arc<dyn PreviewAllocator> = Arc::new(LocalPreviewAllocator::new());
        let transfer: Arc<dyn Transfer> =
            Arc::new(TransferSimulator::new(config.simulator.clone()));
        Self::with_collaborators(config, allocator, transfer)
    }

    /// Create a session with explicit collaborators. Tests use this to
    /// inject mock allocators and seeded or scripted transfers.
    pub fn with_collaborators(
        config: Config,
        allocator: Arc<dyn PreviewAllocator>,
        transfer: Arc<dyn Transfer>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            acceptor: FileAcceptor::new(config.upload.clone(), allocator),
            orchestrator: SubmissionOrchestrator::new(transfer),
            config,
            store: UploadStore::new(),
            notifier: Notifier::default(),
            categories: default_categories(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Offer a batch of raw candidates for intake.
    ///
    /// Emits one rejection event per turned-away candidate and a single
    /// acceptance event for the batch.
    pub fn offer_files(&self, candidates: Vec<FileCandidate>) -> IntakeReport {
        let report = self.acceptor.accept(&self.store, candidates);

        for rejected in &report.rejected {
            self.notifier.emit(UploadEvent::FileRejected {
                name: rejected.name.clone(),
                reason: rejected.reason.as_str().to_string(),
            });
        }
        if report.accepted_count() > 0 {
            self.notifier.emit(UploadEvent::FilesAccepted {
                count: report.accepted_count(),
                titles: report
                    .accepted
                    .iter()
                    .map(|e| e.metadata.title.clone())
                    .collect(),
            });
        }
        report
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<UploadEntry> {
        self.store.entries()
    }

    pub fn entry(&self, entry_id: &str) -> Option<UploadEntry> {
        self.store.get(entry_id)
    }

    /// Merge a metadata patch into one entry.
    ///
    /// A patch carrying a custom category is checked against the predefined
    /// set first; on collision nothing is written and the patch is refused
    /// whole.
    pub fn patch_entry(
        &self,
        entry_id: &str,
        patch: &MetadataPatch,
    ) -> Result<UploadEntry, SessionError> {
        if let Some(custom) = patch.custom_category.as_deref() {
            if !custom.trim().is_empty() {
                if let Err(e) = validate::check_custom_category(custom, &self.categories) {
                    self.notifier.emit(UploadEvent::DuplicateCategoryRejected {
                        entry_id: entry_id.to_string(),
                        name: custom.trim().to_string(),
                    });
                    return Err(e.into());
                }
            }
        }
        Ok(self.store.patch_metadata(entry_id, patch)?)
    }

    /// Remove one entry; its preview resource is released.
    pub fn remove_entry(&self, entry_id: &str) -> Result<UploadEntry, SessionError> {
        let entry = self.store.remove(entry_id)?;
        self.notifier.emit(UploadEvent::FileRemoved {
            entry_id: entry.id.clone(),
            title: entry.metadata.title.clone(),
        });
        Ok(entry)
    }

    /// Remove every entry; all preview resources are released.
    pub fn clear(&self) -> usize {
        let count = self.store.clear();
        if count > 0 {
            self.notifier.emit(UploadEvent::FilesCleared { count });
        }
        count
    }

    /// Whether the pipeline currently passes the submission gate.
    pub fn is_valid(&self) -> bool {
        validate::pipeline_is_valid(&self.store.entries())
    }

    /// Run a submission over all pending entries.
    pub async fn submit(&self) -> Result<SubmissionSummary, SessionError> {
        info!("Session {} submitting", self.id);
        Ok(self
            .orchestrator
            .submit(&self.store, &self.notifier)
            .await?)
    }

    /// Per-status counts over the current entries.
    pub fn stats(&self) -> UploadStats {
        let mut stats = UploadStats::default();
        for entry in self.store.entries() {
            stats.total += 1;
            match entry.status {
                UploadStatus::Pending => stats.pending += 1,
                UploadStatus::Uploading => stats.uploading += 1,
                UploadStatus::Success => stats.succeeded += 1,
                UploadStatus::Error => stats.failed += 1,
            }
        }
        stats
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        // Previews are released by the store entries dropping; the clear is
        // explicit so teardown order does not depend on field order.
        let count = self.store.clear();
        if count > 0 {
            info!("Session {} torn down, released {} preview(s)", self.id, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockPreviewAllocator, MockTransfer};

    fn session() -> (UploadSession, Arc<MockPreviewAllocator>, Arc<MockTransfer>) {
        let allocator = Arc::new(MockPreviewAllocator::new());
        let transfer = Arc::new(MockTransfer::new());
        let session = UploadSession::with_collaborators(
            Config::default(),
            Arc::clone(&allocator) as Arc<dyn PreviewAllocator>,
            Arc::clone(&transfer) as Arc<dyn Transfer>,
        );
        (session, allocator, transfer)
    }

    fn fill_metadata(session: &UploadSession, entry_id: &str) {
        session
            .patch_entry(
                entry_id,
                &MetadataPatch {
                    tags: Some(vec!["tag".to_string()]),
                    category: Some("nature".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_offer_files_emits_events() {
        let (session, _allocator, _transfer) = session();
        let mut rx = session.notifier().subscribe();

        let report = session.offer_files(vec![
            fixtures::jpeg_candidate("sunset.jpg", 2),
            fixtures::candidate("doc.pdf", "application/pdf", 100),
        ]);

        assert_eq!(report.accepted_count(), 1);
        assert_eq!(report.rejected_count(), 1);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.event.event_type(), "file_rejected");
        let second = rx.try_recv().unwrap();
        match second.event {
            UploadEvent::FilesAccepted { count, titles } => {
                assert_eq!(count, 1);
                assert_eq!(titles, vec!["sunset".to_string()]);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_custom_category_is_refused() {
        let (session, _allocator, _transfer) = session();
        let report = session.offer_files(vec![fixtures::jpeg_candidate("a.jpg", 1)]);
        let id = report.accepted[0].id.clone();
        let mut rx = session.notifier().subscribe();

        let result = session.patch_entry(
            &id,
            &MetadataPatch {
                category: Some("other".to_string()),
                custom_category: Some("Nature".to_string()),
                ..Default::default()
            },
        );

        assert!(matches!(
            result,
            Err(SessionError::Validation(ValidationError::DuplicateCategory(_)))
        ));
        // Nothing was written
        let entry = session.entry(&id).unwrap();
        assert!(entry.metadata.category.is_empty());
        assert!(entry.metadata.custom_category.is_none());

        let envelope = rx.try_recv().unwrap();
        assert_eq!(envelope.event.event_type(), "duplicate_category_rejected");
    }

    #[test]
    fn test_novel_custom_category_is_accepted() {
        let (session, _allocator, _transfer) = session();
        let report = session.offer_files(vec![fixtures::jpeg_candidate("a.jpg", 1)]);
        let id = report.accepted[0].id.clone();

        let entry = session
            .patch_entry(
                &id,
                &MetadataPatch {
                    category: Some("other".to_string()),
                    custom_category: Some("Astrophotography".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(entry.metadata.custom_category.as_deref(), Some("Astrophotography"));
    }

    #[test]
    fn test_remove_and_clear_release_previews() {
        let (session, allocator, _transfer) = session();
        let report = session.offer_files(vec![
            fixtures::jpeg_candidate("a.jpg", 1),
            fixtures::jpeg_candidate("b.jpg", 1),
            fixtures::jpeg_candidate("c.jpg", 1),
        ]);
        assert_eq!(allocator.live(), 3);

        session.remove_entry(&report.accepted[0].id).unwrap();
        assert_eq!(allocator.released(), 1);

        assert_eq!(session.clear(), 2);
        assert_eq!(allocator.live(), 0);
        assert_eq!(allocator.released(), 3);
    }

    #[test]
    fn test_drop_releases_previews() {
        let allocator = Arc::new(MockPreviewAllocator::new());
        {
            let session = UploadSession::with_collaborators(
                Config::default(),
                Arc::clone(&allocator) as Arc<dyn PreviewAllocator>,
                Arc::new(MockTransfer::new()),
            );
            session.offer_files(vec![fixtures::jpeg_candidate("a.jpg", 1)]);
            assert_eq!(allocator.live(), 1);
        }
        assert_eq!(allocator.live(), 0);
    }

    #[tokio::test]
    async fn test_submit_requires_valid_metadata() {
        let (session, _allocator, transfer) = session();
        session.offer_files(vec![fixtures::jpeg_candidate("a.jpg", 1)]);
        assert!(!session.is_valid());

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, SessionError::Submit(SubmitError::ValidationFailed { .. })));
        assert_eq!(transfer.runs(), 0);
    }

    #[tokio::test]
    async fn test_submit_happy_path_updates_stats() {
        let (session, _allocator, _transfer) = session();
        let report = session.offer_files(vec![
            fixtures::jpeg_candidate("a.jpg", 1),
            fixtures::jpeg_candidate("b.jpg", 1),
        ]);
        for entry in &report.accepted {
            fill_metadata(&session, &entry.id);
        }
        assert!(session.is_valid());

        let summary = session.submit().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);

        let stats = session.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_stats_counts_by_status() {
        let (session, _allocator, _transfer) = session();
        let report = session.offer_files(vec![
            fixtures::jpeg_candidate("a.jpg", 1),
            fixtures::jpeg_candidate("b.jpg", 1),
        ]);
        assert_eq!(
            session.stats(),
            UploadStats {
                total: 2,
                pending: 2,
                ..Default::default()
            }
        );
        drop(report);
    }
}
