//! Submission orchestration: validation gate plus sequential transfer runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::events::{Notifier, UploadEvent};

use super::store::UploadStore;
use super::transfer::{Transfer, TransferOutcome};
use super::types::UploadStatus;
use super::validate;

/// Error type for submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The pipeline is empty or at least one entry has incomplete metadata.
    #[error("Pipeline is not ready for submission: {invalid_count} entry(ies) invalid")]
    ValidationFailed { invalid_count: usize },
}

/// Tally of a finished submission run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Runs a submission: validates the whole pipeline, then drives each pending
/// entry through its transfer, one at a time, in store order.
pub struct SubmissionOrchestrator {
    transfer: Arc<dyn Transfer>,
}

impl SubmissionOrchestrator {
    pub fn new(transfer: Arc<dyn Transfer>) -> Self {
        Self { transfer }
    }

    /// Validate and, if the gate passes, transfer every pending entry.
    ///
    /// Validation is all-or-nothing: a single invalid entry blocks the whole
    /// run and no transfer starts. Entries already in a terminal state are
    /// skipped, so re-submitting after a partial failure retries only the
    /// entries that still need it.
    pub async fn submit(
        &self,
        store: &UploadStore,
        notifier: &Notifier,
    ) -> Result<SubmissionSummary, SubmitError> {
        let entries = store.entries();
        if !validate::pipeline_is_valid(&entries) {
            let invalid_titles: Vec<String> = entries
                .iter()
                .filter(|e| !validate::entry_is_valid(e))
                .map(|e| e.metadata.title.clone())
                .collect();
            let invalid_count = if entries.is_empty() {
                0
            } else {
                invalid_titles.len()
            };
            notifier.emit(UploadEvent::ValidationBlocked { invalid_titles });
            return Err(SubmitError::ValidationFailed { invalid_count });
        }

        let pending: Vec<String> = entries
            .iter()
            .filter(|e| e.status == UploadStatus::Pending)
            .map(|e| e.id.clone())
            .collect();

        info!("Starting submission of {} entry(ies)", pending.len());

        let mut summary = SubmissionSummary {
            total: pending.len(),
            ..Default::default()
        };
        for entry_id in &pending {
            match self.transfer.run(store, notifier, entry_id).await {
                TransferOutcome::Succeeded => summary.succeeded += 1,
                TransferOutcome::Failed { .. } => summary.failed += 1,
                // Removed mid-run; counts in neither column
                TransferOutcome::Cancelled => {}
            }
        }

        info!(
            "Submission finished: {}/{} succeeded, {} failed",
            summary.succeeded, summary.total, summary.failed
        );
        notifier.emit(UploadEvent::SubmissionFinished { summary });
        Ok(summary)
    }
}
