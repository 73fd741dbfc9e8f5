use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::events::Notifier;
use crate::upload::{
    Transfer, TransferOutcome, UploadStatus, UploadStore, TRANSFER_FAILED_MESSAGE,
};

/// Scripted [`Transfer`] that completes instantly.
///
/// Succeeds by default; entries registered via [`failing_for`] or
/// [`fail_entry`] fail instead. Store status is written like the real
/// simulator's, but no events are emitted, so tests can assert on the
/// caller's own emissions.
///
/// [`failing_for`]: MockTransfer::failing_for
/// [`fail_entry`]: MockTransfer::fail_entry
#[derive(Debug, Default)]
pub struct MockTransfer {
    failing: Mutex<HashSet<String>>,
    runs: Mutex<Vec<String>>,
}

impl MockTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the entry with this id to fail its transfer.
    pub fn failing_for(self, entry_id: &str) -> Self {
        self.fail_entry(entry_id);
        self
    }

    /// Script a failure after construction.
    pub fn fail_entry(&self, entry_id: &str) {
        self.failing.lock().unwrap().insert(entry_id.to_string());
    }

    /// Number of transfers run so far.
    pub fn runs(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    /// Entry ids in the order their transfers ran.
    pub fn run_ids(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transfer for MockTransfer {
    async fn run(
        &self,
        store: &UploadStore,
        _notifier: &Notifier,
        entry_id: &str,
    ) -> TransferOutcome {
        self.runs.lock().unwrap().push(entry_id.to_string());

        if store
            .set_status(entry_id, UploadStatus::Uploading, None, None)
            .is_err()
        {
            return TransferOutcome::Cancelled;
        }

        let failing = self.failing.lock().unwrap().contains(entry_id);
        if failing {
            match store.set_status(
                entry_id,
                UploadStatus::Error,
                None,
                Some(TRANSFER_FAILED_MESSAGE.to_string()),
            ) {
                Ok(_) => TransferOutcome::Failed {
                    error: TRANSFER_FAILED_MESSAGE.to_string(),
                },
                Err(_) => TransferOutcome::Cancelled,
            }
        } else {
            match store.set_status(entry_id, UploadStatus::Success, None, None) {
                Ok(_) => TransferOutcome::Succeeded,
                Err(_) => TransferOutcome::Cancelled,
            }
        }
    }
}
