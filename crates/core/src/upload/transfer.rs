//! Simulated transfer: drives one entry through the upload state machine.
//!
//! There is no real network here. Progress advances in randomized steps with
//! randomized delays, standing in for variable throughput, and a configured
//! failure probability decides whether a transfer faults before completion.
//! The randomness is seedable so tests run deterministically with zero
//! delays.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, error};

use crate::config::SimulatorConfig;
use crate::events::{Notifier, UploadEvent};

use super::store::{StoreError, UploadStore};
use super::types::UploadStatus;

/// Error message recorded on entries whose simulated transfer faults.
pub const TRANSFER_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

/// Terminal outcome of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Succeeded,
    Failed { error: String },
    /// The entry disappeared from the store mid-transfer; no further
    /// writes were applied.
    Cancelled,
}

/// The transfer seam.
///
/// Implementations must always reach a terminal outcome in bounded time and
/// must check entry liveness before every store write.
#[async_trait]
pub trait Transfer: Send + Sync {
    async fn run(&self, store: &UploadStore, notifier: &Notifier, entry_id: &str)
        -> TransferOutcome;
}

/// Default [`Transfer`] implementation with randomized steps and delays.
pub struct TransferSimulator {
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
}

impl TransferSimulator {
    /// Create a simulator seeded from the OS.
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a simulator with a fixed seed for deterministic tests.
    pub fn with_seed(config: SimulatorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draw the progress point at which this transfer will fault, if any.
    fn draw_fault(&self) -> Option<u8> {
        let mut rng = self.rng.lock().unwrap();
        if rng.gen_bool(self.config.failure_probability) {
            Some(rng.gen_range(1..=100))
        } else {
            None
        }
    }

    /// Draw the next step size and inter-step delay.
    fn draw_step(&self) -> (u8, u64) {
        let mut rng = self.rng.lock().unwrap();
        let step = rng.gen_range(self.config.min_step_pct..=self.config.max_step_pct);
        let delay = if self.config.max_step_delay_ms == 0 {
            0
        } else {
            rng.gen_range(self.config.min_step_delay_ms..=self.config.max_step_delay_ms)
        };
        (step, delay)
    }
}

#[async_trait]
impl Transfer for TransferSimulator {
    async fn run(
        &self,
        store: &UploadStore,
        notifier: &Notifier,
        entry_id: &str,
    ) -> TransferOutcome {
        // pending -> uploading
        let entry = match store.set_status(entry_id, UploadStatus::Uploading, None, None) {
            Ok(entry) => entry,
            Err(StoreError::NotFound(_)) => {
                debug!("Entry {} removed before transfer start", entry_id);
                return TransferOutcome::Cancelled;
            }
            Err(e) => {
                // Contract violation: the orchestrator only hands us pending entries.
                error!("Cannot start transfer for entry {}: {}", entry_id, e);
                return TransferOutcome::Cancelled;
            }
        };
        let title = entry.metadata.title.clone();
        notifier.emit(UploadEvent::TransferStarted {
            entry_id: entry_id.to_string(),
            title: title.clone(),
        });

        let fail_at = self.draw_fault();
        let mut progress: u8 = 0;

        loop {
            let (step, delay_ms) = self.draw_step();
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let next = progress.saturating_add(step).min(100);

            // Fault before the step that would reach the drawn point;
            // progress freezes at its last value.
            if let Some(fault_at) = fail_at {
                if next >= fault_at {
                    return match store.set_status(
                        entry_id,
                        UploadStatus::Error,
                        None,
                        Some(TRANSFER_FAILED_MESSAGE.to_string()),
                    ) {
                        Ok(_) => {
                            notifier.emit(UploadEvent::TransferFailed {
                                entry_id: entry_id.to_string(),
                                title,
                                error: TRANSFER_FAILED_MESSAGE.to_string(),
                            });
                            TransferOutcome::Failed {
                                error: TRANSFER_FAILED_MESSAGE.to_string(),
                            }
                        }
                        Err(_) => {
                            debug!("Entry {} removed mid-transfer", entry_id);
                            TransferOutcome::Cancelled
                        }
                    };
                }
            }

            progress = next;

            if progress < 100 {
                match store.set_status(entry_id, UploadStatus::Uploading, Some(progress), None) {
                    Ok(_) => notifier.emit(UploadEvent::TransferProgress {
                        entry_id: entry_id.to_string(),
                        percent: progress,
                    }),
                    Err(_) => {
                        debug!("Entry {} removed mid-transfer", entry_id);
                        return TransferOutcome::Cancelled;
                    }
                }
                continue;
            }

            // uploading -> success
            return match store.set_status(entry_id, UploadStatus::Success, None, None) {
                Ok(_) => {
                    notifier.emit(UploadEvent::TransferProgress {
                        entry_id: entry_id.to_string(),
                        percent: 100,
                    });
                    notifier.emit(UploadEvent::TransferCompleted {
                        entry_id: entry_id.to_string(),
                        title,
                    });
                    TransferOutcome::Succeeded
                }
                Err(_) => {
                    debug!("Entry {} removed mid-transfer", entry_id);
                    TransferOutcome::Cancelled
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockPreviewAllocator};
    use std::sync::Arc;

    fn store_with_entry() -> (UploadStore, String) {
        let allocator = Arc::new(MockPreviewAllocator::new());
        let store = UploadStore::new();
        let (entry, preview) = fixtures::entry("clip.mp4", allocator);
        let id = entry.id.clone();
        store.insert(entry, preview);
        (store, id)
    }

    fn config(failure_probability: f64) -> SimulatorConfig {
        SimulatorConfig {
            failure_probability,
            ..SimulatorConfig::instant()
        }
    }

    #[tokio::test]
    async fn test_successful_transfer_reaches_100() {
        let (store, id) = store_with_entry();
        let simulator = TransferSimulator::with_seed(config(0.0), 7);
        let notifier = Notifier::default();

        let outcome = simulator.run(&store, &notifier, &id).await;

        assert_eq!(outcome, TransferOutcome::Succeeded);
        let entry = store.get(&id).unwrap();
        assert_eq!(entry.status, UploadStatus::Success);
        assert_eq!(entry.progress, 100);
        assert!(entry.error.is_none());
    }

    #[tokio::test]
    async fn test_progress_events_are_monotone() {
        let (store, id) = store_with_entry();
        let simulator = TransferSimulator::with_seed(config(0.0), 42);
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        simulator.run(&store, &notifier, &id).await;

        let mut last = 0u8;
        let mut final_percent = 0u8;
        while let Ok(envelope) = rx.try_recv() {
            if let UploadEvent::TransferProgress { percent, .. } = envelope.event {
                assert!(percent >= last, "progress must never decrease");
                assert!(percent <= 100);
                last = percent;
                final_percent = percent;
            }
        }
        assert_eq!(final_percent, 100);
    }

    #[tokio::test]
    async fn test_failed_transfer_freezes_progress() {
        let (store, id) = store_with_entry();
        let simulator = TransferSimulator::with_seed(config(1.0), 13);
        let notifier = Notifier::default();

        let outcome = simulator.run(&store, &notifier, &id).await;

        assert!(matches!(outcome, TransferOutcome::Failed { .. }));
        let entry = store.get(&id).unwrap();
        assert_eq!(entry.status, UploadStatus::Error);
        assert!(entry.progress < 100);
        assert_eq!(entry.error.as_deref(), Some(TRANSFER_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_same_seed_same_progress_sequence() {
        let run_once = |seed: u64| async move {
            let (store, id) = store_with_entry();
            let simulator = TransferSimulator::with_seed(config(0.0), seed);
            let notifier = Notifier::default();
            let mut rx = notifier.subscribe();
            simulator.run(&store, &notifier, &id).await;

            let mut sequence = Vec::new();
            while let Ok(envelope) = rx.try_recv() {
                if let UploadEvent::TransferProgress { percent, .. } = envelope.event {
                    sequence.push(percent);
                }
            }
            sequence
        };

        assert_eq!(run_once(99).await, run_once(99).await);
    }

    #[tokio::test]
    async fn test_removed_entry_is_cancelled() {
        let (store, id) = store_with_entry();
        store.remove(&id).unwrap();

        let simulator = TransferSimulator::with_seed(config(0.0), 1);
        let notifier = Notifier::default();
        let outcome = simulator.run(&store, &notifier, &id).await;

        assert_eq!(outcome, TransferOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_non_pending_entry_is_not_driven() {
        let (store, id) = store_with_entry();
        store.set_status(&id, UploadStatus::Uploading, None, None).unwrap();
        store.set_status(&id, UploadStatus::Success, None, None).unwrap();

        let simulator = TransferSimulator::with_seed(config(0.0), 1);
        let notifier = Notifier::default();
        let outcome = simulator.run(&store, &notifier, &id).await;

        assert_eq!(outcome, TransferOutcome::Cancelled);
        assert_eq!(store.get(&id).unwrap().status, UploadStatus::Success);
    }
}
