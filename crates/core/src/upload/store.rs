//! In-memory entry store.
//!
//! One store belongs to one upload session. Entries are kept in insertion
//! order, which is also the render and submission order. All writes go
//! through a single mutex, so concurrent transfer updates for different
//! entries cannot corrupt ordering or id uniqueness.

use std::sync::Mutex;

use thiserror::Error;

use super::preview::PreviewHandle;
use super::types::{MetadataPatch, UploadEntry, UploadStatus};

/// Error type for store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No entry with the given id. A stale id indicates a caller bug
    /// (or an entry removed while a transfer was in flight).
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// The requested status change violates the entry state machine.
    /// Should never occur under correct orchestration.
    #[error("Invalid transition for entry {entry_id}: {from} -> {to}")]
    InvalidTransition {
        entry_id: String,
        from: String,
        to: String,
    },
}

struct StoredEntry {
    entry: UploadEntry,
    // Owned here so removal and clear release the preview exactly once.
    #[allow(dead_code)]
    preview: PreviewHandle,
}

/// Insertion-ordered collection of upload entries.
#[derive(Default)]
pub struct UploadStore {
    entries: Mutex<Vec<StoredEntry>>,
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accepted entry together with its preview resource.
    pub fn insert(&self, entry: UploadEntry, preview: PreviewHandle) {
        let mut entries = self.entries.lock().unwrap();
        entries.push(StoredEntry { entry, preview });
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<UploadEntry> {
        let entries = self.entries.lock().unwrap();
        entries.iter().map(|s| s.entry.clone()).collect()
    }

    /// Snapshot of a single entry.
    pub fn get(&self, id: &str) -> Option<UploadEntry> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .find(|s| s.entry.id == id)
            .map(|s| s.entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Merge a metadata patch into an entry.
    pub fn patch_metadata(&self, id: &str, patch: &MetadataPatch) -> Result<UploadEntry, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let stored = entries
            .iter_mut()
            .find(|s| s.entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        patch.apply_to(&mut stored.entry.metadata);
        Ok(stored.entry.clone())
    }

    /// Remove an entry, releasing its preview resource.
    pub fn remove(&self, id: &str) -> Result<UploadEntry, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let idx = entries
            .iter()
            .position(|s| s.entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        // Dropping the StoredEntry drops the PreviewHandle.
        let stored = entries.remove(idx);
        Ok(stored.entry)
    }

    /// Remove every entry, releasing all preview resources.
    /// Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Apply a status change, enforcing the entry state machine.
    ///
    /// Used exclusively by the transfer layer. `progress` is required for
    /// uploading updates and ignored for terminal transitions (success pins
    /// progress to 100, error freezes it at its last value).
    pub fn set_status(
        &self,
        id: &str,
        status: UploadStatus,
        progress: Option<u8>,
        error: Option<String>,
    ) -> Result<UploadEntry, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let stored = entries
            .iter_mut()
            .find(|s| s.entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let entry = &mut stored.entry;
        let invalid = |entry: &UploadEntry, from: String, to: String| StoreError::InvalidTransition {
            entry_id: entry.id.clone(),
            from,
            to,
        };

        match (entry.status, status) {
            (UploadStatus::Pending, UploadStatus::Uploading) => {
                entry.status = UploadStatus::Uploading;
                entry.progress = 0;
                entry.error = None;
            }
            (UploadStatus::Uploading, UploadStatus::Uploading) => {
                let next = progress.ok_or_else(|| {
                    invalid(entry, "uploading".to_string(), "uploading (no progress)".to_string())
                })?;
                if next < entry.progress || next > 100 {
                    return Err(invalid(
                        entry,
                        format!("uploading at {}%", entry.progress),
                        format!("uploading at {}%", next),
                    ));
                }
                entry.progress = next;
            }
            (UploadStatus::Uploading, UploadStatus::Success) => {
                entry.status = UploadStatus::Success;
                entry.progress = 100;
                entry.error = None;
            }
            (UploadStatus::Uploading, UploadStatus::Error) => {
                entry.status = UploadStatus::Error;
                entry.error = Some(error.unwrap_or_else(|| "Upload failed".to_string()));
            }
            (from, to) => {
                return Err(invalid(entry, from.as_str().to_string(), to.as_str().to_string()));
            }
        }

        Ok(entry.clone())
    }
}
