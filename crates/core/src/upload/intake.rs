//! File intake: validation of raw candidates and creation of pipeline entries.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::UploadConfig;

use super::preview::{PreviewAllocator, PreviewHandle};
use super::store::UploadStore;
use super::types::{EntryMetadata, SourceFile, UploadEntry, UploadStatus};

/// A raw file offered for upload, before any validation.
#[derive(Debug, Clone, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Why a candidate was rejected at intake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// MIME type is not in the configured image/video sets
    UnsupportedType,
    /// Size exceeds the configured maximum
    TooLarge,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::UnsupportedType => "unsupported_type",
            RejectionReason::TooLarge => "too_large",
        }
    }
}

/// One rejected candidate with its reason.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RejectedFile {
    pub name: String,
    pub reason: RejectionReason,
}

/// Outcome of one intake batch.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReport {
    /// Entries created from accepted candidates, in offer order
    pub accepted: Vec<UploadEntry>,
    /// Rejected candidates with reasons, in offer order
    pub rejected: Vec<RejectedFile>,
}

impl IntakeReport {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn too_large_count(&self) -> usize {
        self.rejected
            .iter()
            .filter(|r| r.reason == RejectionReason::TooLarge)
            .count()
    }

    pub fn unsupported_count(&self) -> usize {
        self.rejected
            .iter()
            .filter(|r| r.reason == RejectionReason::UnsupportedType)
            .count()
    }
}

/// Validates raw candidates and converts accepted ones into store entries.
pub struct FileAcceptor {
    config: UploadConfig,
    allocator: Arc<dyn PreviewAllocator>,
}

impl FileAcceptor {
    pub fn new(config: UploadConfig, allocator: Arc<dyn PreviewAllocator>) -> Self {
        Self { config, allocator }
    }

    /// Screen one candidate against the configured constraints.
    fn screen(&self, candidate: &FileCandidate) -> Option<RejectionReason> {
        if !self.config.is_supported_type(&candidate.mime_type) {
            return Some(RejectionReason::UnsupportedType);
        }
        if candidate.size_bytes > self.config.max_file_size_bytes {
            return Some(RejectionReason::TooLarge);
        }
        None
    }

    /// Validate a batch of candidates, inserting accepted ones into `store`.
    ///
    /// Each accepted candidate becomes exactly one pending entry with a fresh
    /// id, a preview resource, and default metadata (title = filename without
    /// its final extension). Rejected candidates never touch the store.
    pub fn accept(&self, store: &UploadStore, candidates: Vec<FileCandidate>) -> IntakeReport {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            if let Some(reason) = self.screen(&candidate) {
                debug!("Rejected {} at intake: {}", candidate.name, reason.as_str());
                rejected.push(RejectedFile {
                    name: candidate.name,
                    reason,
                });
                continue;
            }

            let source = SourceFile::new(candidate.name, candidate.mime_type, candidate.size_bytes);
            let preview = PreviewHandle::acquire(Arc::clone(&self.allocator), &source);
            let entry = UploadEntry {
                id: Uuid::new_v4().to_string(),
                metadata: EntryMetadata::for_file(&source.name, self.config.default_license),
                preview_url: preview.url().to_string(),
                progress: 0,
                status: UploadStatus::Pending,
                error: None,
                source,
                added_at: Utc::now(),
            };

            accepted.push(entry.clone());
            store.insert(entry, preview);
        }

        debug!(
            "Intake complete: {} accepted, {} rejected",
            accepted.len(),
            rejected.len()
        );
        IntakeReport { accepted, rejected }
    }
}
