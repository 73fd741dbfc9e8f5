//! Canned inputs for unit and integration tests.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::upload::{
    EntryMetadata, FileCandidate, License, PreviewAllocator, PreviewHandle, SourceFile,
    UploadEntry, UploadStatus,
};

use super::MockPreviewAllocator;

const MB: u64 = 1024 * 1024;

pub fn candidate(name: &str, mime_type: &str, size_bytes: u64) -> FileCandidate {
    FileCandidate {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        size_bytes,
    }
}

pub fn jpeg_candidate(name: &str, size_mb: u64) -> FileCandidate {
    candidate(name, "image/jpeg", size_mb * MB)
}

pub fn mp4_candidate(name: &str, size_mb: u64) -> FileCandidate {
    candidate(name, "video/mp4", size_mb * MB)
}

fn mime_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

/// A fresh pending entry with default metadata and a live mock preview.
pub fn entry(
    name: &str,
    allocator: Arc<MockPreviewAllocator>,
) -> (UploadEntry, PreviewHandle) {
    let source = SourceFile::new(name.to_string(), mime_for(name).to_string(), MB);
    let preview = PreviewHandle::acquire(allocator as Arc<dyn PreviewAllocator>, &source);
    let entry = UploadEntry {
        id: Uuid::new_v4().to_string(),
        metadata: EntryMetadata::for_file(&source.name, License::default()),
        preview_url: preview.url().to_string(),
        progress: 0,
        status: UploadStatus::Pending,
        error: None,
        source,
        added_at: Utc::now(),
    };
    (entry, preview)
}
