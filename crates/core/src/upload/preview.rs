//! Preview resource lifecycle.
//!
//! Every accepted file gets a derived preview resource (the stand-in for a
//! browser object URL). The resource is owned by the entry store through a
//! [`PreviewHandle`] and released exactly once, when the entry is removed or
//! the store is cleared. Release on drop means error paths cannot leak.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::SourceFile;

/// Allocator for preview resources.
///
/// Implementations must tolerate `release` being called from any thread.
pub trait PreviewAllocator: Send + Sync {
    /// Derive a preview resource for the given source file and return its URL.
    fn acquire(&self, source: &SourceFile) -> String;

    /// Release a previously acquired preview resource.
    fn release(&self, url: &str);
}

/// Owning handle to one preview resource. Releases on drop.
pub struct PreviewHandle {
    url: String,
    allocator: Arc<dyn PreviewAllocator>,
}

impl PreviewHandle {
    /// Acquire a preview resource for `source` from `allocator`.
    pub fn acquire(allocator: Arc<dyn PreviewAllocator>, source: &SourceFile) -> Self {
        let url = allocator.acquire(source);
        Self { url, allocator }
    }

    /// URL of the underlying resource.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.allocator.release(&self.url);
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("url", &self.url)
            .finish()
    }
}

/// Default allocator: mints process-local `preview://` URLs.
///
/// There is no real resource behind them, so release is just logged.
#[derive(Debug, Default)]
pub struct LocalPreviewAllocator {
    counter: AtomicU64,
}

impl LocalPreviewAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewAllocator for LocalPreviewAllocator {
    fn acquire(&self, source: &SourceFile) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("preview://{}/{}", n, source.name)
    }

    fn release(&self, url: &str) {
        tracing::debug!("Released preview resource {}", url);
    }
}
