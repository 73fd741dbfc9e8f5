use std::sync::atomic::{AtomicUsize, Ordering};

use crate::upload::{PreviewAllocator, SourceFile};

/// Counting [`PreviewAllocator`] for asserting resource lifecycles.
#[derive(Debug, Default)]
pub struct MockPreviewAllocator {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl MockPreviewAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total acquisitions so far.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Total releases so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Currently outstanding previews.
    pub fn live(&self) -> usize {
        self.acquired() - self.released()
    }
}

impl PreviewAllocator for MockPreviewAllocator {
    fn acquire(&self, source: &SourceFile) -> String {
        let n = self.acquired.fetch_add(1, Ordering::SeqCst);
        format!("mock://{}/{}", n, source.name)
    }

    fn release(&self, _url: &str) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
