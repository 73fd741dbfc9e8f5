//! Test doubles and fixtures.
//!
//! Compiled into the library so integration tests and downstream crates can
//! exercise the pipeline without its randomized or resource-owning
//! collaborators.

pub mod fixtures;
mod mock_preview;
mod mock_transfer;

pub use mock_preview::MockPreviewAllocator;
pub use mock_transfer::MockTransfer;
