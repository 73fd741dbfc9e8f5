//! The upload pipeline: intake, entry store, validation, simulated
//! transfer, and submission orchestration.

mod intake;
mod orchestrator;
mod preview;
mod session;
mod store;
mod transfer;
pub mod types;
pub mod validate;

pub use intake::{FileAcceptor, FileCandidate, IntakeReport, RejectedFile, RejectionReason};
pub use orchestrator::{SubmissionOrchestrator, SubmissionSummary, SubmitError};
pub use preview::{LocalPreviewAllocator, PreviewAllocator, PreviewHandle};
pub use session::{SessionError, UploadSession, UploadStats};
pub use store::{StoreError, UploadStore};
pub use transfer::{
    Transfer, TransferOutcome, TransferSimulator, TRANSFER_FAILED_MESSAGE,
};
pub use types::{
    default_categories, Category, EntryMetadata, License, MetadataPatch, SourceFile, UploadEntry,
    UploadStatus, OTHER_CATEGORY_ID,
};
pub use validate::ValidationError;
