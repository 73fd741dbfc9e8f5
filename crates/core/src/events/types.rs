use serde::{Deserialize, Serialize};

use crate::upload::SubmissionSummary;

/// Pipeline notification events.
///
/// Consumed by an external toast/alert layer; every variant carries enough
/// payload to render a human-readable message on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadEvent {
    /// An intake batch finished with at least one accepted file.
    FilesAccepted {
        count: usize,
        /// Derived titles of the accepted files, in offer order
        titles: Vec<String>,
    },

    /// One candidate was turned away at intake.
    FileRejected {
        name: String,
        /// "unsupported_type" or "too_large"
        reason: String,
    },

    /// An entry was removed by the user.
    FileRemoved { entry_id: String, title: String },

    /// The whole pipeline was cleared.
    FilesCleared { count: usize },

    /// Submission was refused because metadata is incomplete.
    ValidationBlocked {
        /// Titles of the entries that failed validation
        invalid_titles: Vec<String>,
    },

    /// A free-form category collided with a predefined one.
    DuplicateCategoryRejected { entry_id: String, name: String },

    /// An entry started its transfer.
    TransferStarted { entry_id: String, title: String },

    /// Progress update for an uploading entry.
    TransferProgress { entry_id: String, percent: u8 },

    /// An entry finished transferring successfully.
    TransferCompleted { entry_id: String, title: String },

    /// An entry's transfer failed.
    TransferFailed {
        entry_id: String,
        title: String,
        error: String,
    },

    /// The submission run finished.
    SubmissionFinished { summary: SubmissionSummary },
}

impl UploadEvent {
    /// Returns the event type as a string for metrics and logs
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FilesAccepted { .. } => "files_accepted",
            Self::FileRejected { .. } => "file_rejected",
            Self::FileRemoved { .. } => "file_removed",
            Self::FilesCleared { .. } => "files_cleared",
            Self::ValidationBlocked { .. } => "validation_blocked",
            Self::DuplicateCategoryRejected { .. } => "duplicate_category_rejected",
            Self::TransferStarted { .. } => "transfer_started",
            Self::TransferProgress { .. } => "transfer_progress",
            Self::TransferCompleted { .. } => "transfer_completed",
            Self::TransferFailed { .. } => "transfer_failed",
            Self::SubmissionFinished { .. } => "submission_finished",
        }
    }

    /// Extract entry_id if this event is about a single entry
    pub fn entry_id(&self) -> Option<&str> {
        match self {
            Self::FileRemoved { entry_id, .. }
            | Self::DuplicateCategoryRejected { entry_id, .. }
            | Self::TransferStarted { entry_id, .. }
            | Self::TransferProgress { entry_id, .. }
            | Self::TransferCompleted { entry_id, .. }
            | Self::TransferFailed { entry_id, .. } => Some(entry_id),
            _ => None,
        }
    }
}
