//! Pipeline event emission.
//!
//! The pipeline reports what happened (intake results, removals, transfer
//! progress, submission summaries) as discrete events; an external
//! notification layer decides how to render them.

mod notifier;
mod types;

pub use notifier::{EventEnvelope, Notifier};
pub use types::UploadEvent;
