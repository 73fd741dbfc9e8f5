//! Metadata validation: the submission gate.
//!
//! All checks here are pure. Callers re-run them after every metadata
//! mutation; nothing is cached.

use thiserror::Error;

use super::types::{Category, EntryMetadata, UploadEntry, OTHER_CATEGORY_ID};

/// Error type for metadata validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A custom category name collides (case-insensitively) with a
    /// predefined category.
    #[error("Category \"{0}\" already exists")]
    DuplicateCategory(String),
}

/// Resolve the category an entry would be published under.
///
/// Returns `None` when no usable category is set: the category field is
/// empty, or "other" is selected without a custom value.
pub fn effective_category(metadata: &EntryMetadata) -> Option<&str> {
    if metadata.category.is_empty() {
        return None;
    }
    if metadata.category == OTHER_CATEGORY_ID {
        return metadata
            .custom_category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
    }
    Some(&metadata.category)
}

/// Check a free-form category name against the predefined set.
pub fn check_custom_category(name: &str, categories: &[Category]) -> Result<(), ValidationError> {
    let collision = categories
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(name.trim()));
    if collision {
        return Err(ValidationError::DuplicateCategory(name.trim().to_string()));
    }
    Ok(())
}

/// An entry may be submitted when it has a non-blank title, at least one
/// tag, and a resolvable category.
pub fn entry_is_valid(entry: &UploadEntry) -> bool {
    !entry.metadata.title.trim().is_empty()
        && !entry.metadata.tags.is_empty()
        && effective_category(&entry.metadata).is_some()
}

/// The pipeline may be submitted only when it is non-empty and every entry
/// is valid.
pub fn pipeline_is_valid(entries: &[UploadEntry]) -> bool {
    !entries.is_empty() && entries.iter().all(entry_is_valid)
}
