//! Core upload pipeline data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Licenses
// ============================================================================

/// Creative Commons license assigned to an uploaded file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum License {
    /// No Rights Reserved
    #[default]
    #[serde(rename = "CC0")]
    Cc0,
    /// Attribution Required
    #[serde(rename = "CC BY")]
    CcBy,
    /// Share-Alike
    #[serde(rename = "CC BY-SA")]
    CcBySa,
    /// Non-Commercial
    #[serde(rename = "CC BY-NC")]
    CcByNc,
    /// No Derivatives
    #[serde(rename = "CC BY-ND")]
    CcByNd,
}

impl License {
    /// All licenses, in display order.
    pub fn all() -> [License; 5] {
        [
            License::Cc0,
            License::CcBy,
            License::CcBySa,
            License::CcByNc,
            License::CcByNd,
        ]
    }

    /// Short identifier as shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            License::Cc0 => "CC0",
            License::CcBy => "CC BY",
            License::CcBySa => "CC BY-SA",
            License::CcByNc => "CC BY-NC",
            License::CcByNd => "CC BY-ND",
        }
    }

    /// Human-readable description of what the license permits.
    pub fn description(&self) -> &'static str {
        match self {
            License::Cc0 => {
                "No Rights Reserved - Free for personal and commercial use, no attribution required"
            }
            License::CcBy => {
                "Attribution Required - Free for personal and commercial use with attribution"
            }
            License::CcBySa => {
                "Share-Alike - Free to use with attribution, derivatives must use the same license"
            }
            License::CcByNc => {
                "Non-Commercial - Free for personal use with attribution, no commercial use"
            }
            License::CcByNd => {
                "No Derivatives - Free to use with attribution, no modifications allowed"
            }
        }
    }
}

impl std::fmt::Display for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Category id that switches the category picker into free-form input.
pub const OTHER_CATEGORY_ID: &str = "other";

/// A predefined media category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Stable identifier (e.g. "nature")
    pub id: String,
    /// Display name (e.g. "Nature")
    pub name: String,
    /// Suggested subcategories, in display order
    pub subcategories: Vec<String>,
}

impl Category {
    fn new(id: &str, name: &str, subcategories: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The built-in category set offered to uploaders.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new(
            "nature",
            "Nature",
            &["Landscape", "Wildlife", "Forest", "Ocean", "Mountains"],
        ),
        Category::new(
            "urban",
            "Urban",
            &["City", "Architecture", "Street", "Night", "Buildings"],
        ),
        Category::new(
            "people",
            "People",
            &["Portrait", "Lifestyle", "Fashion", "Culture", "Events"],
        ),
        Category::new(
            "technology",
            "Technology",
            &["Gadgets", "Software", "Innovation", "Digital", "AI"],
        ),
        Category::new(
            "art",
            "Art",
            &["Abstract", "Painting", "Design", "Sculpture", "Digital Art"],
        ),
        Category::new(
            OTHER_CATEGORY_ID,
            "Other",
            &["Food", "Travel", "Sports", "Business", "Education"],
        ),
    ]
}

// ============================================================================
// Entries
// ============================================================================

/// Reference to the underlying binary payload of an entry.
///
/// The pipeline never reads the payload itself; the transfer is simulated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    /// Original filename, extension included
    pub name: String,
    /// MIME type as reported at intake (e.g. "image/jpeg")
    pub mime_type: String,
    /// Payload size in bytes
    pub size_bytes: u64,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }
}

/// Editable metadata attached to an entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryMetadata {
    pub title: String,
    pub description: String,
    /// Tags in insertion order
    pub tags: Vec<String>,
    pub license: License,
    /// Predefined category id, or [`OTHER_CATEGORY_ID`]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Free-form category, meaningful only when `category` is "other"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
}

impl EntryMetadata {
    /// Default metadata for a freshly accepted file: title derived from the
    /// filename with its final extension stripped, everything else empty.
    pub fn for_file(file_name: &str, license: License) -> Self {
        Self {
            title: strip_extension(file_name).to_string(),
            description: String::new(),
            tags: Vec::new(),
            license,
            category: String::new(),
            subcategory: None,
            custom_category: None,
            collection_id: None,
        }
    }
}

/// Strip the final extension from a filename ("sunset.jpg" -> "sunset",
/// "archive.tar.gz" -> "archive.tar", "README" -> "README").
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Partial metadata update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub license: Option<License>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub custom_category: Option<String>,
    pub collection_id: Option<String>,
}

impl MetadataPatch {
    /// Merge this patch into existing metadata.
    pub fn apply_to(&self, metadata: &mut EntryMetadata) {
        if let Some(title) = &self.title {
            metadata.title = title.clone();
        }
        if let Some(description) = &self.description {
            metadata.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            metadata.tags = tags.clone();
        }
        if let Some(license) = self.license {
            metadata.license = license;
        }
        if let Some(category) = &self.category {
            metadata.category = category.clone();
        }
        if let Some(subcategory) = &self.subcategory {
            metadata.subcategory = Some(subcategory.clone());
        }
        if let Some(custom_category) = &self.custom_category {
            metadata.custom_category = Some(custom_category.clone());
        }
        if let Some(collection_id) = &self.collection_id {
            metadata.collection_id = Some(collection_id.clone());
        }
    }
}

/// Transfer status of an entry.
///
/// State machine:
/// ```text
/// pending -> uploading -> success
///                  \
///                   -> error
/// ```
/// The terminal states stay terminal until the entry is removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    /// Returns the status as a string for logs and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }

    /// True for success and error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One file moving through the upload pipeline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadEntry {
    /// Unique id, generated at intake, immutable
    pub id: String,
    pub source: SourceFile,
    /// Display URL of the preview resource owned by the store
    pub preview_url: String,
    /// 0-100; meaningful while uploading and after success
    pub progress: u8,
    pub status: UploadStatus,
    /// Present only when status is error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: EntryMetadata,
    pub added_at: DateTime<Utc>,
}
