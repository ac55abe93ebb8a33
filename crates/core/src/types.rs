//! Shared domain types for datasets, assets and captions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::layout::validate_path_component;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// ---------------------------------------------------------------------------
// Dataset identity
// ---------------------------------------------------------------------------

/// Dataset identifier. The name doubles as the id and as the directory name,
/// so it must be a single, non-hidden path component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    /// Validate a raw dataset name/id.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        validate_path_component("dataset name", raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Asset category
// ---------------------------------------------------------------------------

/// Fixed partition of assets inside a dataset. Each variant is also the name
/// of a subdirectory of the dataset directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Images,
    Videos,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 2] = [AssetCategory::Images, AssetCategory::Videos];

    /// Directory name (and wire value).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }

    /// Singular label used when composing asset ids.
    pub fn singular(self) -> &'static str {
        match self {
            Self::Images => "image",
            Self::Videos => "video",
        }
    }

    /// Infer the category from an upload's MIME type: `image/*` is an image,
    /// anything else (including an unknown type) is a video.
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().to_ascii_lowercase().starts_with("image/") {
            Self::Images
        } else {
            Self::Videos
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(Self::Images),
            "videos" => Ok(Self::Videos),
            other => Err(CoreError::Validation(format!(
                "Invalid asset type '{other}'. Must be one of: images, videos"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog views
// ---------------------------------------------------------------------------

/// A freshly created dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRef {
    pub id: DatasetId,
    pub name: String,
}

/// Per-dataset aggregate derived from a directory scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub name: String,
    pub asset_count: usize,
    pub image_count: usize,
    pub video_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

/// One media file inside a dataset, with the location of its caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: AssetCategory,
    pub path: String,
    pub caption_path: String,
}

/// Dataset summary plus every asset it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetDetail {
    pub dataset: DatasetSummary,
    pub assets: Vec<AssetDescriptor>,
}

// ---------------------------------------------------------------------------
// Asset store results
// ---------------------------------------------------------------------------

/// File reference returned by ingest and caption writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFile {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub category: AssetCategory,
}

/// A file reference together with the caption text that was stored for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionedAsset {
    pub file: AssetFile,
    pub caption: String,
}
