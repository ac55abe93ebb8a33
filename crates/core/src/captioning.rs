//! Caption generation seam.
//!
//! The asset store only knows the [`CaptionGenerator`] trait; the HTTP
//! adapter for the remote captioning model lives in its own crate.

use std::path::Path;

use async_trait::async_trait;

/// Failure of a caption generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    /// The captioning endpoint or model was not configured at startup.
    #[error("Captioning is not configured: {0}")]
    Configuration(String),

    /// The remote service failed, timed out, or returned something unusable.
    #[error("Captioning service error: {0}")]
    Upstream(String),

    /// The media file could not be read.
    #[error("Failed to read media file: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces a text description of a media file.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn generate(&self, media_path: &Path) -> Result<String, CaptionError>;

    /// Whether this generator can succeed at all.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Stand-in used when no captioning endpoint is configured. Every call fails
/// with [`CaptionError::Configuration`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredCaptioner;

#[async_trait]
impl CaptionGenerator for UnconfiguredCaptioner {
    async fn generate(&self, _media_path: &Path) -> Result<String, CaptionError> {
        Err(CaptionError::Configuration(
            "set LLM_BASE_URL and LLM_MODEL to enable caption generation".into(),
        ))
    }

    fn is_configured(&self) -> bool {
        false
    }
}
