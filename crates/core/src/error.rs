use crate::captioning::CaptionError;

/// Domain error shared by the catalog, asset store and bundle exporter.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error ({context}): {source}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Caption(#[from] CaptionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a `map_err` adapter that tags an I/O failure with what was being attempted.
    ///
    /// ```ignore
    /// tokio::fs::create_dir_all(&dir).await.map_err(CoreError::storage("create category directory"))?;
    /// ```
    pub fn storage(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> CoreError {
        let context = context.into();
        move |source| CoreError::Storage { context, source }
    }
}
