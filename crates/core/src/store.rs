//! Asset store: ingest uploads and read/write their captions.
//!
//! Ingest moves a staged upload into `{dataset}/{category}/` under a
//! timestamp-prefixed name and always writes a sibling caption file, so the
//! media/caption pairing holds from the moment an asset becomes visible.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::captioning::CaptionGenerator;
use crate::error::CoreError;
use crate::fs_util;
use crate::layout::{
    base_name, caption_file_name, is_caption_file, sanitize_upload_name, stored_file_name,
    validate_path_component, DatasetLayout, CAPTIONABLE_IMAGE_EXTENSIONS, CAPTION_EXTENSION,
};
use crate::types::{AssetCategory, AssetFile, CaptionedAsset, DatasetId};

/// An upload that has been spooled to disk and is ready to be ingested.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Target dataset. Required; the dataset must already exist.
    pub dataset_id: Option<String>,
    /// Explicit category. Inferred from `mime_type` when absent.
    pub category: Option<AssetCategory>,
    /// Temporary file holding the upload. Moved, not copied, on success.
    pub staged_file: PathBuf,
    /// File name as sent by the client.
    pub original_file_name: String,
    pub mime_type: Option<String>,
    /// Caption text supplied with the upload. Wins over generation when non-empty.
    pub caption: Option<String>,
    /// Ask the caption generator for a caption when none was supplied.
    pub generate_caption: bool,
}

pub struct AssetStore {
    layout: DatasetLayout,
    captioner: Arc<dyn CaptionGenerator>,
}

impl AssetStore {
    pub fn new(layout: DatasetLayout, captioner: Arc<dyn CaptionGenerator>) -> Self {
        Self { layout, captioner }
    }

    pub fn captioner(&self) -> &dyn CaptionGenerator {
        self.captioner.as_ref()
    }

    /// Move a staged upload into its dataset and write its caption file.
    ///
    /// Caption generation failures degrade to an empty caption. If the
    /// caption file cannot be written, the moved media file is removed again.
    pub async fn ingest(&self, req: IngestRequest) -> Result<CaptionedAsset, CoreError> {
        let raw_id = req
            .dataset_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::Validation("dataset_id is required".into()))?;
        let id = DatasetId::parse(raw_id)?;

        let category = req.category.unwrap_or_else(|| {
            AssetCategory::from_mime(req.mime_type.as_deref().unwrap_or_default())
        });

        if !fs_util::is_dir(&self.layout.dataset_dir(&id))
            .await
            .map_err(CoreError::storage(format!("stat dataset '{id}'")))?
        {
            return Err(CoreError::NotFound {
                entity: "Dataset",
                id: id.to_string(),
            });
        }

        let original = sanitize_upload_name(&req.original_file_name);
        if is_caption_file(&original) {
            return Err(CoreError::Validation(format!(
                "'.{CAPTION_EXTENSION}' files are reserved for captions and cannot be uploaded"
            )));
        }

        let category_dir = self.layout.category_dir(&id, category);
        tokio::fs::create_dir_all(&category_dir)
            .await
            .map_err(CoreError::storage("create category directory"))?;

        let stored = self.unused_stored_name(&id, category, &original).await?;
        let media_path = self.layout.media_path(&id, category, &stored);
        fs_util::move_file(&req.staged_file, &media_path)
            .await
            .map_err(CoreError::storage("move upload into dataset"))?;

        let caption = match req.caption.filter(|c| !c.is_empty()) {
            Some(text) => text,
            None if req.generate_caption => self.generate_or_empty(&media_path).await,
            None => String::new(),
        };

        let caption_path = self.layout.caption_path(&id, category, base_name(&stored));
        if let Err(e) = tokio::fs::write(&caption_path, &caption).await {
            // Best-effort: do not leave a media file without its caption.
            let _ = tokio::fs::remove_file(&media_path).await;
            return Err(CoreError::storage("write caption file")(e));
        }

        tracing::info!(
            dataset = %id,
            %category,
            original = %original,
            stored = %stored,
            caption_len = caption.len(),
            "Asset ingested"
        );

        Ok(CaptionedAsset {
            file: AssetFile {
                name: original,
                path: DatasetLayout::public_path(&id, category, &stored),
                category,
            },
            caption,
        })
    }

    /// Generate (but do not store) a caption for the image `{base_name}.{jpg|png|jpeg}`.
    ///
    /// The first extension found on disk wins.
    pub async fn generate_caption_for(
        &self,
        dataset_id: &DatasetId,
        category: AssetCategory,
        base_name: &str,
    ) -> Result<String, CoreError> {
        validate_path_component("asset name", base_name)?;
        let media_path = self
            .find_captionable_image(dataset_id, category, base_name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Asset",
                id: format!("{dataset_id}/{category}/{base_name}"),
            })?;

        let caption = self.captioner.generate(&media_path).await?;
        tracing::debug!(path = %media_path.display(), "Caption generated");
        Ok(caption)
    }

    /// Overwrite the caption of `asset_name` (extension optional) with `caption`.
    ///
    /// Target directories are created as needed; the media file itself is not
    /// required to exist.
    pub async fn set_caption(
        &self,
        dataset_id: &DatasetId,
        category: AssetCategory,
        asset_name: &str,
        caption: &str,
    ) -> Result<CaptionedAsset, CoreError> {
        validate_path_component("asset name", asset_name)?;
        let base = base_name(asset_name);
        validate_path_component("asset name", base)?;

        tokio::fs::create_dir_all(self.layout.category_dir(dataset_id, category))
            .await
            .map_err(CoreError::storage("create category directory"))?;

        let caption_path = self.layout.caption_path(dataset_id, category, base);
        tokio::fs::write(&caption_path, caption)
            .await
            .map_err(CoreError::storage("write caption file"))?;

        tracing::info!(dataset = %dataset_id, %category, asset = %base, "Caption saved");

        Ok(CaptionedAsset {
            file: AssetFile {
                name: asset_name.to_string(),
                path: DatasetLayout::public_path(dataset_id, category, &caption_file_name(base)),
                category,
            },
            caption: caption.to_string(),
        })
    }

    async fn find_captionable_image(
        &self,
        dataset_id: &DatasetId,
        category: AssetCategory,
        base_name: &str,
    ) -> Result<Option<PathBuf>, CoreError> {
        for ext in CAPTIONABLE_IMAGE_EXTENSIONS {
            let candidate = self
                .layout
                .media_path(dataset_id, category, &format!("{base_name}.{ext}"));
            if fs_util::is_file(&candidate)
                .await
                .map_err(CoreError::storage("stat media file"))?
            {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Pick `{millis}_{original}`, bumping the timestamp while the name (or its
    /// caption) is already taken.
    async fn unused_stored_name(
        &self,
        id: &DatasetId,
        category: AssetCategory,
        original: &str,
    ) -> Result<String, CoreError> {
        let mut millis = chrono::Utc::now().timestamp_millis();
        loop {
            let candidate = stored_file_name(original, millis);
            let media = self.layout.media_path(id, category, &candidate);
            let caption = self.layout.caption_path(id, category, base_name(&candidate));
            if !exists(&media).await? && !exists(&caption).await? {
                return Ok(candidate);
            }
            millis += 1;
        }
    }

    async fn generate_or_empty(&self, media_path: &Path) -> String {
        match self.captioner.generate(media_path).await {
            Ok(caption) => caption,
            Err(e) => {
                tracing::warn!(error = %e, path = %media_path.display(), "Caption generation failed, storing empty caption");
                String::new()
            }
        }
    }
}

async fn exists(path: &Path) -> Result<bool, CoreError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(CoreError::storage("stat asset path"))
}
