//! Dataset catalog: create, list and inspect datasets.
//!
//! A dataset exists if and only if its directory exists. Counts are the
//! number of media files per category directory; caption files are never
//! counted.

use std::io;

use crate::error::CoreError;
use crate::fs_util::{self, DirTransaction};
use crate::layout::{base_name, caption_file_name, DatasetLayout};
use crate::types::{
    AssetCategory, AssetDescriptor, DatasetDetail, DatasetId, DatasetRef, DatasetSummary,
};

#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    layout: DatasetLayout,
}

impl DatasetCatalog {
    pub fn new(layout: DatasetLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Create the dataset directory and one subdirectory per category.
    ///
    /// Creating an existing dataset succeeds and fills in any missing
    /// category directory. If a step fails, directories created by this call
    /// are removed again.
    pub async fn create(&self, name: &str) -> Result<DatasetRef, CoreError> {
        let id = DatasetId::parse(name.trim())?;

        tokio::fs::create_dir_all(self.layout.root())
            .await
            .map_err(CoreError::storage("create datasets root"))?;

        let mut tx = DirTransaction::new();
        if let Err(e) = self.create_dirs(&mut tx, &id).await {
            tx.rollback().await;
            return Err(CoreError::Storage {
                context: format!("create dataset '{id}'"),
                source: e,
            });
        }
        let created = tx.commit();

        tracing::info!(dataset = %id, new_dirs = created.len(), "Dataset created");
        Ok(DatasetRef {
            name: id.as_str().to_string(),
            id,
        })
    }

    async fn create_dirs(&self, tx: &mut DirTransaction, id: &DatasetId) -> io::Result<()> {
        tx.create_dir(&self.layout.dataset_dir(id)).await?;
        for category in AssetCategory::ALL {
            tx.create_dir(&self.layout.category_dir(id, category)).await?;
        }
        Ok(())
    }

    /// Summaries of every dataset under the root, sorted by name.
    ///
    /// A missing root yields an empty list. Entries that cannot be inspected,
    /// are not directories, or are not valid dataset names are skipped.
    pub async fn list(&self) -> Result<Vec<DatasetSummary>, CoreError> {
        let mut entries = match tokio::fs::read_dir(self.layout.root()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::storage("read datasets root")(e)),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(CoreError::storage("read datasets root"))?
        {
            let path = entry.path();
            let meta = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Skipping unreadable dataset entry");
                    continue;
                }
            };
            if !meta.is_dir() {
                continue;
            }
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| DatasetId::parse(name).ok())
            else {
                continue;
            };

            let mut counts = [0usize; 2];
            for (slot, category) in counts.iter_mut().zip(AssetCategory::ALL) {
                *slot = self.category_files(&id, category).await.len();
            }

            summaries.push(summary(id, counts[0], counts[1], fs_util::created_at(&meta)));
        }

        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    /// Dataset summary plus one descriptor per media file, images first.
    pub async fn get(&self, id: &DatasetId) -> Result<DatasetDetail, CoreError> {
        let dir = self.layout.dataset_dir(id);
        let meta = match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => meta,
            Ok(_) => return Err(not_found(id)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found(id)),
            Err(e) => return Err(CoreError::storage(format!("read dataset '{id}'"))(e)),
        };

        let mut assets = Vec::new();
        for category in AssetCategory::ALL {
            let files = self.category_files(id, category).await;
            assets.extend(files.into_iter().map(|file| describe(id, category, file)));
        }

        let image_count = assets
            .iter()
            .filter(|a| a.category == AssetCategory::Images)
            .count();
        let video_count = assets.len() - image_count;

        Ok(DatasetDetail {
            dataset: summary(id.clone(), image_count, video_count, fs_util::created_at(&meta)),
            assets,
        })
    }

    /// Media files of one category. A category directory that cannot be read
    /// contributes nothing, so one broken category never hides the dataset.
    async fn category_files(&self, id: &DatasetId, category: AssetCategory) -> Vec<String> {
        let dir = self.layout.category_dir(id, category);
        match fs_util::list_media_files(&dir).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, dataset = %id, %category, "Failed to read category directory");
                Vec::new()
            }
        }
    }
}

fn not_found(id: &DatasetId) -> CoreError {
    CoreError::NotFound {
        entity: "Dataset",
        id: id.to_string(),
    }
}

fn summary(
    id: DatasetId,
    image_count: usize,
    video_count: usize,
    created_at: Option<crate::types::Timestamp>,
) -> DatasetSummary {
    DatasetSummary {
        name: id.as_str().to_string(),
        id,
        asset_count: image_count + video_count,
        image_count,
        video_count,
        created_at,
    }
}

fn describe(id: &DatasetId, category: AssetCategory, file: String) -> AssetDescriptor {
    AssetDescriptor {
        id: format!("{id}_{}_{file}", category.singular()),
        path: DatasetLayout::public_path(id, category, &file),
        caption_path: DatasetLayout::public_path(id, category, &caption_file_name(base_name(&file))),
        category,
        name: file,
    }
}
