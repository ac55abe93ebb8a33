//! Handlers for asset upload and caption saving.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use mediaset_core::error::CoreError;
use mediaset_core::store::IngestRequest;
use mediaset_core::types::{AssetCategory, CaptionedAsset, DatasetId};
use serde::{Deserialize, Deserializer};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult};
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Multipart field carrying the media file.
const FILE_FIELD: &str = "asset-file";

// ── Upload Asset ─────────────────────────────────────────────────────

/// Text fields and the spooled file of an upload form.
#[derive(Debug, Default)]
struct UploadForm {
    staged: Option<StagedFile>,
    dataset_id: Option<String>,
    asset_type: Option<String>,
    caption: Option<String>,
    generate_caption: bool,
}

#[derive(Debug)]
struct StagedFile {
    path: PathBuf,
    file_name: String,
    content_type: Option<String>,
}

/// POST /api/upload
///
/// Multipart form with a required `asset-file` field and the text fields
/// `dataset_id` (required), `asset_type`, `caption` and `generate_caption`.
/// The file is spooled to the staging directory, then moved into the dataset.
pub async fn upload_asset(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<SuccessResponse<CaptionedAsset>>)> {
    let form = read_upload_form(&state.config.upload_staging_dir, multipart).await?;

    let Some(staged) = form.staged else {
        return Err(AppError::BadRequest("No file uploaded".into()));
    };

    let ingested = ingest_staged(
        &state,
        form.dataset_id,
        form.asset_type,
        form.caption,
        form.generate_caption,
        &staged,
    )
    .await;

    match ingested {
        Ok(asset) => Ok((StatusCode::CREATED, Json(SuccessResponse::new(asset)))),
        Err(e) => {
            discard(&staged.path).await;
            Err(e)
        }
    }
}

async fn ingest_staged(
    state: &AppState,
    dataset_id: Option<String>,
    asset_type: Option<String>,
    caption: Option<String>,
    generate_caption: bool,
    staged: &StagedFile,
) -> AppResult<CaptionedAsset> {
    // Blank means "infer from MIME type".
    let category = match asset_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<AssetCategory>()?),
    };

    let request = IngestRequest {
        dataset_id,
        category,
        staged_file: staged.path.clone(),
        original_file_name: staged.file_name.clone(),
        mime_type: staged.content_type.clone(),
        caption,
        generate_caption,
    };
    Ok(state.store.ingest(request).await?)
}

/// Drain the multipart stream. The first `asset-file` part with a filename is
/// spooled to disk; if reading fails part-way, the spooled file is removed.
async fn read_upload_form(staging_dir: &Path, mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    let outcome: AppResult<()> = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                // Only parts carrying a filename are file uploads.
                FILE_FIELD if form.staged.is_none() && field.file_name().is_some() => {
                    form.staged = Some(stage_file(staging_dir, field).await?);
                }
                "dataset_id" => form.dataset_id = Some(field_text(field).await?),
                "asset_type" => form.asset_type = Some(field_text(field).await?),
                "caption" => form.caption = Some(field_text(field).await?),
                "generate_caption" => form.generate_caption = is_truthy(&field_text(field).await?),
                _ => {} // ignore unknown fields
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        if let Some(staged) = &form.staged {
            discard(&staged.path).await;
        }
        return Err(e);
    }
    Ok(form)
}

async fn field_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Stream one file field into `{staging_dir}/{uuid}.part`.
async fn stage_file(staging_dir: &Path, mut field: Field<'_>) -> AppResult<StagedFile> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(CoreError::storage("create upload staging directory"))?;
    let path = staging_dir.join(format!("{}.part", uuid::Uuid::new_v4()));

    let written: AppResult<u64> = async {
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(CoreError::storage("create staged upload"))?;
        let mut total = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(CoreError::storage("write staged upload"))?;
            total += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(CoreError::storage("flush staged upload"))?;
        Ok(total)
    }
    .await;

    match written {
        Ok(bytes) => {
            tracing::debug!(file_name = %file_name, bytes, path = %path.display(), "Upload staged");
            Ok(StagedFile {
                path,
                file_name,
                content_type,
            })
        }
        Err(e) => {
            discard(&path).await;
            Err(e)
        }
    }
}

/// Best-effort removal of a staged upload.
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove staged upload"),
    }
}

fn is_truthy(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

// ── Save Caption ─────────────────────────────────────────────────────

/// Body of `PUT /api/upload/caption`.
#[derive(Debug, Deserialize)]
pub struct SaveCaptionRequest {
    pub dataset_id: Option<String>,
    pub asset_type: Option<String>,
    pub asset_name: Option<String>,
    pub caption: Option<String>,
    /// Accepts `true` or `"true"`.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub generate_caption: bool,
}

/// PUT /api/upload/caption
///
/// Overwrite an asset's caption file. With `generate_caption` and no caption
/// text, a generated caption is stored instead (empty if generation fails).
pub async fn save_caption(
    State(state): State<AppState>,
    Json(input): Json<SaveCaptionRequest>,
) -> AppResult<Json<SuccessResponse<CaptionedAsset>>> {
    let dataset_id = required(input.dataset_id, "dataset_id")?;
    let asset_type = required(input.asset_type, "asset_type")?;
    let asset_name = required(input.asset_name, "asset_name")?;

    let id = DatasetId::parse(&dataset_id)?;
    let category: AssetCategory = asset_type.parse()?;

    let caption = match input.caption.filter(|c| !c.is_empty()) {
        Some(text) => text,
        None if input.generate_caption => {
            let base = mediaset_core::layout::base_name(&asset_name);
            match state.store.generate_caption_for(&id, category, base).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, dataset = %id, asset = %asset_name, "Caption generation failed, saving empty caption");
                    String::new()
                }
            }
        }
        None => String::new(),
    };

    let saved = state
        .store
        .set_caption(&id, category, &asset_name, &caption)
        .await?;
    Ok(Json(SuccessResponse::new(saved)))
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

/// Deserialize a flag sent either as a JSON boolean or as a string.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => is_truthy(&s),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_flag_accepts_bool_and_string() {
        let parse = |json: &str| serde_json::from_str::<SaveCaptionRequest>(json).unwrap();
        assert!(parse(r#"{"generate_caption": true}"#).generate_caption);
        assert!(parse(r#"{"generate_caption": "true"}"#).generate_caption);
        assert!(!parse(r#"{"generate_caption": "false"}"#).generate_caption);
        assert!(!parse(r#"{"generate_caption": null}"#).generate_caption);
        assert!(!parse(r#"{}"#).generate_caption);
    }

    #[test]
    fn required_rejects_blank() {
        assert!(required(Some("foo".into()), "dataset_id").is_ok());
        assert!(required(Some("  ".into()), "dataset_id").is_err());
        assert!(required(None, "dataset_id").is_err());
    }
}
