//! Handlers for the `/datasets` resource.
//!
//! Datasets are identified by name; `{id}` in every path is that name.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use mediaset_core::types::{AssetCategory, DatasetDetail, DatasetId, DatasetRef, DatasetSummary};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Body of `POST /api/datasets`.
#[derive(Debug, Deserialize)]
pub struct CreateDatasetRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedDataset {
    pub dataset: DatasetRef,
}

#[derive(Debug, Serialize)]
pub struct DatasetList {
    pub datasets: Vec<DatasetSummary>,
}

/// POST /api/datasets
///
/// Create a dataset directory with its `images/` and `videos/` subdirectories.
/// Creating an existing dataset is not an error.
pub async fn create_dataset(
    State(state): State<AppState>,
    Json(input): Json<CreateDatasetRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<CreatedDataset>>)> {
    let name = input
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Dataset name is required".into()))?;

    let dataset = state.catalog.create(&name).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(CreatedDataset { dataset })),
    ))
}

/// GET /api/datasets
pub async fn list_datasets(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<DatasetList>>> {
    let datasets = state.catalog.list().await?;
    Ok(Json(SuccessResponse::new(DatasetList { datasets })))
}

/// GET /api/datasets/{id}
///
/// Dataset summary plus one descriptor per media file.
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse<DatasetDetail>>> {
    let id = DatasetId::parse(&id)?;
    let detail = state.catalog.get(&id).await?;
    Ok(Json(SuccessResponse::new(detail)))
}

/// POST /api/datasets/{id}/bundle
///
/// Stream the dataset as a zip archive while it is being written. Any request
/// body is ignored. An unknown dataset still gets a JSON 404, since entries
/// are resolved before the first byte is sent.
pub async fn bundle_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = DatasetId::parse(&id)?;
    let bundle = state.exporter.bundle(&id).await?;

    let disposition = attachment_disposition(&bundle.file_name);
    let stream = ReaderStream::new(bundle.into_reader());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// `Content-Disposition` value with an ASCII-only quoted file name.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            ' ' => ' ',
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// GET /api/datasets/{id}/{asset_type}/{asset_name}/generate/caption
///
/// Generate a caption for an image asset and return it as plain text.
/// Nothing is persisted; saving goes through `PUT /api/upload/caption`.
pub async fn generate_caption(
    State(state): State<AppState>,
    Path((id, asset_type, asset_name)): Path<(String, String, String)>,
) -> AppResult<String> {
    let id = DatasetId::parse(&id)?;
    let category: AssetCategory = asset_type.parse()?;
    let caption = state
        .store
        .generate_caption_for(&id, category, &asset_name)
        .await?;
    Ok(caption)
}
