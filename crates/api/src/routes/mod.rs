pub mod datasets;
pub mod health;
pub mod upload;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /datasets                                              list, create
/// /datasets/{id}                                         detail with asset list
/// /datasets/{id}/bundle                                  zip export (POST)
/// /datasets/{id}/{asset_type}/{asset_name}/generate/caption
///                                                        generate caption (GET, not stored)
///
/// /upload                                                ingest asset (POST, multipart)
/// /upload/caption                                        save caption (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/datasets", datasets::router())
        .nest("/upload", upload::router())
}
