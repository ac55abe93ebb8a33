//! Route definitions for datasets.
//!
//! Mounted at `/datasets`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::datasets;
use crate::state::AppState;

/// Routes mounted at `/datasets`.
///
/// ```text
/// GET    /                                               -> list_datasets
/// POST   /                                               -> create_dataset
/// GET    /{id}                                           -> get_dataset
/// POST   /{id}/bundle                                    -> bundle_dataset
/// GET    /{id}/{asset_type}/{asset_name}/generate/caption -> generate_caption
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(datasets::list_datasets).post(datasets::create_dataset),
        )
        .route("/{id}", get(datasets::get_dataset))
        .route("/{id}/bundle", post(datasets::bundle_dataset))
        .route(
            "/{id}/{asset_type}/{asset_name}/generate/caption",
            get(datasets::generate_caption),
        )
}
