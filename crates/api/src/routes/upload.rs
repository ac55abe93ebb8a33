//! Route definitions for asset upload.
//!
//! Mounted at `/upload`.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::upload;
use crate::state::AppState;

/// Routes mounted at `/upload`.
///
/// ```text
/// POST   /          -> upload_asset   (multipart)
/// PUT    /caption   -> save_caption
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload::upload_asset))
        .route("/caption", put(upload::save_caption))
}
