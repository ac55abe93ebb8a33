//! Shared response envelope for API handlers.
//!
//! Successful JSON responses are `{ "success": true, ...payload }`, matching
//! the `{ "success": false, "message": ... }` shape of [`crate::error::AppError`].

use serde::Serialize;

/// `{ "success": true, ...T }` envelope. `T` must serialize as an object.
///
/// # Example
///
/// ```ignore
/// Ok(Json(SuccessResponse::new(DatasetList { datasets })))
/// ```
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
