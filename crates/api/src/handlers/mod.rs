pub mod datasets;
pub mod upload;
