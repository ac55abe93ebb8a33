//! Dataset and asset file-store for captioned media collections.
//!
//! A dataset is a directory under the datasets root with one subdirectory per
//! [`types::AssetCategory`]. Every media file inside a category directory has
//! a sibling caption file sharing its base name. There is no manifest: every
//! read re-derives state from the directory tree.

pub mod bundle;
pub mod captioning;
pub mod catalog;
pub mod error;
pub mod fs_util;
pub mod layout;
pub mod store;
pub mod types;
