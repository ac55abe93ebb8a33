//! On-disk layout of the datasets root.
//!
//! ```text
//! {root}/{dataset}/{images|videos}/{millis}_{base}.{ext}   media file
//! {root}/{dataset}/{images|videos}/{millis}_{base}.txt     caption file
//! ```
//!
//! Media and caption files pair up by base name (file name without its
//! extension). The caption extension is reserved and never accepted as a
//! media extension.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::types::{AssetCategory, DatasetId};

/// Extension of caption files (without the dot).
pub const CAPTION_EXTENSION: &str = "txt";

/// Extensions probed, in order, when locating a captionable image by base name.
pub const CAPTIONABLE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg"];

/// URL prefix under which the datasets root is served.
pub const PUBLIC_PREFIX: &str = "datasets";

/// Fallback when an upload arrives without a usable file name.
const DEFAULT_UPLOAD_NAME: &str = "upload";

/// Longest accepted dataset name / asset base name, in bytes.
const MAX_COMPONENT_LEN: usize = 255;

/// Longest extension kept as-is when naming stored uploads.
const MAX_EXTENSION_LEN: usize = 32;

/// Maps dataset/category/asset triples to filesystem paths and public paths.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_dir(&self, id: &DatasetId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn category_dir(&self, id: &DatasetId, category: AssetCategory) -> PathBuf {
        self.dataset_dir(id).join(category.as_str())
    }

    pub fn media_path(&self, id: &DatasetId, category: AssetCategory, file_name: &str) -> PathBuf {
        self.category_dir(id, category).join(file_name)
    }

    pub fn caption_path(&self, id: &DatasetId, category: AssetCategory, base_name: &str) -> PathBuf {
        self.category_dir(id, category)
            .join(caption_file_name(base_name))
    }

    /// Path of a file relative to the public web root, always `/`-separated.
    pub fn public_path(id: &DatasetId, category: AssetCategory, file_name: &str) -> String {
        format!("{PUBLIC_PREFIX}/{id}/{category}/{file_name}")
    }
}

/// `{base}.txt`
pub fn caption_file_name(base_name: &str) -> String {
    format!("{base_name}.{CAPTION_EXTENSION}")
}

/// File name without its final extension (`"1700_cat.png"` -> `"1700_cat"`).
pub fn base_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Whether `file_name` carries the reserved caption extension.
pub fn is_caption_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(CAPTION_EXTENSION))
}

/// Whether a directory entry name counts as a media file: not hidden and not a caption.
pub fn is_media_file_name(file_name: &str) -> bool {
    !file_name.starts_with('.') && !is_caption_file(file_name)
}

/// Reduce a client-supplied file name to its final path component.
///
/// Browsers normally send a bare name, but some clients send full paths
/// (`C:\Users\me\cat.png`, `../../etc/passwd`).
pub fn sanitize_upload_name(raw: &str) -> String {
    let last = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .replace('\0', "");
    if last.is_empty() || last == "." || last == ".." {
        DEFAULT_UPLOAD_NAME.to_string()
    } else {
        last
    }
}

/// Stored name of an ingested upload: `{millis}_{base}{.ext}`.
///
/// `original` must already be sanitized. The base is shortened so that both
/// the stored name and its caption name fit in a single path component; an
/// extension too long to keep is folded into the base.
pub fn stored_file_name(original: &str, millis: i64) -> String {
    let path = Path::new(original);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(original);
    let (base, suffix) = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.len() <= MAX_EXTENSION_LEN => (stem, format!(".{ext}")),
        _ => (original, String::new()),
    };

    let prefix = format!("{millis}_");
    let caption_suffix_len = CAPTION_EXTENSION.len() + 1;
    let budget = MAX_COMPONENT_LEN - prefix.len() - suffix.len().max(caption_suffix_len);
    format!("{prefix}{}{suffix}", truncate_on_char_boundary(base, budget))
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Validate a value that will be used verbatim as a single path component.
pub fn validate_path_component(kind: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{kind} is required")));
    }
    if value.len() > MAX_COMPONENT_LEN {
        return Err(CoreError::Validation(format!(
            "{kind} must be at most {MAX_COMPONENT_LEN} bytes"
        )));
    }
    if value.starts_with('.') {
        return Err(CoreError::Validation(format!(
            "{kind} must not start with '.'"
        )));
    }
    if value.contains(['/', '\\', '\0']) {
        return Err(CoreError::Validation(format!(
            "{kind} must not contain path separators"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> DatasetId {
        DatasetId::parse("foo").unwrap()
    }

    #[test]
    fn paths_follow_dataset_category_layout() {
        let layout = DatasetLayout::new("/data/datasets");
        assert_eq!(
            layout.category_dir(&foo(), AssetCategory::Images),
            PathBuf::from("/data/datasets/foo/images")
        );
        assert_eq!(
            layout.caption_path(&foo(), AssetCategory::Videos, "1700_clip"),
            PathBuf::from("/data/datasets/foo/videos/1700_clip.txt")
        );
        assert_eq!(
            DatasetLayout::public_path(&foo(), AssetCategory::Images, "1700_cat.png"),
            "datasets/foo/images/1700_cat.png"
        );
    }

    #[test]
    fn stored_name_prefixes_timestamp() {
        assert_eq!(stored_file_name("cat.png", 1700), "1700_cat.png");
        assert_eq!(stored_file_name("archive.tar.gz", 5), "5_archive.tar.gz");
        assert_eq!(stored_file_name("README", 5), "5_README");
        assert_eq!(stored_file_name(".bashrc", 5), "5_.bashrc");
    }

    #[test]
    fn stored_name_fits_one_path_component() {
        let long = format!("{}.png", "a".repeat(251));
        let stored = stored_file_name(&long, 1_700_000_000_000);
        assert_eq!(stored.len(), MAX_COMPONENT_LEN);
        assert!(stored.starts_with("1700000000000_aaa"));
        assert!(stored.ends_with(".png"));
        assert!(caption_file_name(base_name(&stored)).len() <= MAX_COMPONENT_LEN);
        assert!(validate_path_component("file", &stored).is_ok());

        // Multi-byte characters are never split.
        let wide = format!("{}.jpg", "é".repeat(125));
        let stored = stored_file_name(&wide, 1_700_000_000_000);
        assert!(stored.len() <= MAX_COMPONENT_LEN);
        assert!(stored.ends_with("é.jpg"));

        // Short extensions still leave room for the `.txt` caption.
        let short_ext = format!("{}.c", "b".repeat(253));
        let stored = stored_file_name(&short_ext, 1_700_000_000_000);
        assert!(caption_file_name(base_name(&stored)).len() <= MAX_COMPONENT_LEN);

        // An absurd extension is not kept as one.
        let odd = format!("x.{}", "y".repeat(240));
        let stored = stored_file_name(&odd, 5);
        assert!(stored.len() <= MAX_COMPONENT_LEN);
        assert!(stored.starts_with("5_x.yyy"));
    }

    #[test]
    fn base_name_strips_last_extension() {
        assert_eq!(base_name("1700_cat.png"), "1700_cat");
        assert_eq!(base_name("1700_cat"), "1700_cat");
        assert_eq!(base_name("a.b.c"), "a.b");
    }

    #[test]
    fn caption_files_are_not_media() {
        assert!(is_caption_file("1700_cat.txt"));
        assert!(is_caption_file("1700_cat.TXT"));
        assert!(!is_caption_file("1700_cat.png"));
        assert!(!is_caption_file("txt"));
        assert!(is_media_file_name("1700_cat.png"));
        assert!(!is_media_file_name("1700_cat.txt"));
        assert!(!is_media_file_name(".DS_Store"));
    }

    #[test]
    fn upload_names_are_reduced_to_last_component() {
        assert_eq!(sanitize_upload_name("cat.png"), "cat.png");
        assert_eq!(sanitize_upload_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_upload_name("C:\\Users\\me\\dog.jpg"), "dog.jpg");
        assert_eq!(sanitize_upload_name("dir/"), "upload");
        assert_eq!(sanitize_upload_name(".."), "upload");
        assert_eq!(sanitize_upload_name(""), "upload");
    }

    #[test]
    fn component_validation() {
        assert!(validate_path_component("asset name", "1700_cat").is_ok());
        assert!(validate_path_component("asset name", "").is_err());
        assert!(validate_path_component("asset name", "a/b").is_err());
        assert!(validate_path_component("asset name", &"x".repeat(256)).is_err());
    }
}
