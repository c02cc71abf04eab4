//! Utility functions and helpers.

use crate::error::{Result, WpError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static REMOTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(http|https):.+").expect("remote URL pattern is valid"));

/// Checks whether an image source already points at a remote server.
pub fn is_remote_url(src: &str) -> bool {
    REMOTE_URL.is_match(src)
}

/// Checks if a path is an existing regular file.
pub async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Validates that a path points to a markdown file.
pub fn is_markdown_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "md" | "markdown"),
        None => false,
    }
}

/// File name without its extension.
pub fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| WpError::file_error(path.display().to_string(), "path has no file name"))
}

/// Resolves an image `src` from rendered HTML against the article directory.
///
/// Sources are percent-decoded first, since the renderer escapes characters
/// such as spaces in link destinations.
pub fn resolve_image_path(base_dir: &Path, src: &str) -> PathBuf {
    let decoded = urlencoding::decode(src)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| src.to_string());
    let path = Path::new(&decoded);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
