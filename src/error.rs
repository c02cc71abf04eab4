//! Error types for the publishing pipeline.
//!
//! Every failure is fatal for a run: there are no retries and no partial-success
//! recovery. The variants exist so callers (and log readers) can tell which stage
//! of the pipeline gave up.
//!
//! ## Error Categories
//!
//! - **Request Errors**: the remote API answered with a non-success status
//! - **Lookup Errors**: zero matches where one was required, or an ambiguous match
//! - **Image Errors**: a local image could not be read, decoded or encoded
//! - **Input Errors**: unreadable Markdown file or malformed front-matter
//! - **Configuration Errors**: missing or invalid settings
//!
//! ## Usage
//!
//! ```rust
//! use wp_pub_rs::{WpError, Result};
//!
//! fn describe(error: &WpError) -> &'static str {
//!     match error {
//!         WpError::Request { .. } => "remote API rejected the request",
//!         WpError::Lookup { .. } => "remote lookup was not unique",
//!         WpError::Image { .. } => "local image could not be prepared",
//!         _ => "publishing failed",
//!     }
//! }
//! ```

/// Result type alias for publishing operations.
pub type Result<T> = std::result::Result<T, WpError>;

/// Error type for publishing operations.
#[derive(Debug, thiserror::Error)]
pub enum WpError {
    /// The remote API returned a non-success HTTP status.
    #[error("HTTP error status_code={status} url={url}")]
    Request { status: u16, url: String },

    /// A lookup matched zero items where one was required, or more than one item.
    #[error("Expected exactly one item, found {found}: label={label} params={filter}")]
    Lookup {
        label: String,
        filter: String,
        found: usize,
    },

    /// Local image unreadable, undecodable or unencodable.
    #[error("Image processing failed: {path}, reason: {reason}")]
    Image { path: String, reason: String },

    #[error("Failed to read file: {path}, reason: {reason}")]
    FileRead { path: String, reason: String },

    #[error("Front-matter parsing failed: {reason}")]
    FrontMatter { reason: String },

    /// A remote item is missing a field the pipeline relies on.
    #[error("Invalid response from remote API: {reason}")]
    InvalidResponse { reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON processing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WpError {
    /// Creates a lookup error for `found` matches of `label` under `filter`.
    pub fn lookup(label: impl Into<String>, filter: impl ToString, found: usize) -> Self {
        WpError::Lookup {
            label: label.into(),
            filter: filter.to_string(),
            found,
        }
    }

    /// Creates an image error.
    pub fn image(path: impl Into<String>, reason: impl ToString) -> Self {
        WpError::Image {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a file-related error.
    pub fn file_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        WpError::FileRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        WpError::Config {
            message: message.into(),
        }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        WpError::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Returns the HTTP status code for request errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            WpError::Request { status, .. } => Some(*status),
            WpError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
