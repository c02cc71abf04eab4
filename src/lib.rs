//! # WordPress Markdown Publisher
//!
//! Publishes a local Markdown article to a WordPress-style REST API.
//!
//! ## Features
//!
//! - **Upsert by Slug**: The file name is the post slug; rerunning updates the existing post
//! - **Term Resolution**: `categories` and `tags` slugs in front-matter become numeric ids
//! - **Image Uploads**: Local images are resized, re-encoded and uploaded once, then reused
//! - **Link Rewriting**: In-article images point at the uploaded copies and link to them
//! - **Featured Media**: `<slug>.<ext>` beside the article becomes the post's cover image
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use wp_pub_rs::{Config, PostPublisher, Result, WpHttpClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("config.toml")?;
//!     let backend = Arc::new(WpHttpClient::new(config.clone())?);
//!     let outcome = PostPublisher::new(config, backend)?
//!         .publish(Path::new("/blog/hello.md"))
//!         .await?;
//!     println!("Published post id={}", outcome.id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod imaging;
pub mod lookup;
pub mod markdown;
pub mod publisher;
pub mod rewrite;
pub mod traits;
pub mod upload;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Result, WpError};
pub use http::WpHttpClient;
pub use publisher::{PostPublisher, PublishOutcome};
pub use traits::RestBackend;
