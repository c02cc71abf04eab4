//! Upload module for media items.
//!
//! Media is identified remotely by a deterministic slug: `fm-<post>` for a
//! featured image, `<post>_<image stem>` for images inside the article body.
//! An item that already exists under the slug is reused as-is; it is never
//! re-uploaded or compared by content. A failed run therefore leaves its
//! uploads behind for the next run to pick up.

use crate::config::Config;
use crate::error::Result;
use crate::imaging::ImagePreparer;
use crate::lookup::{Filter, ItemLookup, OnExisting, Payload, RemoteItem};
use crate::traits::RestBackend;
use crate::utils;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// `Content-Type` sent for an uploaded image with extension `ext`.
pub fn media_content_type(ext: &str) -> &'static str {
    match ext {
        "jpg" => "image/jpg",
        "png" => "image/png",
        _ => "",
    }
}

/// `Content-Disposition` naming the uploaded file `<slug>.<ext>`.
pub fn content_disposition(slug: &str, ext: &str) -> String {
    format!("attachment; filename={slug}.{ext}")
}

/// Slug of a post's featured image.
pub fn featured_media_slug(post_slug: &str) -> String {
    format!("fm-{post_slug}")
}

/// Slug of an image referenced from a post's body.
pub fn inline_media_slug(post_slug: &str, image_path: &Path) -> Result<String> {
    Ok(format!("{post_slug}_{}", utils::file_stem(image_path)?))
}

/// Uploads local images as media items, reusing items that already exist.
#[derive(Debug, Clone)]
pub struct MediaUploader {
    lookup: ItemLookup,
    preparer: ImagePreparer,
    ext: String,
}

impl MediaUploader {
    /// Creates a new media uploader.
    pub fn new(config: &Config, backend: Arc<dyn RestBackend>) -> Result<Self> {
        Ok(Self {
            lookup: ItemLookup::new(backend),
            preparer: ImagePreparer::from_config(config)?,
            ext: config.img.ext.clone(),
        })
    }

    /// Returns the media item for `slug`, uploading `local_path` if there is none.
    pub async fn upload(&self, local_path: &Path, slug: &str) -> Result<RemoteItem> {
        let outcome = self
            .lookup
            .find_or_create("media", &Filter::slug(slug), OnExisting::Reuse, || async {
                let prepared = self.preparer.prepare(local_path).await?;
                info!(
                    "Uploading {} as {slug}.{} ({}x{}, {} bytes)",
                    local_path.display(),
                    self.ext,
                    prepared.width,
                    prepared.height,
                    prepared.bytes.len()
                );
                Ok(Payload::Binary {
                    bytes: prepared.bytes,
                    content_type: media_content_type(&self.ext).to_string(),
                    content_disposition: content_disposition(slug, &self.ext),
                })
            })
            .await?;

        Ok(outcome.into_item())
    }
}
