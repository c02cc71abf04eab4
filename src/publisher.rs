//! Post publishing orchestration.
//!
//! [`PostPublisher::publish`] runs the whole pipeline for one Markdown file,
//! strictly in sequence and failing fast on the first error:
//!
//! 1. Load the article and its front-matter.
//! 2. Build the payload, resolving `categories` and `tags` slugs to ids.
//! 3. Render the body to HTML.
//! 4. Upload the featured image `<slug>.<fm.ext>` if it exists beside the file.
//! 5. Upload local images in the HTML and rewrite their links.
//! 6. Create the post, or update the existing one with the same slug.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use wp_pub_rs::{Config, PostPublisher, WpHttpClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_file("config.toml")?;
//! let backend = Arc::new(WpHttpClient::new(config.clone())?);
//! let publisher = PostPublisher::new(config, backend)?;
//!
//! let outcome = publisher.publish(Path::new("/blog/hello.md")).await?;
//! println!("Published post id={}", outcome.id);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::Result;
use crate::lookup::{Filter, ItemLookup, OnExisting, Payload};
use crate::markdown::{Article, MarkdownRenderer};
use crate::rewrite::ContentRewriter;
use crate::traits::RestBackend;
use crate::upload::{self, MediaUploader};
use crate::utils;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Front-matter keys holding term slugs, each named after its endpoint.
const TERM_KEYS: [&str; 2] = ["categories", "tags"];

/// Result of publishing one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Remote post id
    pub id: u64,
    pub slug: String,
    /// `false` when an existing post was updated
    pub created: bool,
}

/// Publishes Markdown articles as posts.
#[derive(Debug)]
pub struct PostPublisher {
    config: Config,
    lookup: ItemLookup,
    uploader: MediaUploader,
    rewriter: ContentRewriter,
    renderer: MarkdownRenderer,
}

impl PostPublisher {
    /// Creates a publisher sending every request through `backend`.
    pub fn new(config: Config, backend: Arc<dyn RestBackend>) -> Result<Self> {
        let uploader = MediaUploader::new(&config, backend.clone())?;
        let rewriter = ContentRewriter::new(&config, uploader.clone());

        Ok(Self {
            lookup: ItemLookup::new(backend),
            uploader,
            rewriter,
            renderer: MarkdownRenderer::new(),
            config,
        })
    }

    /// Publishes the article at `path`.
    pub async fn publish(&self, path: &Path) -> Result<PublishOutcome> {
        let article = Article::load(path).await?;
        info!("Publishing {} as {}", path.display(), article.slug);

        let mut payload = self.build_payload(&article).await?;
        let html = self.renderer.render(&article.body);
        let featured_media = self.featured_media(&article).await?;
        let content = self
            .rewriter
            .rewrite(&html, article.dir(), &article.slug)
            .await?;

        payload.insert("content".into(), content.into());
        payload.insert("featured_media".into(), featured_media.into());

        let filter = Filter::slug(&article.slug).with("status", "publish,draft");
        let outcome = self
            .lookup
            .find_or_create("posts", &filter, OnExisting::Update, move || async move {
                Ok(Payload::Json(Value::Object(payload)))
            })
            .await?;

        Ok(PublishOutcome {
            id: outcome.item().id()?,
            slug: article.slug,
            created: outcome.was_created(),
        })
    }

    /// Builds the post fields from the slug and front-matter, in that order.
    async fn build_payload(&self, article: &Article) -> Result<Map<String, Value>> {
        let mut payload = Map::new();
        payload.insert("slug".into(), article.slug.clone().into());

        for (key, value) in &article.metadata {
            if key == "slug" {
                // Deliberately not copied: a front-matter slug would rename the
                // post away from its file, and the file stem is the upsert key.
                warn!(
                    "Ignoring front-matter slug {value}; the post slug is the file name {}",
                    article.slug
                );
            } else if TERM_KEYS.contains(&key.as_str()) {
                let ids = self.resolve_terms(article, key).await?;
                payload.insert(key.clone(), ids.into());
            } else {
                payload.insert(key.clone(), value.clone());
            }
        }

        Ok(payload)
    }

    /// Maps each slug under `key` to the id of the matching `key` item.
    async fn resolve_terms(&self, article: &Article, key: &str) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        for slug in article.slug_list(key)?.unwrap_or_default() {
            let item = self.lookup.require(key, &Filter::slug(slug)).await?;
            ids.push(item.id()?);
        }
        debug!("Resolved {key} to {ids:?}");
        Ok(ids)
    }

    async fn featured_media(&self, article: &Article) -> Result<u64> {
        let local_path = article
            .dir()
            .join(format!("{}.{}", article.slug, self.config.fm.ext));

        if !utils::is_file(&local_path).await {
            debug!(
                "No featured image at {}, using id {}",
                local_path.display(),
                self.config.fm.id_none
            );
            return Ok(self.config.fm.id_none);
        }

        let slug = upload::featured_media_slug(&article.slug);
        self.uploader.upload(&local_path, &slug).await?.id()
    }
}
