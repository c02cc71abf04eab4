//! Content rewriting for rendered post HTML.
//!
//! Local images referenced from the article are uploaded through
//! [`MediaUploader`] and each `<img>` is replaced by
//! `<a href="URL"><img … src="URL"></a>`, where `URL` is the uploaded item's
//! site-relative address. Images without a source and images already served
//! from `http(s)://` are left untouched.
//!
//! The rewrite runs in two passes. The first parse collects local image
//! sources by position and the uploads happen in between. The second parse
//! produces a fresh tree that is rewritten with the anchors and serialized as
//! the new document.

use crate::config::Config;
use crate::error::Result;
use crate::upload::{self, MediaUploader};
use crate::utils;
use html5ever::{Attribute, LocalName, QualName, local_name, ns};
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, StrTendril};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// A local image found in the first pass.
#[derive(Debug, Clone, PartialEq)]
struct LocalImage {
    /// Position among all `<img>` elements in document order
    index: usize,
    src: String,
}

/// Uploads local images referenced from post HTML and rewrites their links.
#[derive(Debug, Clone)]
pub struct ContentRewriter {
    uploader: MediaUploader,
    config: Config,
}

impl ContentRewriter {
    pub fn new(config: &Config, uploader: MediaUploader) -> Self {
        Self {
            uploader,
            config: config.clone(),
        }
    }

    /// Returns `html` with every local image uploaded and wrapped in a link.
    ///
    /// Relative sources resolve against `article_dir`; uploads are named
    /// `<post_slug>_<image stem>`.
    pub async fn rewrite(&self, html: &str, article_dir: &Path, post_slug: &str) -> Result<String> {
        let images = local_images(html);
        if images.is_empty() {
            debug!("No local images in {post_slug}");
            return Ok(html.to_string());
        }

        let mut replacements = HashMap::with_capacity(images.len());
        for image in &images {
            let local_path = utils::resolve_image_path(article_dir, &image.src);
            let slug = upload::inline_media_slug(post_slug, &local_path)?;
            let item = self.uploader.upload(&local_path, &slug).await?;
            let url = self.config.site_relative(item.source_url()?).to_string();

            debug!("Image {} -> {url}", image.src);
            replacements.insert(image.index, url);
        }

        info!("Rewrote {} image link(s) in {post_slug}", replacements.len());
        Ok(serialize(html, &replacements))
    }
}

/// Collects `<img>` elements whose source is a non-empty local reference.
fn local_images(html: &str) -> Vec<LocalImage> {
    let fragment = Html::parse_fragment(html);

    fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "img")
        .enumerate()
        .filter_map(|(index, element)| {
            let src = element.value().attr("src").unwrap_or_default();
            if src.is_empty() {
                debug!("Skipping image without source");
                return None;
            }
            if utils::is_remote_url(src) {
                debug!("Skipping remote image {src}");
                return None;
            }
            Some(LocalImage {
                index,
                src: src.to_string(),
            })
        })
        .collect()
}

/// Parses `html` again and wraps each `<img>` whose position has a replacement
/// URL in `<a href="URL">`, pointing its `src` at the same URL.
fn serialize(html: &str, replacements: &HashMap<usize, String>) -> String {
    let mut fragment = Html::parse_fragment(html);

    let targets: Vec<_> = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "img")
        .enumerate()
        .filter_map(|(index, element)| replacements.get(&index).map(|url| (element.id(), url)))
        .collect();

    for (img_id, url) in targets {
        let Some(mut img) = fragment.tree.get_mut(img_id) else {
            continue;
        };
        if let Node::Element(element) = img.value() {
            if let Some(src) = element.attrs.get_mut(&attr_name(local_name!("src"))) {
                *src = StrTendril::from_slice(url);
            }
        }

        let anchor_id = img.insert_before(Node::Element(anchor(url))).id();
        if let Some(mut anchor) = fragment.tree.get_mut(anchor_id) {
            anchor.append_id(img_id);
        }
    }

    fragment.root_element().inner_html()
}

fn attr_name(local: LocalName) -> QualName {
    QualName::new(None, ns!(), local)
}

fn anchor(href: &str) -> Element {
    Element::new(
        QualName::new(None, ns!(html), local_name!("a")),
        vec![Attribute {
            name: attr_name(local_name!("href")),
            value: StrTendril::from_slice(href),
        }],
    )
}
