//! Markdown article parsing and rendering module.
//!
//! An article is a Markdown file with an optional YAML front-matter block.
//! The file stem is the post slug; every front-matter key is carried into the
//! post payload in document order.
//!
//! ## Frontmatter Format
//!
//! ```yaml
//! ---
//! title: "Article Title"     # Passed through verbatim
//! status: publish            # Passed through verbatim
//! categories: [tech, rust]   # Category slugs, resolved to ids
//! tags: [tokio]              # Tag slugs, resolved to ids
//! ---
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wp_pub_rs::markdown::{Article, MarkdownRenderer};
//! use std::path::Path;
//!
//! # async fn example() -> wp_pub_rs::Result<()> {
//! let article = Article::load(Path::new("/blog/hello.md")).await?;
//! let html = MarkdownRenderer::new().render(&article.body);
//!
//! println!("{} -> {} bytes of HTML", article.slug, html.len());
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, WpError};
use crate::utils;
use comrak::Options;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};

const DELIMITER: &str = "---";

/// A Markdown article read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Location of the Markdown file
    pub path: PathBuf,
    /// File stem, the canonical post slug
    pub slug: String,
    /// Front-matter in document order
    pub metadata: IndexMap<String, Value>,
    /// Markdown text after the front-matter block
    pub body: String,
}

impl Article {
    /// Reads and parses an article file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            WpError::file_error(path.display().to_string(), format!("Failed to read file: {e}"))
        })?;

        Self::parse(path, &text)
    }

    /// Parses article text that was read from `path`.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let slug = utils::file_stem(path)?;
        let (metadata, body) = match split_front_matter(text) {
            Some((yaml, body)) => (parse_metadata(yaml)?, body),
            None => (IndexMap::new(), text),
        };

        Ok(Self {
            path: path.to_path_buf(),
            slug,
            metadata,
            body: body.to_string(),
        })
    }

    /// Directory containing the article; relative image paths resolve against it.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Reads a front-matter key holding a list of slugs.
    ///
    /// Returns `Ok(None)` when the key is absent. Numbers are accepted and
    /// converted, since YAML reads a bare slug such as `2024` as an integer.
    pub fn slug_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        let Some(value) = self.metadata.get(key) else {
            return Ok(None);
        };

        let Value::Array(entries) = value else {
            return Err(WpError::FrontMatter {
                reason: format!("`{key}` must be a list of slugs, got {value}"),
            });
        };

        entries
            .iter()
            .map(|entry| match entry {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(WpError::FrontMatter {
                    reason: format!("`{key}` entries must be slugs, got {other}"),
                }),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

/// Splits `text` into the YAML between the opening and closing `---` lines
/// and the body after them. Returns `None` when there is no complete block.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end_matches(['\r', '\n']) != DELIMITER {
        return None;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some((&text[start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_metadata(yaml: &str) -> Result<IndexMap<String, Value>> {
    if yaml.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    let front_matter_error = |e: serde_yaml_ng::Error| WpError::FrontMatter {
        reason: e.to_string(),
    };

    match serde_yaml_ng::from_str::<serde_yaml_ng::Value>(yaml).map_err(front_matter_error)? {
        serde_yaml_ng::Value::Null => Ok(IndexMap::new()),
        mapping @ serde_yaml_ng::Value::Mapping(_) => {
            serde_yaml_ng::from_value(mapping).map_err(front_matter_error)
        }
        other => Err(WpError::FrontMatter {
            reason: format!("front-matter must be a mapping, got {other:?}"),
        }),
    }
}

/// Markdown to HTML converter.
#[derive(Debug)]
pub struct MarkdownRenderer {
    options: Options<'static>,
}

impl MarkdownRenderer {
    /// Creates a renderer with tables enabled and raw HTML passed through.
    pub fn new() -> Self {
        let mut options = Options::default();
        options.extension.table = true;
        options.render.r#unsafe = true;

        Self { options }
    }

    pub fn render(&self, markdown: &str) -> String {
        comrak::markdown_to_html(markdown, &self.options)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
