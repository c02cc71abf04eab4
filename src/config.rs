//! Configuration management for the publisher.
//!
//! Settings are read once at startup from a TOML file and are read-only for the
//! rest of the run. The resulting [`Config`] value is passed explicitly into every
//! component; nothing reads settings from ambient state.
//!
//! ## File format
//!
//! ```toml
//! [url]
//! api = "https://blog.example.com/wp-json/wp/v2"
//! site = "https://blog.example.com"
//!
//! [auth]
//! user = "editor"
//! pass = "application-password"
//!
//! [img]
//! max_size = 1200   # maximum width in pixels
//! ext = "jpg"       # encoded format of uploaded images
//!
//! [fm]
//! ext = "png"       # extension of the featured image beside the article
//! id_none = 1       # featured media used when there is no such image
//!
//! [http]            # optional
//! request_timeout_secs = 30
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use wp_pub_rs::config::Config;
//!
//! let config = Config::builder()
//!     .api_url("https://blog.example.com/wp-json/wp/v2")
//!     .site_url("https://blog.example.com")
//!     .credentials("editor", "secret")
//!     .build();
//! assert_eq!(config.endpoint("posts"), "https://blog.example.com/wp-json/wp/v2/posts");
//! ```

use crate::error::{Result, WpError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Remote endpoints
    pub url: UrlConfig,
    /// Basic-auth credentials
    pub auth: AuthConfig,
    /// Uploaded image settings
    pub img: ImageConfig,
    /// Featured image settings
    pub fm: FeaturedMediaConfig,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    /// REST API base, e.g. `https://blog.example.com/wp-json/wp/v2`
    pub api: String,
    /// Site base, stripped from media URLs to make them site-relative
    pub site: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Maximum width in pixels; wider images are scaled down
    pub max_size: u32,
    /// Output format and filename extension of uploaded images
    pub ext: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedMediaConfig {
    /// Extension of the `<slug>.<ext>` cover image beside the article
    pub ext: String,
    /// Featured media ID used when the article has no cover image
    pub id_none: u64,
}

/// HTTP client configuration settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds (default: 10)
    pub connect_timeout_secs: u64,
    /// User agent string for requests
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("wp-pub-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Loads, overrides from the environment, and validates a settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            WpError::config_error(format!(
                "Failed to read settings file {}: {e}",
                path.display()
            ))
        })?;

        let mut config = Self::from_toml_str(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Parses settings from TOML text. Missing required keys are errors.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| WpError::config_error(e.to_string()))
    }

    /// Applies `WP_PUB_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("WP_PUB_API_URL") {
            self.url.api = val;
        }

        if let Some(val) = lookup("WP_PUB_SITE_URL") {
            self.url.site = val;
        }

        if let Some(val) = lookup("WP_PUB_USER") {
            self.auth.user = val;
        }

        if let Some(val) = lookup("WP_PUB_PASS") {
            self.auth.pass = val;
        }

        if let Some(val) = lookup("WP_PUB_REQUEST_TIMEOUT") {
            self.http.request_timeout_secs = val
                .parse()
                .map_err(|_| WpError::config_error("Invalid WP_PUB_REQUEST_TIMEOUT value"))?;
        }

        Ok(())
    }

    fn normalize(&mut self) {
        let api = self.url.api.trim_end_matches('/').len();
        self.url.api.truncate(api);
    }

    /// Validates the configuration for consistency and constraints.
    pub fn validate(&self) -> Result<()> {
        if self.url.api.is_empty() {
            return Err(WpError::config_error("url.api cannot be empty"));
        }

        if self.img.max_size == 0 {
            return Err(WpError::config_error("img.max_size must be greater than 0"));
        }

        crate::imaging::output_format(&self.img.ext)?;

        if self.fm.ext.is_empty() {
            return Err(WpError::config_error("fm.ext cannot be empty"));
        }

        if self.http.request_timeout_secs == 0 {
            return Err(WpError::config_error(
                "request_timeout_secs must be greater than 0",
            ));
        }

        if self.http.connect_timeout_secs == 0 {
            return Err(WpError::config_error(
                "connect_timeout_secs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Full URL of a resource collection, e.g. `endpoint("media")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url.api, path)
    }

    /// Makes a public media URL site-relative.
    pub fn site_relative<'a>(&self, url: &'a str) -> &'a str {
        if self.url.site.is_empty() {
            return url;
        }
        url.strip_prefix(self.url.site.as_str()).unwrap_or(url)
    }

    /// Converts HTTP timeout to Duration types for easier use.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    /// Converts HTTP timeout to Duration types for easier use.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_secs)
    }
}

/// Builder for creating Config instances.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    api_url: Option<String>,
    site_url: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    image_max_size: Option<u32>,
    image_ext: Option<String>,
    featured_ext: Option<String>,
    featured_id_none: Option<u64>,
    http: Option<HttpConfig>,
}

impl ConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.pass = Some(pass.into());
        self
    }

    pub fn image_max_size(mut self, width: u32) -> Self {
        self.image_max_size = Some(width);
        self
    }

    pub fn image_ext(mut self, ext: impl Into<String>) -> Self {
        self.image_ext = Some(ext.into());
        self
    }

    pub fn featured_ext(mut self, ext: impl Into<String>) -> Self {
        self.featured_ext = Some(ext.into());
        self
    }

    pub fn featured_id_none(mut self, id: u64) -> Self {
        self.featured_id_none = Some(id);
        self
    }

    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = Some(http);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Config {
        let mut config = Config {
            url: UrlConfig {
                api: self.api_url.unwrap_or_default(),
                site: self.site_url.unwrap_or_default(),
            },
            auth: AuthConfig {
                user: self.user.unwrap_or_default(),
                pass: self.pass.unwrap_or_default(),
            },
            img: ImageConfig {
                max_size: self.image_max_size.unwrap_or(1200),
                ext: self.image_ext.unwrap_or_else(|| "jpg".to_string()),
            },
            fm: FeaturedMediaConfig {
                ext: self.featured_ext.unwrap_or_else(|| "png".to_string()),
                id_none: self.featured_id_none.unwrap_or(0),
            },
            http: self.http.unwrap_or_default(),
        };
        config.normalize();
        config
    }
}
