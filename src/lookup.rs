//! Remote item lookup and the find-or-create operation built on it.
//!
//! Every remote resource the publisher touches (posts, media, categories, tags)
//! is addressed by slug. [`ItemLookup::lookup`] asks for exactly one match;
//! callers choose with [`MissingPolicy`] whether zero matches is an error
//! (resolving a category) or an answer (checking whether a post already exists).
//! More than one match is always an error.
//!
//! [`ItemLookup::find_or_create`] is the shared upsert used for media (reuse an
//! existing item) and posts (update an existing item).

use crate::error::{Result, WpError};
use crate::traits::RestBackend;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// An opaque JSON object returned by the remote API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RemoteItem(Value);

impl RemoteItem {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Numeric identifier of the item.
    pub fn id(&self) -> Result<u64> {
        self.0
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| WpError::invalid_response("item has no numeric `id`"))
    }

    /// Public URL of a media item.
    pub fn source_url(&self) -> Result<&str> {
        self.0
            .get("source_url")
            .and_then(Value::as_str)
            .ok_or_else(|| WpError::invalid_response("media item has no `source_url`"))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Ordered query parameters for a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    params: Vec<(String, String)>,
}

impl Filter {
    /// Filter on `slug = <slug>`.
    pub fn slug(slug: impl Into<String>) -> Self {
        Self::default().with("slug", slug)
    }

    /// Adds another parameter; later parameters follow earlier ones on the wire.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// What a lookup does when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Zero matches is a lookup error (required resources).
    Fail,
    /// Zero matches yields `None` (existence checks).
    Tolerate,
}

/// What [`ItemLookup::find_or_create`] does with an item that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExisting {
    /// Return the existing item without sending anything.
    Reuse,
    /// Send the payload to the existing item's own endpoint.
    Update,
}

/// Request body for a create or update.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// JSON document body.
    Json(Value),
    /// Raw binary body with its media headers.
    Binary {
        bytes: Vec<u8>,
        content_type: String,
        content_disposition: String,
    },
}

/// Result of a find-or-create.
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted {
    Created(RemoteItem),
    Reused(RemoteItem),
    Updated(RemoteItem),
}

impl Upserted {
    pub fn item(&self) -> &RemoteItem {
        match self {
            Upserted::Created(item) | Upserted::Reused(item) | Upserted::Updated(item) => item,
        }
    }

    pub fn into_item(self) -> RemoteItem {
        match self {
            Upserted::Created(item) | Upserted::Reused(item) | Upserted::Updated(item) => item,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Upserted::Created(_))
    }
}

/// Slug-keyed lookups against a [`RestBackend`].
#[derive(Clone)]
pub struct ItemLookup {
    backend: Arc<dyn RestBackend>,
}

impl fmt::Debug for ItemLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemLookup").finish_non_exhaustive()
    }
}

impl ItemLookup {
    pub fn new(backend: Arc<dyn RestBackend>) -> Self {
        Self { backend }
    }

    /// Finds the single item of `label` matching `filter`.
    ///
    /// Returns `Ok(None)` only for zero matches under [`MissingPolicy::Tolerate`].
    pub async fn lookup(
        &self,
        label: &str,
        filter: &Filter,
        policy: MissingPolicy,
    ) -> Result<Option<RemoteItem>> {
        let mut items = self.backend.list(label, filter).await?;
        debug!("Lookup {label}?{filter} matched {} item(s)", items.len());

        match (items.len(), policy) {
            (1, _) => Ok(items.pop()),
            (0, MissingPolicy::Tolerate) => Ok(None),
            (found, _) => Err(WpError::lookup(label, filter, found)),
        }
    }

    /// Finds an item that must exist.
    pub async fn require(&self, label: &str, filter: &Filter) -> Result<RemoteItem> {
        self.lookup(label, filter, MissingPolicy::Fail)
            .await?
            .ok_or_else(|| WpError::lookup(label, filter, 0))
    }

    /// Finds an item that may not exist yet.
    pub async fn find(&self, label: &str, filter: &Filter) -> Result<Option<RemoteItem>> {
        self.lookup(label, filter, MissingPolicy::Tolerate).await
    }

    /// Looks `label` up by `filter`, then creates, reuses or updates.
    ///
    /// `payload` is only evaluated when something is actually sent, so expensive
    /// bodies (encoded images) are never built for a reused item.
    pub async fn find_or_create<F, Fut>(
        &self,
        label: &str,
        filter: &Filter,
        on_existing: OnExisting,
        payload: F,
    ) -> Result<Upserted>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Payload>>,
    {
        match (self.find(label, filter).await?, on_existing) {
            (Some(existing), OnExisting::Reuse) => {
                info!(
                    "Reusing existing {label} id={} for {filter}",
                    existing.id()?
                );
                Ok(Upserted::Reused(existing))
            }
            (Some(existing), OnExisting::Update) => {
                let path = format!("{label}/{}", existing.id()?);
                let item = self.backend.send(&path, payload().await?).await?;
                info!("Updated {path}");
                Ok(Upserted::Updated(item))
            }
            (None, _) => {
                let item = self.backend.send(label, payload().await?).await?;
                info!("Created {label} id={}", item.id()?);
                Ok(Upserted::Created(item))
            }
        }
    }
}
