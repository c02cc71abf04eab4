//! Trait abstractions for talking to the remote content platform.
//!
//! Components never hold a concrete HTTP client. They hold an
//! `Arc<dyn RestBackend>`, which is [`WpHttpClient`](crate::http::WpHttpClient)
//! in production and an in-memory fake in tests.

use crate::error::Result;
use crate::lookup::{Filter, Payload, RemoteItem};
use async_trait::async_trait;

/// The two request shapes the publisher needs from a REST API.
#[async_trait]
pub trait RestBackend: Send + Sync {
    /// Authenticated list query: `GET <api>/<label>?<filter>`.
    ///
    /// Fails with a request error on a non-success status.
    async fn list(&self, label: &str, filter: &Filter) -> Result<Vec<RemoteItem>>;

    /// Authenticated create/update: `POST <api>/<path>` with the payload as body.
    ///
    /// `path` is either a collection (`posts`) or an item (`posts/12`).
    async fn send(&self, path: &str, payload: Payload) -> Result<RemoteItem>;
}
