//! In-memory [`RestBackend`] used by the unit tests.
//!
//! Behaves like a small WordPress: list endpoints filter on exact field
//! matches (`status` accepts a comma-separated set), `POST <label>` creates an
//! item with a fresh id, `POST <label>/<id>` merges into an existing one, and
//! binary media uploads get a `source_url` under the site's uploads directory.

use crate::error::{Result, WpError};
use crate::lookup::{Filter, Payload, RemoteItem};
use crate::traits::RestBackend;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SentRequest {
    pub path: String,
    pub payload: Payload,
}

#[derive(Debug, Default)]
struct State {
    items: HashMap<String, Vec<Value>>,
    sent: Vec<SentRequest>,
    failures: HashMap<String, u16>,
    next_id: u64,
}

#[derive(Debug)]
pub(crate) struct MockBackend {
    site: String,
    state: Mutex<State>,
}

impl MockBackend {
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        }
    }

    pub fn seed(&self, label: &str, item: Value) {
        let mut state = self.state.lock().unwrap();
        state.items.entry(label.to_string()).or_default().push(item);
    }

    pub fn items(&self, label: &str) -> Vec<RemoteItem> {
        let state = self.state.lock().unwrap();
        state
            .items
            .get(label)
            .map(|items| items.iter().cloned().map(RemoteItem::new).collect())
            .unwrap_or_default()
    }

    /// Every create/update request, in order.
    pub fn sent(&self) -> Vec<SentRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_paths(&self) -> Vec<String> {
        self.sent().into_iter().map(|r| r.path).collect()
    }

    pub fn sent_to(&self, path: &str) -> Vec<SentRequest> {
        self.sent().into_iter().filter(|r| r.path == path).collect()
    }

    /// Makes every request to `path` answer with `status`.
    pub fn fail_on(&self, path: &str, status: u16) {
        let mut state = self.state.lock().unwrap();
        state.failures.insert(path.to_string(), status);
    }

    fn url(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{path}", self.site)
    }

    fn media_fields(&self, content_type: &str, content_disposition: &str) -> Map<String, Value> {
        let filename = content_disposition
            .rsplit("filename=")
            .next()
            .unwrap_or_default();
        let slug = filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(filename);

        let mut fields = Map::new();
        fields.insert("slug".into(), slug.into());
        fields.insert("mime_type".into(), content_type.into());
        fields.insert(
            "source_url".into(),
            format!("{}/wp-content/uploads/{filename}", self.site).into(),
        );
        fields
    }
}

fn matches(item: &Value, filter: &Filter) -> bool {
    filter.params().iter().all(|(key, expected)| {
        let actual = match item.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return false,
        };
        if key == "status" {
            expected.split(',').any(|s| s == actual)
        } else {
            actual == *expected
        }
    })
}

#[async_trait]
impl RestBackend for MockBackend {
    async fn list(&self, label: &str, filter: &Filter) -> Result<Vec<RemoteItem>> {
        let state = self.state.lock().unwrap();
        if let Some(&status) = state.failures.get(label) {
            return Err(WpError::Request {
                status,
                url: self.url(label),
            });
        }

        Ok(state
            .items
            .get(label)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| matches(item, filter))
                    .cloned()
                    .map(RemoteItem::new)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn send(&self, path: &str, payload: Payload) -> Result<RemoteItem> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(SentRequest {
            path: path.to_string(),
            payload: payload.clone(),
        });

        if let Some(&status) = state.failures.get(path) {
            return Err(WpError::Request {
                status,
                url: self.url(path),
            });
        }

        let mut fields = match payload {
            Payload::Json(Value::Object(map)) => map,
            Payload::Json(other) => {
                return Err(WpError::invalid_response(format!(
                    "expected a JSON object, got {other}"
                )));
            }
            Payload::Binary {
                content_type,
                content_disposition,
                ..
            } => self.media_fields(&content_type, &content_disposition),
        };

        match path.split_once('/') {
            Some((label, id)) => {
                let id: u64 = id.parse().map_err(|_| WpError::Request {
                    status: 404,
                    url: self.url(path),
                })?;
                let existing = state
                    .items
                    .get_mut(label)
                    .and_then(|items| {
                        items
                            .iter_mut()
                            .find(|item| item.get("id").and_then(Value::as_u64) == Some(id))
                    })
                    .ok_or_else(|| WpError::Request {
                        status: 404,
                        url: self.url(path),
                    })?;

                if let Value::Object(map) = &mut *existing {
                    fields.remove("id");
                    map.extend(fields);
                }
                Ok(RemoteItem::new(existing.clone()))
            }
            None => {
                state.next_id += 1;
                fields.insert("id".into(), state.next_id.into());
                if path == "posts" && !fields.contains_key("status") {
                    fields.insert("status".into(), "draft".into());
                }

                let item = Value::Object(fields);
                state
                    .items
                    .entry(path.to_string())
                    .or_default()
                    .push(item.clone());
                Ok(RemoteItem::new(item))
            }
        }
    }
}
