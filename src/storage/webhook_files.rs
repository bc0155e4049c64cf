//! Dated on-disk storage for raw webhook payloads
//!
//! Layout: `{root}/{YYYY}/{MM}/{DD}/{HH}/{provider-slug}-{request-id-slug}.json`
//! with `{"headers": {...}, "payload": {...}}` as content.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use log::warn;
use regex::Regex;
use serde::Serialize;

use crate::core::models::{InboundWebhook, StoreOutcome};
use crate::core::ports::{PayloadStore, PayloadStoreError};

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Lowercase, collapse anything non-alphanumeric to `-`, trim dashes
#[must_use]
pub fn slugify(value: &str) -> String {
    let lower = value.to_lowercase();
    NON_SLUG.replace_all(&lower, "-").trim_matches('-').to_string()
}

#[derive(Serialize)]
struct StoredPayload<'a> {
    headers: &'a std::collections::BTreeMap<String, String>,
    payload: &'a serde_json::Value,
}

/// Filesystem-backed [`PayloadStore`]
#[derive(Debug, Clone)]
pub struct WebhookFileStore {
    root: PathBuf,
}

impl WebhookFileStore {
    /// Store under the given data directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a delivery received at `at` lands on
    #[must_use]
    pub fn path_for(&self, provider: &str, request_id: &str, at: DateTime<Utc>) -> PathBuf {
        self.root
            .join(at.format("%Y").to_string())
            .join(at.format("%m").to_string())
            .join(at.format("%d").to_string())
            .join(at.format("%H").to_string())
            .join(format!("{}-{}.json", slugify(provider), slugify(request_id)))
    }

    /// Store a request as if received at `at`
    pub fn store_at(
        &self,
        provider: &str,
        identifying_header: &str,
        request: &InboundWebhook,
        at: DateTime<Utc>,
    ) -> Result<StoreOutcome, PayloadStoreError> {
        let (request_id, header_missing) = match request.header(identifying_header) {
            Some(id) if !slugify(id).is_empty() => (id.to_string(), false),
            _ => {
                let generated = uuid::Uuid::new_v4().to_string();
                warn!(
                    "{provider} webhook has no usable {identifying_header} header, \
                     using {generated}"
                );
                (generated, true)
            },
        };

        let path = self.path_for(provider, &request_id, at);
        if path.exists() {
            return Ok(StoreOutcome::AlreadyRecorded { path });
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| PayloadStoreError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
        }

        let content = serde_json::to_vec_pretty(&StoredPayload {
            headers: &request.headers,
            payload: &request.payload,
        })?;

        let written = create_exclusive(&path, |file| file.write_all(&content))?;
        if !written {
            return Ok(StoreOutcome::AlreadyRecorded { path });
        }

        Ok(StoreOutcome::Stored {
            path,
            request_id,
            header_missing,
        })
    }
}

/// Create `path` (failing if it exists) and fill it with `write`.
///
/// Returns `false` when the file already existed. A failed write removes the
/// partial file so a redelivery is not mistaken for a duplicate.
fn create_exclusive<F>(path: &Path, write: F) -> Result<bool, PayloadStoreError>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(source) => {
            return Err(PayloadStoreError::Write {
                path: path.display().to_string(),
                source,
            });
        },
    };

    let result = write(&mut file).and_then(|()| file.sync_all());
    drop(file);
    if let Err(source) = result {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove partial payload {}: {e}", path.display());
        }
        return Err(PayloadStoreError::Write {
            path: path.display().to_string(),
            source,
        });
    }
    Ok(true)
}

impl PayloadStore for WebhookFileStore {
    fn store(
        &self,
        provider: &str,
        identifying_header: &str,
        request: &InboundWebhook,
    ) -> Result<StoreOutcome, PayloadStoreError> {
        self.store_at(provider, identifying_header, request, Utc::now())
    }
}
