//! Webhook models
//!
//! [`InboundWebhook`] is the framework-agnostic view of an HTTP request;
//! [`WebhookRequest`] is the stored record of a received POST.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbound webhook request
#[derive(Debug, Clone, PartialEq)]
pub struct InboundWebhook {
    /// HTTP method, uppercase
    pub method: String,
    /// Headers, keys lowercased
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body (`Null` when empty)
    pub payload: serde_json::Value,
}

impl InboundWebhook {
    /// Build a request, normalizing method and header names
    #[must_use]
    pub fn new<I, K, V>(method: &str, headers: I, payload: serde_json::Value) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            method: method.to_ascii_uppercase(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
            payload,
        }
    }

    /// Shorthand for a JSON POST
    #[must_use]
    pub fn post<I, K, V>(headers: I, payload: serde_json::Value) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::new("POST", headers, payload)
    }

    /// Case-insensitive header lookup
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Whether this is a POST
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.method == "POST"
    }
}

/// What a processor answers to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl WebhookResponse {
    /// Build a response
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 with a short message
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// Stored record of a received webhook POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRequest {
    /// Row id
    pub id: i64,
    /// Provider slug (e.g. `github`)
    pub provider: String,
    /// Integration the request belongs to, when the processor could tell
    pub integration: Option<String>,
    /// Where the raw payload was written
    pub data_file_path: String,
    /// Status the processor answered with
    pub response_status_code: Option<u16>,
    /// Body the processor answered with
    pub response_message: Option<String>,
    /// When received
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a [`WebhookRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWebhookRequest {
    /// Provider slug
    pub provider: String,
    /// Integration reference
    pub integration: Option<String>,
    /// Path of the stored payload
    pub data_file_path: String,
}

/// Result of persisting a raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Payload written to a new file
    Stored {
        /// File written
        path: PathBuf,
        /// Identifier used in the file name
        request_id: String,
        /// The identifying header was absent and `request_id` was generated
        header_missing: bool,
    },
    /// A file already exists for this delivery
    AlreadyRecorded {
        /// Existing file
        path: PathBuf,
    },
}

impl StoreOutcome {
    /// Path of the payload file
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::Stored { path, .. } | Self::AlreadyRecorded { path } => path,
        }
    }
}
