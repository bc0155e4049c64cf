//! tiny_http server adapter
//!
//! Handles routing, body parsing, and response conversion for tiny_http.
//! [`route`] works on plain values so it can be exercised without a socket.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Serialize, de::DeserializeOwned};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::api::{
    self, ATTESTED_BY_HEADER, ApiError, ApiResponse, AttestRequest, CreateFeedbackRequest,
    FeedbackQuery, WithStatus,
};
use crate::app::App;
use crate::core::models::InboundWebhook;

/// A request reduced to what routing needs
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Upper-case method name
    pub method: String,
    /// Path and query string
    pub url: String,
    /// Header names as sent
    pub headers: Vec<(String, String)>,
    /// Body bytes
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Build a request with no headers
    #[must_use]
    pub fn new(method: &str, url: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response produced by [`route`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Status code
    pub status: u16,
    /// Content type
    pub content_type: &'static str,
    /// Body
    pub body: String,
}

impl HttpReply {
    /// Parse the body as JSON
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

// =============================================================================
// SERVER LOOP
// =============================================================================

/// Accept requests on `addr` until the process exits
pub fn serve(app: &App, addr: &str) -> anyhow::Result<()> {
    let server = Server::http(addr).map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    info!("Listening on http://{addr}");

    for mut request in server.incoming_requests() {
        let raw = match read_request(&mut request) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read request body: {e}");
                let reply = error_reply(&ApiError::bad_request(format!(
                    "Failed to read request body: {e}"
                )));
                respond(request, reply);
                continue;
            },
        };
        let reply = route(app, &raw);
        debug!("{} {} -> {}", raw.method, raw.url, reply.status);
        respond(request, reply);
    }
    Ok(())
}

fn read_request(request: &mut Request) -> std::io::Result<RawRequest> {
    let mut body = Vec::new();
    request.as_reader().read_to_end(&mut body)?;
    Ok(RawRequest {
        method: request.method().as_str().to_uppercase(),
        url: request.url().to_string(),
        headers: request
            .headers()
            .iter()
            .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
            .collect(),
        body,
    })
}

fn respond(request: Request, reply: HttpReply) {
    let mut response =
        Response::from_data(reply.body.into_bytes()).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!("Failed to send response: {e}");
    }
}

// =============================================================================
// REQUEST HANDLING
// =============================================================================

/// Map a request to a handler and render its result
///
/// This is the main routing function that maps URL paths to handlers.
#[must_use]
pub fn route(app: &App, request: &RawRequest) -> HttpReply {
    let method: Method = request.method.parse().unwrap_or(Method::Get);
    let (path, query) = request.url.split_once('?').unwrap_or((request.url.as_str(), ""));
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match segments.as_slice() {
        ["webhooks", provider] => {
            let payload = if request.body.is_empty() {
                serde_json::Value::Null
            } else {
                match serde_json::from_slice(&request.body) {
                    Ok(payload) => payload,
                    Err(e) => {
                        return text_reply(400, &format!("Invalid JSON: {e}"));
                    },
                }
            };
            let inbound = InboundWebhook::new(
                &request.method,
                request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                payload,
            );
            match api::receive_webhook(app, provider, &inbound) {
                Ok(response) => text_reply(response.status, &response.body),
                Err(e) => error_reply(&e),
            }
        },

        ["api", "repositories", public_id, "attestations"] if method == Method::Post => {
            match read_json_body::<AttestRequest>(&request.body) {
                Ok(req) => with_status(api::record_attestation(
                    app,
                    public_id,
                    request.header_value(ATTESTED_BY_HEADER),
                    &req,
                )),
                Err(e) => error_reply(&e),
            }
        },

        ["api", "repositories", public_id, "pull-requests", number, "composition"]
            if method == Method::Get =>
        {
            match parse_pr_number(number) {
                Ok(n) => handle_result(api::pull_request_composition(app, public_id, n)),
                Err(e) => error_reply(&e),
            }
        },

        ["api", "repositories", public_id, "pull-requests", number, "rerun-analysis"]
            if method == Method::Post =>
        {
            match parse_pr_number(number) {
                Ok(n) => with_status(api::rerun_analysis(app, public_id, n)),
                Err(e) => error_reply(&e),
            }
        },

        ["api", "feedback"] if method == Method::Post => {
            match read_json_body::<CreateFeedbackRequest>(&request.body) {
                Ok(req) => with_status(api::create_feedback(app, &req)),
                Err(e) => error_reply(&e),
            }
        },

        ["api", "feedback"] if method == Method::Get => {
            handle_result(api::list_feedback(app, &parse_feedback_query(query)))
        },

        _ => error_reply(&ApiError::not_found(format!(
            "API endpoint not found: {} {path}",
            request.method
        ))),
    }
}

fn parse_pr_number(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid pull request number '{raw}'")))
}

/// Form-decode one query component (`+` is a space)
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), |decoded| decoded.into_owned())
}

fn parse_feedback_query(query: &str) -> FeedbackQuery {
    let params: BTreeMap<String, String> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (decode_component(k), decode_component(v)))
        .filter(|(_, v)| !v.trim().is_empty())
        .collect();
    FeedbackQuery {
        vote: params.get("vote").cloned(),
        status: params.get("status").cloned(),
    }
}

// =============================================================================
// BODY PARSING
// =============================================================================

/// Parse a JSON body
fn read_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))
}

// =============================================================================
// RESPONSE CONVERSION
// =============================================================================

/// Convert a handler result to a 200 reply
fn handle_result<T: Serialize>(result: Result<T, ApiError>) -> HttpReply {
    with_status(result.map(WithStatus::ok))
}

/// Convert a handler result carrying its own success status
fn with_status<T: Serialize>(result: Result<WithStatus<T>, ApiError>) -> HttpReply {
    match result {
        Ok(WithStatus { status, data }) => json_reply(&ApiResponse::success(data), status),
        Err(e) => error_reply(&e),
    }
}

/// Create an error JSON reply with appropriate status code
fn error_reply(error: &ApiError) -> HttpReply {
    json_reply(&ApiResponse::<()>::from_error(error), error.status_code())
}

fn text_reply(status: u16, body: &str) -> HttpReply {
    HttpReply {
        status,
        content_type: "text/plain; charset=utf-8",
        body: body.to_string(),
    }
}

/// Serialize data to a JSON reply with status code
fn json_reply<T: Serialize>(data: &T, status: u16) -> HttpReply {
    let body = serde_json::to_string(data).unwrap_or_else(|_| r#"{"success":false}"#.to_string());
    HttpReply {
        status,
        content_type: "application/json",
        body,
    }
}
