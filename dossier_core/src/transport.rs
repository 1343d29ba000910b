use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::error::TransportError;

pub const DEFAULT_USER_AGENT: &str = "Dossier/1.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A single GET request as the clients describe it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Adds the parameter only when a value is present.
    pub fn param_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP boundary used by every client.
///
/// Implementations must turn network failures and non-2xx statuses into a
/// [`TransportError`]; a returned `HttpResponse` is always a success.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_settings(DEFAULT_USER_AGENT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::network("<client>", e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn header_map(url: &str, headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::network(url, format!("invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::network(url, format!("invalid header value: {}", e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(url = %request.url, params = ?request.query, "GET");

        let headers = header_map(&request.url, &request.headers)?;
        let response = self
            .client
            .get(&request.url)
            .headers(headers)
            .query(&request.query)
            .send()
            .await
            .map_err(|e| TransportError::network(&request.url, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(&request.url, e.to_string()))?;

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            let detail = if body.is_empty() {
                reason.to_string()
            } else {
                format!("{} - {}", reason, body)
            };
            return Err(TransportError::status(
                &request.url,
                status.as_u16(),
                detail,
            ));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

enum MockReply {
    Body(String),
    Error(TransportError),
}

/// A scripted in-memory transport, mainly for testing.
///
/// Replies are matched in registration order, either by URL substring or by
/// an exact `name=value` query pair. Every request is recorded, including
/// ones that fail.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<(String, MockReply)>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `body` (status 200) to any URL containing `url_part`, or to
    /// any request carrying `url_part` as a `name=value` query pair.
    pub fn respond(mut self, url_part: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.push((url_part.into(), MockReply::Body(body.into())));
        self
    }

    /// Reply with an HTTP error status to any URL containing `url_part`.
    pub fn fail(mut self, url_part: impl Into<String>, status: u16, message: &str) -> Self {
        let url_part = url_part.into();
        let error = TransportError::status(url_part.clone(), status, message);
        self.routes.push((url_part, MockReply::Error(error)));
        self
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let reply = self
            .routes
            .iter()
            .find(|(part, _)| route_matches(&request, part))
            .map(|(_, reply)| reply);

        match reply {
            Some(MockReply::Body(body)) => Ok(HttpResponse {
                status: 200,
                body: body.clone(),
            }),
            Some(MockReply::Error(error)) => Err(TransportError {
                url: request.url,
                ..error.clone()
            }),
            None => Err(TransportError::status(request.url, 404, "no mock route")),
        }
    }
}

fn route_matches(request: &HttpRequest, part: &str) -> bool {
    request.url.contains(part)
        || request
            .query
            .iter()
            .any(|(k, v)| part.split_once('=') == Some((k.as_str(), v.as_str())))
}
