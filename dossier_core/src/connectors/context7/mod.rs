//! Context7 documentation search: library lookup and doc snippet retrieval.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;
use crate::normalize::{normalize_body, normalize_parsed, type_name};
use crate::records::{DocEntry, SearchResult};
use crate::transport::{HttpRequest, Transport};

pub const DEFAULT_BASE_URL: &str = "https://context7.com/api/v1";

/// Response shape requested from the docs endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Json,
    Txt,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Json => "json",
            ResponseType::Txt => "txt",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocsOptions {
    pub response_type: ResponseType,
    /// Narrow the snippets to a topic (e.g. "ssr")
    pub topic: Option<String>,
    /// Token budget for the returned documentation
    pub tokens: Option<u32>,
}

impl DocsOptions {
    pub fn text() -> Self {
        Self {
            response_type: ResponseType::Txt,
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

/// Documentation as structured snippets, or the raw body when the service
/// answered in text (by request or because the JSON was unusable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DocsResponse {
    Entries(Vec<DocEntry>),
    Text(String),
}

impl DocsResponse {
    pub fn entries(&self) -> Option<&[DocEntry]> {
        match self {
            DocsResponse::Entries(entries) => Some(entries),
            DocsResponse::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DocsResponse::Entries(_) => None,
            DocsResponse::Text(text) => Some(text),
        }
    }

    /// Up to `n` entries ordered by descending relevance. Ties keep their
    /// upstream order. Text responses yield nothing.
    pub fn top_by_relevance(&self, n: usize) -> Vec<&DocEntry> {
        let mut entries: Vec<&DocEntry> = self.entries().unwrap_or_default().iter().collect();
        entries.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entries.truncate(n);
        entries
    }
}

pub struct DocsClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: Option<String>,
}

impl DocsClient {
    pub fn new(transport: Arc<dyn Transport>, api_key: Option<String>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, url: String) -> HttpRequest {
        let request = HttpRequest::get(url);
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    /// Search for libraries matching `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::InvalidInput("query must not be empty".into()));
        }

        let request = self
            .request(format!("{}/search", self.base_url))
            .param("query", query);
        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| ClientError::transport(format!("library search for '{}'", query), e))?;

        let results = normalize_body::<SearchResult>(&response.body)?;
        debug!(query, count = results.len(), "library search finished");
        Ok(results)
    }

    /// Fetch documentation for a library id such as `vercel/next.js`.
    ///
    /// In JSON mode a body that is not JSON, or not an array of snippets
    /// (directly or under `snippets`), is returned as [`DocsResponse::Text`].
    /// Transport failures are always returned as errors.
    pub async fn get_docs(
        &self,
        library: &str,
        options: &DocsOptions,
    ) -> Result<DocsResponse, ClientError> {
        let library = library.trim().trim_start_matches('/');
        if library.is_empty() {
            return Err(ClientError::InvalidInput("library id must not be empty".into()));
        }

        let request = self
            .request(self.library_url(library)?)
            .param("type", options.response_type.as_str())
            .param_opt("topic", options.topic.as_deref().filter(|t| !t.is_empty()))
            .param_opt("tokens", options.tokens.filter(|t| *t > 0));
        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| ClientError::transport(format!("fetching docs for '{}'", library), e))?;

        if options.response_type == ResponseType::Txt {
            return Ok(DocsResponse::Text(response.body));
        }

        Ok(parse_docs(response.body))
    }
}

impl DocsClient {
    /// `{base_url}/{owner}/{repo}` with each id segment percent-encoded.
    fn library_url(&self, library: &str) -> Result<String, ClientError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::Config(format!("invalid docs base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Config(format!("docs base URL '{}' cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(library.split('/').filter(|s| !s.is_empty()));
        Ok(url.into())
    }
}

fn parse_docs(body: String) -> DocsResponse {
    let raw = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("docs response is not valid JSON ({}), returning text", e);
            return DocsResponse::Text(body);
        }
    };

    match normalize_parsed::<DocEntry>(&raw, &body) {
        Ok(entries) => DocsResponse::Entries(entries),
        Err(_) => {
            warn!(
                "expected a list of doc snippets but got {}, returning text",
                type_name(&raw)
            );
            DocsResponse::Text(body)
        }
    }
}
