use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::ClientError;
use crate::normalize::normalize_body;
use crate::records::WebResult;
use crate::transport::{HttpRequest, Transport};

/// Local DDGS API server (`ddgs api`).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REGION: &str = "us-en";
pub const DEFAULT_BACKEND: &str = "auto";
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    #[default]
    On,
    Moderate,
    Off,
}

impl SafeSearch {
    pub fn as_str(self) -> &'static str {
        match self {
            SafeSearch::On => "on",
            SafeSearch::Moderate => "moderate",
            SafeSearch::Off => "off",
        }
    }
}

impl FromStr for SafeSearch {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(SafeSearch::On),
            "moderate" => Ok(SafeSearch::Moderate),
            "off" => Ok(SafeSearch::Off),
            other => Err(ClientError::InvalidInput(format!(
                "unknown safesearch level '{}', expected on, moderate or off",
                other
            ))),
        }
    }
}

/// Restrict hits to the last day, week, month or year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeLimit {
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "m")]
    Month,
    #[serde(rename = "y")]
    Year,
}

impl TimeLimit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeLimit::Day => "d",
            TimeLimit::Week => "w",
            TimeLimit::Month => "m",
            TimeLimit::Year => "y",
        }
    }
}

impl fmt::Display for TimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeLimit {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d" | "day" => Ok(TimeLimit::Day),
            "w" | "week" => Ok(TimeLimit::Week),
            "m" | "month" => Ok(TimeLimit::Month),
            "y" | "year" => Ok(TimeLimit::Year),
            other => Err(ClientError::InvalidInput(format!(
                "unknown time limit '{}', expected d, w, m or y",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub region: String,
    pub safesearch: SafeSearch,
    pub timelimit: Option<TimeLimit>,
    pub max_results: usize,
    pub page: u32,
    pub backend: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            safesearch: SafeSearch::default(),
            timelimit: None,
            max_results: DEFAULT_MAX_RESULTS,
            page: 1,
            backend: DEFAULT_BACKEND.to_string(),
        }
    }
}

pub struct MetasearchClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl MetasearchClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<WebResult>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::InvalidInput("query must not be empty".into()));
        }

        let request = HttpRequest::get(format!("{}/search/text", self.base_url))
            .param("query", query)
            .param("region", &options.region)
            .param("safesearch", options.safesearch.as_str())
            .param_opt("timelimit", options.timelimit)
            .param("max_results", options.max_results)
            .param("page", options.page)
            .param("backend", &options.backend);

        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| ClientError::transport(format!("web search for '{}'", query), e))?;

        let mut results = normalize_body::<WebResult>(&response.body)?;
        results.truncate(options.max_results);
        debug!(query, count = results.len(), "web search finished");
        Ok(results)
    }
}
