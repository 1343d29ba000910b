//! Stack Exchange API v2.3 client.
//!
//! Finds questions similar to an error message, fetches their accepted
//! answers in one batched call and joins the two into dossier items.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classify::{Classification, ErrorClassifier};
use crate::dossier::{assemble_top, DEFAULT_TOP_N};
use crate::error::ClientError;
use crate::normalize::{normalize_parsed, parse_body, Normalize};
use crate::records::{Answer, DossierItem, Question};
use crate::transport::{HttpRequest, Transport};

pub const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com/2.3";
pub const DEFAULT_SITE: &str = "stackoverflow";
/// Questions requested per search; more than `top_n` so that enough survive
/// the accepted-answer filter.
pub const DEFAULT_SEARCH_PAGESIZE: u32 = 15;
pub const DEFAULT_ANSWER_PAGESIZE: u32 = 5;
/// Upper bound on ids per `/questions/{ids}` call and on `pagesize`.
pub const MAX_IDS_PER_REQUEST: usize = 100;

/// Result of researching an error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Research {
    pub query: String,
    pub classification: Classification,
    pub items: Vec<DossierItem>,
}

pub struct QaClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    site: String,
    api_key: Option<String>,
    top_n: usize,
    classifier: ErrorClassifier,
}

impl QaClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            site: DEFAULT_SITE.to_string(),
            api_key: None,
            top_n: DEFAULT_TOP_N,
            classifier: ErrorClassifier::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// Application key; raises the daily request quota.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    fn request(&self, path: &str) -> HttpRequest {
        HttpRequest::get(format!("{}/{}", self.base_url, path))
            .param("site", &self.site)
            .param_opt("key", self.api_key.as_deref())
    }

    async fn fetch<T: Normalize>(
        &self,
        request: HttpRequest,
        context: String,
    ) -> Result<Vec<T>, ClientError> {
        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| ClientError::transport(context, e))?;

        let raw = parse_body(&response.body)?;
        log_quota(&raw);
        normalize_parsed(&raw, &response.body)
    }

    /// Search questions similar to `query`, optionally restricted to a tag.
    ///
    /// Only questions with an accepted answer are kept, in upstream order,
    /// up to `top_n`.
    pub async fn search_similar(
        &self,
        query: &str,
        tagged: Option<&str>,
        pagesize: u32,
    ) -> Result<Vec<Question>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::InvalidInput("query must not be empty".into()));
        }

        let request = self
            .request("search/advanced")
            .param("q", query)
            .param_opt("tagged", tagged.filter(|t| !t.is_empty()))
            .param("accepted", "True")
            .param("sort", "relevance")
            .param("order", "desc")
            .param("pagesize", pagesize.clamp(1, MAX_IDS_PER_REQUEST as u32));

        let questions: Vec<Question> = self
            .fetch(request, format!("question search for '{}'", query))
            .await?;
        let found = questions.len();

        let mut questions: Vec<Question> = questions
            .into_iter()
            .filter(Question::has_accepted_answer)
            .collect();
        questions.truncate(self.top_n);

        debug!(query, ?tagged, found, kept = questions.len(), "question search finished");
        Ok(questions)
    }

    /// Accepted answers for the given questions, fetched in one request.
    ///
    /// An empty id list returns an empty result without calling upstream.
    pub async fn get_accepted_answers(
        &self,
        question_ids: &[i64],
        pagesize: u32,
    ) -> Result<Vec<Answer>, ClientError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        if question_ids.len() > MAX_IDS_PER_REQUEST {
            return Err(ClientError::InvalidInput(format!(
                "at most {} question ids per request, got {}",
                MAX_IDS_PER_REQUEST,
                question_ids.len()
            )));
        }

        let ids = question_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(";");
        let request = self
            .request(&format!("questions/{}/answers", ids))
            .param("sort", "votes")
            .param("filter", "withbody")
            .param("pagesize", pagesize.clamp(1, MAX_IDS_PER_REQUEST as u32));

        let answers: Vec<Answer> = self
            .fetch(request, format!("answers for questions {}", ids))
            .await?;
        Ok(answers.into_iter().filter(|a| a.is_accepted).collect())
    }

    /// Search, fetch accepted answers for the hits, and join them.
    pub async fn build_dossier(
        &self,
        query: &str,
        tagged: Option<&str>,
    ) -> Result<Vec<DossierItem>, ClientError> {
        let questions = self
            .search_similar(query, tagged, DEFAULT_SEARCH_PAGESIZE)
            .await?;
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        // Answers are sorted by votes; a full page keeps low-voted accepted
        // answers from being cut off.
        let answers = self
            .get_accepted_answers(&ids, MAX_IDS_PER_REQUEST as u32)
            .await?;

        Ok(assemble_top(questions, answers, self.top_n))
    }

    /// Classify an error message and build a dossier for it, using the
    /// detected language as the tag filter.
    pub async fn research(&self, error_text: &str) -> Result<Research, ClientError> {
        let query = error_text.trim().to_string();
        let classification = self.classifier.analyze(&query);
        let tagged = self.classifier.detect_language(&query);

        debug!(
            language = %classification.language,
            error_type = ?classification.error_type,
            "researching error message"
        );

        let items = self.build_dossier(&query, tagged).await?;
        Ok(Research {
            query,
            classification,
            items,
        })
    }
}

fn log_quota(raw: &Value) {
    if let Some(remaining) = raw.get("quota_remaining").and_then(Value::as_i64) {
        debug!(quota_remaining = remaining, "stack exchange quota");
    }
    if let Some(backoff) = raw.get("backoff").and_then(Value::as_i64) {
        warn!(
            backoff_secs = backoff,
            "stack exchange asked for a backoff before the next request"
        );
    }
}
