use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::ClientError;
use crate::normalize::{int_field, opt_int_field, opt_str_field, parse_body, str_field, Object};
use crate::records::{WikiPage, WikiSection};
use crate::transport::{HttpRequest, Transport, DEFAULT_USER_AGENT};

pub const DEFAULT_LANGUAGE: &str = "en";

// Headings in a plain extract fetched with `exsectionformat=wiki`.
static WIKI_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(={2,6})\s*(.*?)\s*={2,6}\s*$")
        .unwrap_or_else(|e| unreachable!("built-in pattern must compile: {}", e))
});

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]*>").unwrap_or_else(|e| unreachable!("built-in pattern must compile: {}", e))
});

/// Markup of page extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractFormat {
    #[default]
    Plain,
    Html,
}

impl FromStr for ExtractFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(ExtractFormat::Plain),
            "html" => Ok(ExtractFormat::Html),
            other => Err(ClientError::InvalidInput(format!(
                "unknown extract format '{}', expected plain or html",
                other
            ))),
        }
    }
}

pub struct WikipediaClient {
    transport: Arc<dyn Transport>,
    language: String,
    user_agent: String,
    extract_format: ExtractFormat,
    base_url: Option<String>,
}

impl WikipediaClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            language: DEFAULT_LANGUAGE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extract_format: ExtractFormat::default(),
            base_url: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_extract_format(mut self, extract_format: ExtractFormat) -> Self {
        self.extract_format = extract_format;
        self
    }

    /// Overrides the per-language endpoint, e.g. for a local mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn api_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => format!("https://{}.wikipedia.org/w/api.php", self.language),
        }
    }

    fn request(&self, action: &str) -> HttpRequest {
        HttpRequest::get(self.api_url())
            .header("User-Agent", &self.user_agent)
            .param("action", action)
            .param("format", "json")
            .param("redirects", "")
    }

    fn extracts_request(&self, title: &str, intro_only: bool) -> HttpRequest {
        let mut request = self
            .request("query")
            .param("titles", title)
            .param("prop", if intro_only { "extracts" } else { "extracts|info" });
        if intro_only {
            request = request.param("exintro", "");
        } else {
            request = request.param("inprop", "url");
        }
        if self.extract_format == ExtractFormat::Plain {
            request = request.param("explaintext", "");
        }
        request
    }

    async fn query_page(&self, request: HttpRequest, title: &str) -> Result<Object, ClientError> {
        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| ClientError::transport(format!("wikipedia page '{}'", title), e))?;
        let raw = parse_body(&response.body)?;
        check_api_error(&raw, &response.body)?;

        raw.get("query")
            .and_then(|q| q.get("pages"))
            .and_then(Value::as_object)
            .and_then(|pages| pages.values().next())
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| ClientError::malformed("missing query.pages", response.body))
    }

    /// Full page with text, intro summary and canonical URL. A page that
    /// does not exist comes back with `exists == false` and empty content.
    pub async fn get_page(&self, title: &str) -> Result<WikiPage, ClientError> {
        let title = require_title(title)?;
        let page = self
            .query_page(self.extracts_request(title, false), title)
            .await?;

        let resolved_title = opt_str_field(&page, "title").unwrap_or_else(|| title.to_string());
        if is_missing(&page) {
            debug!(title, "wikipedia page does not exist");
            return Ok(WikiPage {
                title: resolved_title,
                exists: false,
                ..Default::default()
            });
        }

        let summary = self
            .query_page(self.extracts_request(title, true), title)
            .await
            .map(|intro| str_field(&intro, "extract"))?;

        Ok(WikiPage {
            title: resolved_title,
            page_id: opt_int_field(&page, "pageid"),
            exists: true,
            summary,
            text: str_field(&page, "extract"),
            full_url: opt_str_field(&page, "fullurl"),
        })
    }

    /// Intro section of the page, or `None` if it does not exist.
    pub async fn get_page_summary(&self, title: &str) -> Result<Option<String>, ClientError> {
        let title = require_title(title)?;
        let page = self
            .query_page(self.extracts_request(title, true), title)
            .await?;
        if is_missing(&page) {
            return Ok(None);
        }
        Ok(Some(str_field(&page, "extract")))
    }

    pub async fn get_page_url(&self, title: &str) -> Result<Option<String>, ClientError> {
        let title = require_title(title)?;
        let request = self
            .request("query")
            .param("titles", title)
            .param("prop", "info")
            .param("inprop", "url");
        let page = self.query_page(request, title).await?;
        if is_missing(&page) {
            return Ok(None);
        }
        Ok(opt_str_field(&page, "fullurl"))
    }

    /// Sections in page order with their plain-text bodies, or `None` if
    /// the page does not exist.
    ///
    /// The outline comes from `action=parse`; bodies come from a second
    /// plain extract split at its headings. Section text is always plain,
    /// whatever the configured extract format.
    pub async fn get_page_sections(
        &self,
        title: &str,
    ) -> Result<Option<Vec<WikiSection>>, ClientError> {
        let title = require_title(title)?;
        let request = self
            .request("parse")
            .param("page", title)
            .param("prop", "sections");
        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| ClientError::transport(format!("wikipedia sections for '{}'", title), e))?;
        let raw = parse_body(&response.body)?;

        if error_code(&raw) == Some("missingtitle") {
            return Ok(None);
        }
        check_api_error(&raw, &response.body)?;

        let mut sections: Vec<WikiSection> = raw
            .get("parse")
            .and_then(|p| p.get("sections"))
            .and_then(Value::as_array)
            .ok_or_else(|| ClientError::malformed("missing parse.sections", &response.body))?
            .iter()
            .filter_map(Value::as_object)
            .map(|s| WikiSection {
                title: plain_heading(&str_field(s, "line")),
                level: u32::try_from(int_field(s, "toclevel")).unwrap_or_default(),
                number: str_field(s, "number"),
                text: String::new(),
            })
            .collect();
        if sections.is_empty() {
            return Ok(Some(sections));
        }

        let request = self
            .request("query")
            .param("titles", title)
            .param("prop", "extracts")
            .param("explaintext", "")
            .param("exsectionformat", "wiki");
        let page = self.query_page(request, title).await?;
        if !is_missing(&page) {
            fill_section_text(&mut sections, &str_field(&page, "extract"));
        }
        Ok(Some(sections))
    }
}

/// Heading line from the parse API with markup removed and entities decoded.
fn plain_heading(line: &str) -> String {
    let stripped = MARKUP_TAG.replace_all(line, "");
    html_escape::decode_html_entities(stripped.trim()).into_owned()
}

/// Splits a wiki-format plain extract at its headings and assigns each body
/// to the matching section. Headings are matched by title in page order; a
/// section with no matching heading keeps empty text.
fn fill_section_text(sections: &mut [WikiSection], extract: &str) {
    let mut bodies: Vec<(String, Vec<&str>)> = Vec::new();
    for line in extract.lines() {
        match WIKI_HEADING.captures(line) {
            Some(caps) => bodies.push((caps[2].trim().to_string(), Vec::new())),
            None => {
                if let Some((_, lines)) = bodies.last_mut() {
                    lines.push(line);
                }
            }
        }
    }

    let mut next = 0;
    for section in sections.iter_mut() {
        let found = bodies[next..]
            .iter()
            .position(|(heading, _)| *heading == section.title);
        if let Some(offset) = found {
            section.text = bodies[next + offset].1.join("\n").trim().to_string();
            next += offset + 1;
        }
    }
}

fn require_title(title: &str) -> Result<&str, ClientError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ClientError::InvalidInput("page title must not be empty".into()));
    }
    Ok(title)
}

fn is_missing(page: &Object) -> bool {
    page.contains_key("missing") || page.contains_key("invalid")
}

fn error_code(raw: &Value) -> Option<&str> {
    raw.get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
}

// MediaWiki reports API errors with HTTP 200 and an `error` object.
fn check_api_error(raw: &Value, body: &str) -> Result<(), ClientError> {
    match raw.get("error") {
        Some(error) => Err(ClientError::malformed(
            format!(
                "wikipedia API error {}: {}",
                error_code(raw).unwrap_or("unknown"),
                error.get("info").and_then(Value::as_str).unwrap_or_default()
            ),
            body,
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;

    const TITLE: &str = "Python (programming language)";

    fn page_body(extract: &str) -> String {
        json!({
            "batchcomplete": "",
            "query": {
                "pages": {
                    "23862": {
                        "pageid": 23862,
                        "ns": 0,
                        "title": TITLE,
                        "extract": extract,
                        "fullurl": "https://en.wikipedia.org/wiki/Python_(programming_language)"
                    }
                }
            }
        })
        .to_string()
    }

    fn missing_body() -> String {
        json!({
            "query": {"pages": {"-1": {"ns": 0, "title": "Nope Nope", "missing": ""}}}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_get_page_fetches_text_and_intro() {
        let transport = Arc::new(
            MockTransport::new().respond("api.php", page_body("Python is a language.\n\nHistory")),
        );
        let client = WikipediaClient::new(transport.clone());

        let page = client.get_page(TITLE).await.unwrap();
        assert!(page.exists);
        assert_eq!(page.page_id, Some(23862));
        assert_eq!(page.title, TITLE);
        assert!(page.text.starts_with("Python is a language."));
        assert_eq!(
            page.full_url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Python_(programming_language)")
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].url, "https://en.wikipedia.org/w/api.php");
        assert_eq!(calls[0].query_value("prop"), Some("extracts|info"));
        assert_eq!(calls[0].query_value("explaintext"), Some(""));
        assert_eq!(calls[0].query_value("exintro"), None);
        assert_eq!(calls[1].query_value("exintro"), Some(""));
        assert!(calls[0]
            .headers
            .contains(&("User-Agent".to_string(), "Dossier/1.0".to_string())));
    }

    #[tokio::test]
    async fn test_missing_page_short_circuits() {
        let transport = Arc::new(MockTransport::new().respond("api.php", missing_body()));
        let client = WikipediaClient::new(transport.clone());

        let page = client.get_page("Nope Nope").await.unwrap();
        assert!(!page.exists);
        assert!(page.text.is_empty());
        assert_eq!(page.page_id, None);
        assert_eq!(transport.call_count(), 1);

        assert_eq!(client.get_page_summary("Nope Nope").await.unwrap(), None);
        assert_eq!(client.get_page_url("Nope Nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_language_and_html_format() {
        let transport = Arc::new(MockTransport::new().respond("api.php", page_body("<p>Intro</p>")));
        let client = WikipediaClient::new(transport.clone())
            .with_language("de")
            .with_user_agent("MyBot/2.0 (ops@example.com)")
            .with_extract_format(ExtractFormat::Html);

        let summary = client.get_page_summary(TITLE).await.unwrap();
        assert_eq!(summary.as_deref(), Some("<p>Intro</p>"));

        let call = &transport.calls()[0];
        assert_eq!(call.url, "https://de.wikipedia.org/w/api.php");
        assert_eq!(call.query_value("explaintext"), None);
        assert_eq!(call.query_value("exintro"), Some(""));
        assert!(call
            .headers
            .contains(&("User-Agent".to_string(), "MyBot/2.0 (ops@example.com)".to_string())));
    }

    #[tokio::test]
    async fn test_get_page_url() {
        let transport = Arc::new(MockTransport::new().respond("api.php", page_body("")));
        let client = WikipediaClient::new(transport.clone());
        let url = client.get_page_url(TITLE).await.unwrap();
        assert_eq!(
            url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Python_(programming_language)")
        );
        assert_eq!(transport.calls()[0].query_value("prop"), Some("info"));
    }

    fn sections_body() -> String {
        json!({
            "parse": {
                "title": TITLE,
                "pageid": 23862,
                "sections": [
                    {"toclevel": 1, "level": "2", "line": "History", "number": "1", "index": "1"},
                    {"toclevel": 2, "level": "3", "line": "<i>Python</i> &amp; 3", "number": "1.1", "index": "2"},
                    {"toclevel": 1, "level": "2", "line": "Syntax", "number": "2", "index": "3"},
                    {"toclevel": 1, "level": "2", "line": "See also", "number": "3", "index": "4"}
                ]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_get_page_sections() {
        let extract = "Python is a language.\n\n\n== History ==\nConceived in the late 1980s.\n\nFirst released in 1991.\n\n\n=== Python & 3 ===\nReleased in 2008.\n\n\n== Syntax ==\nIndentation is significant.\n";
        let transport = Arc::new(
            MockTransport::new()
                .respond("action=parse", sections_body())
                .respond("api.php", page_body(extract)),
        );
        let client = WikipediaClient::new(transport.clone());

        let sections = client.get_page_sections(TITLE).await.unwrap().unwrap();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].title, "History");
        assert_eq!(
            sections[0].text,
            "Conceived in the late 1980s.\n\nFirst released in 1991."
        );
        assert_eq!(sections[1].title, "Python & 3");
        assert_eq!(sections[1].level, 2);
        assert_eq!(sections[1].number, "1.1");
        assert_eq!(sections[1].text, "Released in 2008.");
        assert_eq!(sections[2].text, "Indentation is significant.");
        assert_eq!(sections[3].title, "See also");
        assert!(sections[3].text.is_empty());

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].query_value("action"), Some("parse"));
        assert_eq!(calls[0].query_value("page"), Some(TITLE));
        assert_eq!(calls[0].query_value("prop"), Some("sections"));
        assert_eq!(calls[1].query_value("action"), Some("query"));
        assert_eq!(calls[1].query_value("exsectionformat"), Some("wiki"));
        assert_eq!(calls[1].query_value("explaintext"), Some(""));
    }

    #[test]
    fn test_repeated_headings_match_in_order() {
        let mut sections = vec![
            WikiSection {
                title: "Notes".into(),
                ..Default::default()
            },
            WikiSection {
                title: "Notes".into(),
                ..Default::default()
            },
        ];
        fill_section_text(&mut sections, "== Notes ==\nfirst\n== Notes ==\nsecond");
        assert_eq!(sections[0].text, "first");
        assert_eq!(sections[1].text, "second");
    }

    #[tokio::test]
    async fn test_sections_of_missing_page_is_none() {
        let body = json!({
            "error": {"code": "missingtitle", "info": "The page you specified doesn't exist."}
        })
        .to_string();
        let transport = Arc::new(MockTransport::new().respond("api.php", body));
        let client = WikipediaClient::new(transport);
        assert_eq!(client.get_page_sections("Nope Nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_error_is_malformed() {
        let body = json!({"error": {"code": "badvalue", "info": "Unrecognized value"}}).to_string();
        let transport = Arc::new(MockTransport::new().respond("api.php", body));
        let client = WikipediaClient::new(transport);
        let err = client.get_page_summary(TITLE).await.unwrap_err();
        assert_eq!(err.code_str(), "malformed_response");
        assert!(err.to_string().contains("badvalue"));
    }

    #[tokio::test]
    async fn test_empty_title_is_rejected() {
        let transport = Arc::new(MockTransport::new());
        let client = WikipediaClient::new(transport.clone());
        assert!(client.get_page("   ").await.is_err());
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_extract_format_parsing() {
        assert_eq!("HTML".parse::<ExtractFormat>().unwrap(), ExtractFormat::Html);
        assert_eq!("plain".parse::<ExtractFormat>().unwrap(), ExtractFormat::Plain);
        assert!("wiki".parse::<ExtractFormat>().is_err());
    }
}
