//! Response normalization.
//!
//! Upstream payloads are loosely structured: keys go missing, numbers arrive
//! as floats, arrays sometimes sit inside an envelope object. Every reader
//! here falls back to a typed default instead of failing, and items that are
//! not JSON objects are skipped with a warning. Only an unusable top-level
//! shape is reported as [`ClientError::MalformedResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ClientError;
use crate::records::{Answer, CodeSnippet, DocEntry, Question, SearchResult, WebResult};

/// A JSON object as read from an upstream payload.
pub type Object = Map<String, Value>;

/// Which record type a payload should be normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    SearchResult,
    DocEntry,
    Question,
    Answer,
    WebResult,
}

impl RecordKind {
    /// Key of the nested array when the payload arrives wrapped in an object.
    pub fn envelope_key(self) -> &'static str {
        match self {
            RecordKind::SearchResult | RecordKind::WebResult => "results",
            RecordKind::DocEntry => "snippets",
            RecordKind::Question | RecordKind::Answer => "items",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::SearchResult => "search-result",
            RecordKind::DocEntry => "doc-entry",
            RecordKind::Question => "question",
            RecordKind::Answer => "answer",
            RecordKind::WebResult => "web-result",
        }
    }
}

/// A normalized record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum Record {
    SearchResult(SearchResult),
    DocEntry(DocEntry),
    Question(Question),
    Answer(Answer),
    WebResult(WebResult),
}

/// Mapping from a loose JSON object to a typed record.
pub trait Normalize: Sized {
    const KIND: RecordKind;

    fn from_object(obj: &Object) -> Self;
}

/// Normalize `raw` into records of `kind`.
pub fn normalize(raw: &Value, kind: RecordKind) -> Result<Vec<Record>, ClientError> {
    Ok(match kind {
        RecordKind::SearchResult => normalize_as::<SearchResult>(raw)?
            .into_iter()
            .map(Record::SearchResult)
            .collect(),
        RecordKind::DocEntry => normalize_as::<DocEntry>(raw)?
            .into_iter()
            .map(Record::DocEntry)
            .collect(),
        RecordKind::Question => normalize_as::<Question>(raw)?
            .into_iter()
            .map(Record::Question)
            .collect(),
        RecordKind::Answer => normalize_as::<Answer>(raw)?
            .into_iter()
            .map(Record::Answer)
            .collect(),
        RecordKind::WebResult => normalize_as::<WebResult>(raw)?
            .into_iter()
            .map(Record::WebResult)
            .collect(),
    })
}

/// Typed form of [`normalize`].
pub fn normalize_as<T: Normalize>(raw: &Value) -> Result<Vec<T>, ClientError> {
    normalize_items(raw, T::KIND).map_err(|reason| ClientError::malformed(reason, raw.to_string()))
}

/// Parse a response body and normalize it. The malformed error keeps the
/// body exactly as received.
pub fn normalize_body<T: Normalize>(body: &str) -> Result<Vec<T>, ClientError> {
    let raw = parse_body(body)?;
    normalize_parsed(&raw, body)
}

pub(crate) fn parse_body(body: &str) -> Result<Value, ClientError> {
    serde_json::from_str(body)
        .map_err(|e| ClientError::malformed(format!("invalid JSON: {}", e), body))
}

/// Normalize an already parsed body, reporting `body` as the raw text.
pub(crate) fn normalize_parsed<T: Normalize>(
    raw: &Value,
    body: &str,
) -> Result<Vec<T>, ClientError> {
    normalize_items(raw, T::KIND).map_err(|reason| ClientError::malformed(reason, body))
}

fn normalize_items<T: Normalize>(raw: &Value, kind: RecordKind) -> Result<Vec<T>, String> {
    let items = unwrap_envelope(raw, kind).ok_or_else(|| {
        format!(
            "expected an array of {} items, got {}",
            kind.as_str(),
            type_name(raw)
        )
    })?;

    Ok(items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match item.as_object() {
            Some(obj) => Some(T::from_object(obj)),
            None => {
                warn!(
                    kind = kind.as_str(),
                    index = idx,
                    "skipping non-object item: {}",
                    type_name(item)
                );
                None
            }
        })
        .collect())
}

fn unwrap_envelope(raw: &Value, kind: RecordKind) -> Option<&Vec<Value>> {
    match raw {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get(kind.envelope_key()).and_then(Value::as_array),
        _ => None,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Field readers. Each one returns the type's default when the key is missing
// or holds an incompatible value.

pub(crate) fn str_field(obj: &Object, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn opt_str_field(obj: &Object, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn opt_int_field(obj: &Object, key: &str) -> Option<i64> {
    let value = obj.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

pub(crate) fn int_field(obj: &Object, key: &str) -> i64 {
    opt_int_field(obj, key).unwrap_or_default()
}

fn float_field(obj: &Object, key: &str) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or_default()
}

pub(crate) fn bool_field(obj: &Object, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or_default()
}

fn string_list(obj: &Object, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn decoded(text: String) -> String {
    if text.contains('&') {
        html_escape::decode_html_entities(&text).into_owned()
    } else {
        text
    }
}

impl Normalize for SearchResult {
    const KIND: RecordKind = RecordKind::SearchResult;

    fn from_object(obj: &Object) -> Self {
        SearchResult {
            id: str_field(obj, "id"),
            title: str_field(obj, "title"),
            description: str_field(obj, "description"),
            stars: int_field(obj, "stars"),
            trust_score: float_field(obj, "trustScore"),
            versions: string_list(obj, "versions"),
        }
    }
}

fn code_snippet(obj: &Object) -> CodeSnippet {
    CodeSnippet {
        language: str_field(obj, "language"),
        code: str_field(obj, "code"),
    }
}

impl Normalize for DocEntry {
    const KIND: RecordKind = RecordKind::DocEntry;

    fn from_object(obj: &Object) -> Self {
        let code_list = obj
            .get("codeList")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item.as_object() {
                        Some(o) => Some(code_snippet(o)),
                        None => {
                            warn!("skipping non-object code snippet: {}", type_name(item));
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        DocEntry {
            title: str_field(obj, "codeTitle"),
            description: str_field(obj, "codeDescription"),
            language: str_field(obj, "codeLanguage"),
            source_id: str_field(obj, "codeId"),
            page_title: str_field(obj, "pageTitle"),
            code_list,
            relevance: float_field(obj, "relevance"),
        }
    }
}

impl Normalize for WebResult {
    const KIND: RecordKind = RecordKind::WebResult;

    fn from_object(obj: &Object) -> Self {
        WebResult {
            title: str_field(obj, "title"),
            href: str_field(obj, "href"),
            body: str_field(obj, "body"),
        }
    }
}

impl Normalize for Question {
    const KIND: RecordKind = RecordKind::Question;

    fn from_object(obj: &Object) -> Self {
        Question {
            id: int_field(obj, "question_id"),
            title: decoded(str_field(obj, "title")),
            score: int_field(obj, "score"),
            link: str_field(obj, "link"),
            tags: string_list(obj, "tags").into_iter().map(decoded).collect(),
            accepted_answer_id: opt_int_field(obj, "accepted_answer_id"),
            is_answered: bool_field(obj, "is_answered"),
        }
    }
}

impl Normalize for Answer {
    const KIND: RecordKind = RecordKind::Answer;

    fn from_object(obj: &Object) -> Self {
        Answer {
            id: int_field(obj, "answer_id"),
            question_id: int_field(obj, "question_id"),
            // Body is HTML; entities stay encoded.
            body: str_field(obj, "body"),
            score: int_field(obj, "score"),
            link: opt_str_field(obj, "link"),
            created: int_field(obj, "creation_date"),
            is_accepted: bool_field(obj, "is_accepted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_results_map_every_field() {
        let raw = json!({
            "results": [
                {
                    "id": "/scikit-learn/scikit-learn",
                    "title": "Scikit-learn",
                    "description": "scikit-learn: machine learning in Python",
                    "branch": "main",
                    "stars": 61913,
                    "trustScore": 8.5,
                    "versions": ["1.7.1"]
                },
                {
                    "id": "/pandas-dev/pandas",
                    "title": "pandas",
                    "description": "Flexible data analysis",
                    "stars": 45000,
                    "trustScore": 9,
                    "versions": []
                }
            ]
        });

        let results = normalize_as::<SearchResult>(&raw).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            SearchResult {
                id: "/scikit-learn/scikit-learn".into(),
                title: "Scikit-learn".into(),
                description: "scikit-learn: machine learning in Python".into(),
                stars: 61913,
                trust_score: 8.5,
                versions: vec!["1.7.1".into()],
            }
        );
        // integer trust score is accepted as a float
        assert_eq!(results[1].trust_score, 9.0);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let raw = json!([{ "id": "/only/id" }]);
        let results = normalize_as::<SearchResult>(&raw).unwrap();
        assert_eq!(results[0].id, "/only/id");
        assert_eq!(results[0].title, "");
        assert_eq!(results[0].stars, 0);
        assert_eq!(results[0].trust_score, 0.0);
        assert!(results[0].versions.is_empty());

        let answers = normalize_as::<Answer>(&json!({"items": [{}]})).unwrap();
        assert_eq!(answers[0], Answer::default());
    }

    #[test]
    fn test_doc_entries_unwrap_snippets_envelope() {
        let raw = json!({
            "snippets": [
                {
                    "codeTitle": "Build Documentation",
                    "codeDescription": "Builds the HTML documentation website",
                    "codeLanguage": "bash",
                    "codeId": "https://github.com/scikit-learn/scikit-learn/blob/main/doc/developers/contributing.rst#_snippet_23",
                    "pageTitle": "Scikit-learn Contributing Guide",
                    "codeList": [
                        {"language": "bash", "code": "cd doc\nmake html"},
                        "not a snippet",
                        {"code": "make clean"}
                    ],
                    "relevance": 0.033333335
                }
            ]
        });

        let docs = normalize_as::<DocEntry>(&raw).unwrap();
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.title, "Build Documentation");
        assert_eq!(doc.language, "bash");
        assert_eq!(doc.page_title, "Scikit-learn Contributing Guide");
        assert_eq!(doc.code_list.len(), 2);
        assert_eq!(doc.code_list[0].code, "cd doc\nmake html");
        assert_eq!(doc.code_list[1].language, "");
        assert!((doc.relevance - 0.033333335).abs() < 1e-9);
    }

    #[test]
    fn test_non_object_items_are_skipped() {
        let raw = json!([{"title": "a", "href": "https://a"}, 42, null, "x", {"title": "b"}]);
        let results = normalize_as::<WebResult>(&raw).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].title, "b");
        assert_eq!(results[1].href, "");
    }

    #[test]
    fn test_non_array_payload_is_malformed() {
        let raw = json!({"message": "rate limited"});
        let err = normalize_as::<DocEntry>(&raw).unwrap_err();
        assert_eq!(err.code_str(), "malformed_response");
        assert_eq!(err.raw_body(), Some(raw.to_string().as_str()));

        let err = normalize(&json!("plain"), RecordKind::Question).unwrap_err();
        assert!(err.to_string().contains("got string"));
    }

    #[test]
    fn test_normalize_body_keeps_original_text() {
        let body = "# Docs\nnot json at all";
        let err = normalize_body::<DocEntry>(body).unwrap_err();
        assert_eq!(err.raw_body(), Some(body));
    }

    #[test]
    fn test_questions_decode_entities_and_accept_float_ids() {
        let raw = json!({
            "items": [{
                "question_id": 11227809.0,
                "title": "Why can&#39;t I &quot;borrow&quot; this?",
                "score": 27,
                "link": "https://stackoverflow.com/q/11227809",
                "tags": ["rust", "c&#43;&#43;"],
                "accepted_answer_id": 11227902,
                "is_answered": true
            }]
        });
        let questions = normalize_as::<Question>(&raw).unwrap();
        let q = &questions[0];
        assert_eq!(q.id, 11227809);
        assert_eq!(q.title, "Why can't I \"borrow\" this?");
        assert_eq!(q.tags, vec!["rust".to_string(), "c++".to_string()]);
        assert_eq!(q.accepted_answer_id, Some(11227902));
        assert!(q.is_answered);
    }

    #[test]
    fn test_dynamic_normalize_tags_records() {
        let raw = json!({"items": [{"answer_id": 5, "question_id": 1, "is_accepted": true}]});
        let records = normalize(&raw, RecordKind::Answer).unwrap();
        match &records[0] {
            Record::Answer(a) => {
                assert_eq!(a.id, 5);
                assert!(a.is_accepted);
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }
}
