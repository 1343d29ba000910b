//! Value records returned by the clients.
//!
//! Everything here is produced by the normalizer (or the dossier assembler)
//! and handed to the caller by value.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A library match from the documentation search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Library id usable with `DocsClient::get_docs` (e.g. "/vercel/next.js")
    pub id: String,
    pub title: String,
    pub description: String,
    /// Popularity (repository stars)
    pub stars: i64,
    pub trust_score: f64,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub language: String,
    pub code: String,
}

/// A documentation snippet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocEntry {
    pub title: String,
    pub description: String,
    pub language: String,
    /// Upstream snippet id, usually a source URL with an anchor
    pub source_id: String,
    pub page_title: String,
    pub code_list: Vec<CodeSnippet>,
    /// Conventionally 0.0-1.0; not clamped
    pub relevance: f64,
}

/// A metasearch hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub title: String,
    pub score: i64,
    pub link: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_answer_id: Option<i64>,
    pub is_answered: bool,
}

impl Question {
    pub fn has_accepted_answer(&self) -> bool {
        self.accepted_answer_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    /// HTML body as returned with the `withbody` filter
    pub body: String,
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Creation time, Unix seconds
    pub created: i64,
    pub is_accepted: bool,
}

impl Answer {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created, 0).single()
    }
}

/// A question joined with its accepted answer.
///
/// Only [`crate::dossier::assemble`] builds these, which guarantees
/// `answer.question_id == question.id`. Deserializing rejects payloads
/// that break the pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DossierItemRepr")]
pub struct DossierItem {
    question: Question,
    #[serde(rename = "accepted_answer")]
    answer: Answer,
}

#[derive(Deserialize)]
struct DossierItemRepr {
    question: Question,
    accepted_answer: Answer,
}

impl TryFrom<DossierItemRepr> for DossierItem {
    type Error = String;

    fn try_from(repr: DossierItemRepr) -> Result<Self, Self::Error> {
        if repr.accepted_answer.question_id != repr.question.id {
            return Err(format!(
                "answer {} belongs to question {}, not {}",
                repr.accepted_answer.id, repr.accepted_answer.question_id, repr.question.id
            ));
        }
        Ok(Self {
            question: repr.question,
            answer: repr.accepted_answer,
        })
    }
}

impl DossierItem {
    pub(crate) fn new(question: Question, answer: Answer) -> Self {
        debug_assert_eq!(question.id, answer.question_id);
        Self { question, answer }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    /// Answer link, falling back to the question link.
    pub fn answer_link(&self) -> &str {
        self.answer
            .link
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.question.link)
    }

    pub fn into_parts(self) -> (Question, Answer) {
        (self.question, self.answer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSection {
    pub title: String,
    pub level: u32,
    /// Outline number such as "2.1"
    pub number: String,
    /// Plain-text body up to the next heading, without subsections
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPage {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<i64>,
    pub exists: bool,
    pub summary: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
}
