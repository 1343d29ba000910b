//! Error-message classifier.
//!
//! Maps a free-text error message to the language it most likely came from
//! by checking an ordered table of labeled patterns. The detected label is
//! used as a tag filter when searching the Q&A site.
//!
//! # Example
//!
//! ```rust
//! use dossier_core::classify::{ErrorClassifier, UNKNOWN};
//!
//! let classifier = ErrorClassifier::new();
//! assert_eq!(classifier.classify("TypeError: unsupported operand"), "python");
//! assert_eq!(classifier.classify("hello world"), UNKNOWN);
//! ```

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Label returned when no pattern set matches.
pub const UNKNOWN: &str = "unknown";

/// Default table, checked top to bottom.
pub const DEFAULT_LANGUAGE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "python",
        &[
            r"TypeError",
            r"ValueError",
            r"AttributeError",
            r"IndexError",
            r"KeyError",
            r"ImportError",
            r"Traceback \(most recent call last\)",
        ],
    ),
    (
        "javascript",
        &[
            r"ReferenceError",
            r"TypeError.*JavaScript",
            r"Uncaught",
            r"Cannot read property",
        ],
    ),
    (
        "java",
        &[
            r"NullPointerException",
            r"ArrayIndexOutOfBoundsException",
            r"ClassNotFoundException",
        ],
    ),
];

static DEFAULT_CLASSIFIER: Lazy<ErrorClassifier> = Lazy::new(|| {
    ErrorClassifier::from_table(DEFAULT_LANGUAGE_PATTERNS)
        .unwrap_or_else(|e| unreachable!("built-in patterns must compile: {}", e))
});

static ERROR_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+Error|\w+Exception)")
        .unwrap_or_else(|e| unreachable!("built-in pattern must compile: {}", e))
});

/// One label and the patterns that select it.
#[derive(Debug, Clone)]
struct LabelPatterns {
    label: String,
    patterns: Vec<Regex>,
}

impl LabelPatterns {
    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

/// Outcome of classifying an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Detected language label or [`UNKNOWN`]
    pub language: String,
    /// First `...Error` / `...Exception` token, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl Classification {
    pub fn is_known(&self) -> bool {
        self.language != UNKNOWN
    }
}

/// Ordered label → pattern table. Matching is case-insensitive and the first
/// label (in declaration order) with any matching pattern wins.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    table: Vec<LabelPatterns>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier {
    /// Classifier with the built-in language table.
    pub fn new() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }

    /// Build a classifier from a custom table. Fails on the first pattern
    /// that does not compile.
    pub fn from_table<L, P>(table: &[(L, &[P])]) -> Result<Self, ClientError>
    where
        L: AsRef<str>,
        P: AsRef<str>,
    {
        let mut compiled = Vec::with_capacity(table.len());
        for (label, patterns) in table {
            let label = AsRef::<str>::as_ref(label);
            let patterns = patterns
                .iter()
                .map(|p| {
                    let pattern = AsRef::<str>::as_ref(p);
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            ClientError::InvalidInput(format!(
                                "invalid pattern '{}' for label '{}': {}",
                                pattern, label, e
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            compiled.push(LabelPatterns {
                label: label.to_string(),
                patterns,
            });
        }
        Ok(Self { table: compiled })
    }

    /// Label of the first matching pattern set, or `None`.
    pub fn detect_language(&self, text: &str) -> Option<&str> {
        self.table
            .iter()
            .find(|entry| entry.matches(text))
            .map(|entry| entry.label.as_str())
    }

    /// Like [`detect_language`](Self::detect_language) but returns [`UNKNOWN`]
    /// instead of `None`.
    pub fn classify(&self, text: &str) -> &str {
        self.detect_language(text).unwrap_or(UNKNOWN)
    }

    pub fn analyze(&self, text: &str) -> Classification {
        Classification {
            language: self.classify(text).to_string(),
            error_type: extract_error_type(text),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.table.iter().map(|entry| entry.label.as_str())
    }
}

/// First token shaped like an error or exception name (case-sensitive).
pub fn extract_error_type(text: &str) -> Option<String> {
    ERROR_NAME
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
