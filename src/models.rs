//! Core data models used throughout kproof.
//!
//! These types represent the sentences, checker verdicts, and flagged rows
//! that flow through the review pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the dictionary/API-backed spell checker.
pub const HANSPELL: &str = "hanspell";
/// Name of the model-backed spacing checker.
pub const SPACING: &str = "spacing";
/// Name of the regex rule checker.
pub const RULE: &str = "rule";
/// Name of the grammar-service checker.
pub const LANGUAGETOOL: &str = "languagetool";

/// A sentence produced by segmentation, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub page: u32,
    pub text: String,
    pub is_ocr: bool,
}

impl Sentence {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
            is_ocr: false,
        }
    }
}

/// A single structured finding reported by a checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub label: String,
    pub hint: String,
}

/// The result of one checker evaluating one sentence.
///
/// Also the value type persisted by [`crate::cache::ResultCache`], so the
/// serde shape is part of the cache file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckVerdict {
    pub flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Hit>>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl CheckVerdict {
    /// A non-flag verdict with no detail.
    pub fn clean() -> Self {
        Self::default()
    }

    /// A non-flag verdict carrying an `error` annotation.
    pub fn failed(reason: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("error".to_string(), Value::String(reason.into()));
        Self {
            flagged: false,
            suggestion: None,
            suggestions: None,
            metadata,
        }
    }

    /// The `error` annotation, if this verdict records a checker failure.
    pub fn error(&self) -> Option<&str> {
        self.metadata.get("error").and_then(|v| v.as_str())
    }

    /// The payload a flagged verdict contributes to `suggestion_by_source`.
    ///
    /// A single suggestion wins over a hit list. Non-flag verdicts never
    /// contribute, whatever fields they carry.
    pub fn payload(&self) -> Option<SuggestionPayload> {
        if !self.flagged {
            return None;
        }
        if let Some(text) = &self.suggestion {
            return Some(SuggestionPayload::Text(text.clone()));
        }
        self.suggestions
            .as_ref()
            .map(|hits| SuggestionPayload::Hits(hits.clone()))
    }
}

/// What a flagging checker proposed: one corrected sentence or a hit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionPayload {
    Text(String),
    Hits(Vec<Hit>),
}

impl SuggestionPayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SuggestionPayload::Text(s) => Some(s),
            SuggestionPayload::Hits(_) => None,
        }
    }

    pub fn as_hits(&self) -> Option<&[Hit]> {
        match self {
            SuggestionPayload::Text(_) => None,
            SuggestionPayload::Hits(hits) => Some(hits),
        }
    }
}

/// One report row for a sentence that at least one checker flagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedRow {
    pub page: u32,
    pub sentence: String,
    pub snippet: String,
    /// Flagging checkers, in registry order.
    pub sources: Vec<String>,
    /// Rule hit labels, in rule evaluation order.
    pub error_types: Vec<String>,
    pub suggestion_by_source: BTreeMap<String, SuggestionPayload>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata_by_source: BTreeMap<String, Map<String, Value>>,
    pub representative_suggestion: Option<String>,
    pub diff: String,
    pub is_ocr: bool,
}

impl FlaggedRow {
    /// Sources joined with `,`, the form used for tie-breaking and export.
    pub fn sources_label(&self) -> String {
        self.sources.join(",")
    }
}
