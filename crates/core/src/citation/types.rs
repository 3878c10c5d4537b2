//! API-facing citation entities.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Location inside a cited document. Every field is optional, but a span is
/// only ever emitted when at least one of them is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.text.is_none()
    }
}

/// A reference to a document offered as evidence for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Display title resolved from the document store. Never sent upstream.
    #[serde(default, skip_serializing)]
    pub title: Option<String>,
}

impl Citation {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            page: None,
            span: None,
            title: None,
        }
    }
}

/// Check the per-item citation invariants: unique document ids (compared
/// case-insensitively) and `start <= end` on every span with both bounds.
pub fn check_citation_invariants(citations: &[Citation]) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for citation in citations {
        let key = citation.doc_id.trim().to_lowercase();
        if key.is_empty() {
            return Err(CoreError::Validation(
                "Citation document ID must not be empty".to_string(),
            ));
        }
        if !seen.insert(key) {
            return Err(CoreError::Validation(format!(
                "Duplicate citation document ID '{}'",
                citation.doc_id
            )));
        }
        if let Some(Span {
            start: Some(start),
            end: Some(end),
            ..
        }) = &citation.span
        {
            if start > end {
                return Err(CoreError::Validation(format!(
                    "Citation '{}' has span start {start} after span end {end}",
                    citation.doc_id
                )));
            }
        }
    }
    Ok(())
}
