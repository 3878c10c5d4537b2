//! Manual FAQ creation form.
//!
//! Citations here are optional and over-long span excerpts are truncated,
//! unlike the attach flow which rejects them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::citation::{
    validate_citation_rows_with, Citation, CitationRow, SpanTextPolicy, ValidationOutcome,
};

/// Maximum length of a manually authored question.
pub const MAX_QUESTION_LENGTH: usize = 1_000;

/// Maximum length of a manually authored answer.
pub const MAX_ANSWER_LENGTH: usize = 10_000;

/// The form as the user edits it. Also the shape stored as a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualFaqInput {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rows: Vec<CitationRow>,
}

/// Validated request body for manual FAQ creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualFaqPayload {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub tags: BTreeSet<String>,
    pub citations: Vec<Citation>,
}

/// Everything wrong with a manual FAQ submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualFaqErrors {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub citations: ValidationOutcome,
}

impl ManualFaqErrors {
    pub fn summary(&self) -> String {
        [
            self.question.clone(),
            self.answer.clone(),
            self.citations.first_message(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

pub fn validate_manual_faq(input: &ManualFaqInput) -> Result<ManualFaqPayload, ManualFaqErrors> {
    let question = input.question.trim();
    let answer = input.answer.trim();

    let question_error = if question.is_empty() {
        Some("Question is required.".to_string())
    } else if question.chars().count() > MAX_QUESTION_LENGTH {
        Some(format!("Question must be {MAX_QUESTION_LENGTH} characters or fewer."))
    } else {
        None
    };

    let answer_error = if answer.is_empty() {
        Some("Answer is required.".to_string())
    } else if answer.chars().count() > MAX_ANSWER_LENGTH {
        Some(format!("Answer must be {MAX_ANSWER_LENGTH} characters or fewer."))
    } else {
        None
    };

    let citations = validate_citation_rows_with(&input.rows, true, SpanTextPolicy::Truncate);

    if question_error.is_some() || answer_error.is_some() || !citations.is_valid {
        return Err(ManualFaqErrors {
            question: question_error,
            answer: answer_error,
            citations,
        });
    }

    let title = input.title.trim();
    Ok(ManualFaqPayload {
        question: question.to_string(),
        answer: answer.to_string(),
        title: (!title.is_empty()).then(|| title.to_string()),
        tags: input
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        citations: citations.citations,
    })
}
