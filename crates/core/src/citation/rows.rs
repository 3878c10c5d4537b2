//! Editable staging rows and the validation result types.

use serde::{Deserialize, Serialize};

use super::types::Citation;

/// Pre-validation form of a citation. Every field is free-form text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRow {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub span_start: String,
    #[serde(default)]
    pub span_end: String,
    #[serde(default)]
    pub span_text: String,
}

impl CitationRow {
    pub fn with_doc_id(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            ..Default::default()
        }
    }

    /// A row whose every field is blank is treated as absent.
    pub fn is_blank(&self) -> bool {
        [
            &self.doc_id,
            &self.page,
            &self.span_start,
            &self.span_end,
            &self.span_text,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }

    /// Build an editable row from an existing citation (for the editor).
    pub fn from_citation(citation: &Citation) -> Self {
        let span = citation.span.clone().unwrap_or_default();
        Self {
            doc_id: citation.doc_id.clone(),
            page: citation.page.map(|p| p.to_string()).unwrap_or_default(),
            span_start: span.start.map(|s| s.to_string()).unwrap_or_default(),
            span_end: span.end.map(|e| e.to_string()).unwrap_or_default(),
            span_text: span.text.unwrap_or_default(),
        }
    }
}

/// The editable fields of a [`CitationRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationField {
    DocId,
    Page,
    SpanStart,
    SpanEnd,
    SpanText,
}

impl CitationField {
    /// Map a server-side field name onto a row field.
    ///
    /// Accepts the bare name (`page`), nested span names (`span.start`) and
    /// the aliases the Inbox API has used for document ids.
    pub fn from_api_name(name: &str) -> Option<Self> {
        match name {
            "doc_id" | "document_id" | "docId" => Some(Self::DocId),
            "page" => Some(Self::Page),
            "span.start" | "span_start" | "start" => Some(Self::SpanStart),
            "span.end" | "span_end" | "end" => Some(Self::SpanEnd),
            "span.text" | "span_text" | "text" => Some(Self::SpanText),
            _ => None,
        }
    }
}

/// Field-level errors for a single row. Empty means the row is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_text: Option<String>,
}

impl RowErrors {
    pub fn is_empty(&self) -> bool {
        self.doc_id.is_none()
            && self.page.is_none()
            && self.span_start.is_none()
            && self.span_end.is_none()
            && self.span_text.is_none()
    }

    pub fn get(&self, field: CitationField) -> Option<&str> {
        match field {
            CitationField::DocId => self.doc_id.as_deref(),
            CitationField::Page => self.page.as_deref(),
            CitationField::SpanStart => self.span_start.as_deref(),
            CitationField::SpanEnd => self.span_end.as_deref(),
            CitationField::SpanText => self.span_text.as_deref(),
        }
    }

    /// Record an error, keeping the first one set for a field.
    pub fn set(&mut self, field: CitationField, message: impl Into<String>) {
        let slot = match field {
            CitationField::DocId => &mut self.doc_id,
            CitationField::Page => &mut self.page,
            CitationField::SpanStart => &mut self.span_start,
            CitationField::SpanEnd => &mut self.span_end,
            CitationField::SpanText => &mut self.span_text,
        };
        if slot.is_none() {
            *slot = Some(message.into());
        }
    }
}

/// Result of validating a set of rows.
///
/// `row_errors` is index-aligned with the input rows; `citation_rows[i]` is
/// the input row `citations[i]` was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub citations: Vec<Citation>,
    #[serde(skip)]
    pub citation_rows: Vec<usize>,
    pub row_errors: Vec<RowErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_error: Option<String>,
    pub is_valid: bool,
}

impl ValidationOutcome {
    /// Number of rows carrying at least one field error.
    pub fn invalid_row_count(&self) -> usize {
        self.row_errors.iter().filter(|e| !e.is_empty()).count()
    }

    /// The first human-readable problem, for single-line display.
    pub fn first_message(&self) -> Option<String> {
        if let Some(general) = &self.general_error {
            return Some(general.clone());
        }
        self.row_errors.iter().enumerate().find_map(|(index, errors)| {
            [
                &errors.doc_id,
                &errors.page,
                &errors.span_start,
                &errors.span_end,
                &errors.span_text,
            ]
            .into_iter()
            .flatten()
            .next()
            .map(|message| format!("Citation {}: {message}", index + 1))
        })
    }
}
