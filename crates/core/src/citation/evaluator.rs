//! Row evaluator. Pure logic, no network access.

use std::collections::HashMap;

use super::rows::{CitationField, CitationRow, RowErrors, ValidationOutcome};
use super::types::{Citation, Span};

/// Maximum number of characters allowed in a span excerpt.
pub const MAX_SPAN_TEXT_CHARS: usize = 400;

/// Maximum number of citations attached to one item.
pub const MAX_CITATIONS: usize = 3;

pub const MSG_DOC_ID_REQUIRED: &str = "Document ID is required.";
pub const MSG_DUPLICATE_DOC_ID: &str = "Duplicate document ID.";
pub const MSG_SPAN_START_AFTER_END: &str = "Span start cannot be after span end.";
pub const MSG_SPAN_END_BEFORE_START: &str = "Span end cannot be before span start.";
pub const MSG_ATTACH_AT_LEAST_ONE: &str = "Attach at least one citation before continuing.";

/// How over-long span text is handled.
///
/// The attach and approve flows reject it; the manual FAQ creation flow
/// truncates it. Each call site picks its own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanTextPolicy {
    Reject,
    Truncate,
}

/// Validate rows for the attach/approve flows (over-long span text rejected).
pub fn validate_citation_rows(rows: &[CitationRow], allow_empty: bool) -> ValidationOutcome {
    validate_citation_rows_with(rows, allow_empty, SpanTextPolicy::Reject)
}

/// Validate rows with an explicit span-text policy.
pub fn validate_citation_rows_with(
    rows: &[CitationRow],
    allow_empty: bool,
    policy: SpanTextPolicy,
) -> ValidationOutcome {
    let duplicates = duplicate_doc_ids(rows);

    let mut citations = Vec::new();
    let mut citation_rows = Vec::new();
    let mut row_errors = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        if row.is_blank() {
            row_errors.push(RowErrors::default());
            continue;
        }

        let (citation, errors) = validate_row(row, &duplicates, policy);
        if let Some(citation) = citation {
            citations.push(citation);
            citation_rows.push(index);
        }
        row_errors.push(errors);
    }

    let general_error = if !allow_empty && citations.is_empty() {
        Some(MSG_ATTACH_AT_LEAST_ONE.to_string())
    } else if citations.len() > MAX_CITATIONS {
        Some(format!("Attach no more than {MAX_CITATIONS} citations."))
    } else {
        None
    };

    let is_valid = general_error.is_none() && row_errors.iter().all(RowErrors::is_empty);

    ValidationOutcome {
        citations,
        citation_rows,
        row_errors,
        general_error,
        is_valid,
    }
}

/// Lower-cased document ids that appear on more than one non-blank row.
fn duplicate_doc_ids(rows: &[CitationRow]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows.iter().filter(|r| !r.is_blank()) {
        let key = row.doc_id.trim().to_lowercase();
        if !key.is_empty() {
            *counts.entry(key).or_default() += 1;
        }
    }
    counts.retain(|_, count| *count > 1);
    counts
}

fn validate_row(
    row: &CitationRow,
    duplicates: &HashMap<String, usize>,
    policy: SpanTextPolicy,
) -> (Option<Citation>, RowErrors) {
    let mut errors = RowErrors::default();

    let doc_id = row.doc_id.trim();
    if doc_id.is_empty() {
        errors.set(CitationField::DocId, MSG_DOC_ID_REQUIRED);
    } else if duplicates.contains_key(&doc_id.to_lowercase()) {
        errors.set(CitationField::DocId, MSG_DUPLICATE_DOC_ID);
    }

    let page = parse_non_negative(&row.page, "Page")
        .map_err(|msg| errors.set(CitationField::Page, msg))
        .ok()
        .flatten();
    let start = parse_non_negative(&row.span_start, "Span start")
        .map_err(|msg| errors.set(CitationField::SpanStart, msg))
        .ok()
        .flatten();
    let end = parse_non_negative(&row.span_end, "Span end")
        .map_err(|msg| errors.set(CitationField::SpanEnd, msg))
        .ok()
        .flatten();

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            errors.set(CitationField::SpanStart, MSG_SPAN_START_AFTER_END);
            errors.set(CitationField::SpanEnd, MSG_SPAN_END_BEFORE_START);
        }
    }

    let text = row.span_text.trim();
    let text = if text.is_empty() {
        None
    } else if text.chars().count() > MAX_SPAN_TEXT_CHARS {
        match policy {
            SpanTextPolicy::Reject => {
                errors.set(
                    CitationField::SpanText,
                    format!("Span text must be {MAX_SPAN_TEXT_CHARS} characters or fewer."),
                );
                None
            }
            SpanTextPolicy::Truncate => Some(text.chars().take(MAX_SPAN_TEXT_CHARS).collect()),
        }
    } else {
        Some(text.to_string())
    };

    if !errors.is_empty() {
        return (None, errors);
    }

    let span = Span { start, end, text };
    let citation = Citation {
        doc_id: doc_id.to_string(),
        page,
        span: (!span.is_empty()).then_some(span),
        title: None,
    };
    (Some(citation), errors)
}

/// Parse an optional non-negative whole number.
///
/// Blank input is absent. Integral decimal notation (`"4.0"`) is accepted;
/// fractional values are an error rather than being rounded.
fn parse_non_negative(raw: &str, label: &str) -> Result<Option<u32>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(value) = trimmed.parse::<i64>() {
        if value < 0 {
            return Err(format!("{label} cannot be negative."));
        }
        return u32::try_from(value)
            .map(Some)
            .map_err(|_| format!("{label} is too large."));
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if value < 0.0 {
                Err(format!("{label} cannot be negative."))
            } else if value.fract() != 0.0 {
                Err(format!("{label} must be a whole number."))
            } else if value > f64::from(u32::MAX) {
                Err(format!("{label} is too large."))
            } else {
                Ok(Some(value as u32))
            }
        }
        _ => Err(format!("{label} must be a number.")),
    }
}
