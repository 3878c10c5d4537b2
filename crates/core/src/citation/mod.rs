//! Citation validation engine.
//!
//! Turns user-entered [`CitationRow`]s into API-ready [`Citation`]s or a
//! structured set of per-row errors. Pure logic, safe to run on every
//! keystroke and again as the pre-submit gate.

pub mod evaluator;
pub mod rows;
pub mod types;

pub use evaluator::{validate_citation_rows, validate_citation_rows_with, SpanTextPolicy};
pub use rows::{CitationField, CitationRow, RowErrors, ValidationOutcome};
pub use types::{check_citation_invariants, Citation, Span};
