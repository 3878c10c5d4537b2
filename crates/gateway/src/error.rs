//! The canonical action error and Inbox API error-envelope normalization.
//!
//! Every failed HTTP response passes through [`ActionError::from_response`]
//! exactly once. Nothing downstream inspects raw bodies.

use std::sync::LazyLock;

use faqdesk_core::citation::{CitationField, RowErrors};
use faqdesk_core::error::CoreError;
use regex::Regex;
use serde_json::Value;

/// Fixed explanation shown when an action is not permitted.
pub const PERMISSION_EXPLANATION: &str =
    "You don't have permission to act on this item. Only assigned reviewers or an admin can.";

/// Body keys that may carry the id of the resource a conflict collided with.
const CONFLICT_ID_KEYS: &[&str] = &[
    "conflicting_id",
    "existing_id",
    "existing_qa_pair_id",
    "qa_pair_id",
    "faq_id",
];

/// `citations[1].doc_id`, `citations.1.span.start`, `body.citations.0.page`.
static CITATION_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:body\.)?citations?(?:\[(\d+)\]|\.(\d+))\.?(.*)$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A server-reported field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    /// Position of the offending element in the submitted list, if any.
    pub index: Option<usize>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, index: Option<usize>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            index,
        }
    }

    /// Resolve the citation index and leaf field name this error refers to.
    ///
    /// An explicit `index` wins over one embedded in the field path.
    pub fn citation_location(&self) -> (Option<usize>, String) {
        match CITATION_PATH_RE.captures(&self.field) {
            Some(caps) => {
                let embedded = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .and_then(|m| m.as_str().parse().ok());
                let leaf = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
                (self.index.or(embedded), leaf.to_string())
            }
            None => (self.index, self.field.clone()),
        }
    }
}

/// Error class, for callers that branch on kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Permission,
    Conflict,
    NotFound,
    Failure,
}

/// Uniform failure of any workflow action.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    /// Client-side pre-check or server 400/422. Fixable by editing input.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// 401/403. Not fixable by editing input.
    #[error("Permission denied ({status}): {message}")]
    Permission { status: u16, message: String },

    /// 409. The item was already processed elsewhere.
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        conflicting_id: Option<String>,
    },

    /// 404. The item disappeared.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Transport failure or any other status. Retryable.
    #[error("Request failed: {message}")]
    Failure { status: Option<u16>, message: String },
}

impl ActionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Permission { .. } => ErrorKind::Permission,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Failure { .. } => ErrorKind::Failure,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn conflicting_id(&self) -> Option<&str> {
        match self {
            Self::Conflict { conflicting_id, .. } => conflicting_id.as_deref(),
            _ => None,
        }
    }

    /// Text to show the user. Permission errors always use the fixed
    /// explanation.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Permission { .. } => PERMISSION_EXPLANATION.to_string(),
            Self::Conflict {
                message,
                conflicting_id: Some(id),
            } => format!("{message} (conflicts with {id})"),
            Self::Conflict { message, .. } => message.clone(),
            Self::NotFound { message } => message.clone(),
            Self::Failure { message, .. } => message.clone(),
        }
    }

    /// Classify a non-success HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let envelope = Envelope::parse(body);
        let message = envelope
            .message
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            400 | 422 => Self::Validation {
                message,
                fields: envelope.fields,
            },
            401 | 403 => Self::Permission { status, message },
            404 => Self::NotFound { message },
            409 => Self::Conflict {
                message,
                conflicting_id: envelope.conflicting_id,
            },
            _ => Self::Failure {
                status: Some(status),
                message,
            },
        }
    }

    /// Rewrite citation indices from "position in the submitted list" to
    /// "position in the editor", using the row each citation came from.
    pub fn remap_citation_indices(self, citation_rows: &[usize]) -> Self {
        match self {
            Self::Validation { message, fields } => Self::Validation {
                message,
                fields: fields
                    .into_iter()
                    .map(|f| {
                        let (index, leaf) = f.citation_location();
                        match index.and_then(|i| citation_rows.get(i)) {
                            Some(row) => FieldError::new(leaf, f.message, Some(*row)),
                            None => f,
                        }
                    })
                    .collect(),
            },
            other => other,
        }
    }

    /// Project field errors onto `row_count` editor rows. Errors without a
    /// resolvable row or field are left out.
    pub fn row_errors(&self, row_count: usize) -> Vec<RowErrors> {
        let mut rows = vec![RowErrors::default(); row_count];
        if let Self::Validation { fields, .. } = self {
            for field_error in fields {
                let (index, leaf) = field_error.citation_location();
                let Some(index) = index.filter(|i| *i < row_count) else {
                    continue;
                };
                if let Some(field) = CitationField::from_api_name(&leaf) {
                    rows[index].set(field, field_error.message.clone());
                }
            }
        }
        rows
    }
}

impl From<CoreError> for ActionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => Self::validation(message),
            CoreError::Forbidden(message) => Self::Permission {
                status: 403,
                message,
            },
            CoreError::Conflict(message) => Self::Conflict {
                message,
                conflicting_id: None,
            },
            CoreError::NotFound { entity, id } => Self::NotFound {
                message: format!("{entity} with id {id} not found"),
            },
            CoreError::Internal(message) => Self::Failure {
                status: None,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ActionError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_decode() {
            format!("Unexpected response from the Inbox API: {err}")
        } else {
            format!("Could not reach the Inbox API: {err}")
        };
        Self::Failure {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 | 422 => "The request was invalid",
        401 => "Authentication required",
        403 => "Permission denied",
        404 => "Item not found",
        409 => "This item was already processed",
        500..=599 => "The Inbox API is unavailable",
        _ => "Unexpected response from the Inbox API",
    }
}

// ---------------------------------------------------------------------------
// Envelope parsing
// ---------------------------------------------------------------------------

/// What can be recovered from an error body, whatever its shape.
#[derive(Debug, Default)]
struct Envelope {
    message: Option<String>,
    fields: Vec<FieldError>,
    conflicting_id: Option<String>,
}

impl Envelope {
    /// Understands:
    /// - structured `{"detail": {"error": {"code", "message", "fields": [...]}}}`
    /// - flat `{"error": "...", "details": ...}`
    /// - `{"detail": "..."}` and `{"detail": [{"loc": [...], "msg": "..."}]}`
    /// - `{"message": "..."}`
    /// - any non-JSON body, used verbatim as the message
    fn parse(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
            return Self {
                message: Some(trimmed.to_string()),
                ..Default::default()
            };
        };

        let mut envelope = Self::default();

        match value.get("detail") {
            Some(Value::Object(detail)) => {
                if let Some(error) = detail.get("error") {
                    envelope.absorb_structured(error);
                } else {
                    envelope.absorb_structured(&Value::Object(detail.clone()));
                }
            }
            Some(Value::String(detail)) => envelope.message = Some(detail.clone()),
            Some(Value::Array(items)) => envelope.fields.extend(items.iter().filter_map(parse_field)),
            _ => {}
        }

        if envelope.message.is_none() {
            envelope.message = value
                .get("error")
                .and_then(message_of)
                .or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string));
        }

        match value.get("details") {
            Some(Value::String(details)) if envelope.message.is_none() => {
                envelope.message = Some(details.clone());
            }
            Some(Value::Array(items)) => envelope.fields.extend(items.iter().filter_map(parse_field)),
            Some(details @ Value::Object(map)) => {
                if let Some(Value::Array(items)) = map.get("fields") {
                    envelope.fields.extend(items.iter().filter_map(parse_field));
                } else {
                    envelope.fields.extend(map.iter().filter_map(|(field, message)| {
                        message
                            .as_str()
                            .map(|m| FieldError::new(field.clone(), m, None))
                    }));
                }
                envelope.conflicting_id = envelope.conflicting_id.take().or_else(|| conflict_id(details));
            }
            _ => {}
        }

        if envelope.conflicting_id.is_none() {
            envelope.conflicting_id = conflict_id(&value);
        }
        if envelope.message.is_none() && !envelope.fields.is_empty() {
            envelope.message = Some(
                envelope
                    .fields
                    .iter()
                    .map(|f| f.message.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }

        envelope
    }

    fn absorb_structured(&mut self, error: &Value) {
        if let Some(message) = message_of(error) {
            self.message = Some(message);
        }
        if let Some(Value::Array(items)) = error.get("fields") {
            self.fields.extend(items.iter().filter_map(parse_field));
        }
        if let Some(id) = conflict_id(error) {
            self.conflicting_id = Some(id);
        } else if let Some(id) = error.get("details").and_then(conflict_id) {
            self.conflicting_id = Some(id);
        }
    }
}

/// A message is either the value itself (string) or its `message` key.
fn message_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn conflict_id(value: &Value) -> Option<String> {
    CONFLICT_ID_KEYS.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts `{field, message, index?}` and FastAPI-style `{loc, msg}`.
fn parse_field(value: &Value) -> Option<FieldError> {
    let message = value
        .get("message")
        .or_else(|| value.get("msg"))
        .and_then(Value::as_str)?
        .to_string();

    let field = match (value.get("field"), value.get("loc")) {
        (Some(Value::String(field)), _) => field.clone(),
        (_, Some(Value::Array(parts))) => parts
            .iter()
            .map(|p| match p {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("."),
        _ => String::new(),
    };

    let index = value
        .get("index")
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok());

    Some(FieldError::new(field, message, index))
}
