//! SME review request form.

use std::collections::HashSet;

use validator::Validate;

use crate::error::CoreError;
use crate::inbox::Assignee;

/// Minimum length of a review request reason, in characters.
pub const MIN_REASON_LENGTH: usize = 20;

/// Maximum length of a review request reason, in characters.
pub const MAX_REASON_LENGTH: usize = 500;

/// A review request ready for submission. Build with [`ReviewRequestForm::new`]
/// so the reason is trimmed and assignees are de-duplicated.
#[derive(Debug, Clone, Validate)]
pub struct ReviewRequestForm {
    #[validate(length(
        min = 20,
        max = 500,
        message = "Reason must be between 20 and 500 characters."
    ))]
    pub reason: String,

    #[validate(length(min = 1, message = "Select at least one reviewer."))]
    pub assignees: Vec<Assignee>,
}

impl ReviewRequestForm {
    pub fn new(reason: &str, assignees: Vec<Assignee>) -> Self {
        let mut seen = HashSet::new();
        let assignees = assignees
            .into_iter()
            .filter(|a| seen.insert(a.id.clone()))
            .collect();
        Self {
            reason: reason.trim().to_string(),
            assignees,
        }
    }

    /// Validate the form, collapsing all messages into one
    /// [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(|errors| {
            let mut messages: Vec<(String, String)> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errs)| {
                    let field = field.to_string();
                    errs.iter()
                        .map(|e| {
                            let message = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("Invalid {field}"));
                            (field.clone(), message)
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
            messages.sort();
            CoreError::Validation(
                messages
                    .into_iter()
                    .map(|(_, m)| m)
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        })
    }
}
