//! Inbox item state machine and the ownership rule.
//!
//! `pending` / `needs_review` are the only working states. Every other
//! status is terminal and absorbing. Each action is one atomic remote call;
//! the checks here decide whether the call may be issued at all.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::inbox::{InboxItem, InboxStatus, ItemSource};
use crate::roles::Actor;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A workflow action a curator can take on an inbox item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxAction {
    AttachSource,
    RequestReview,
    Approve,
    Promote,
    ConvertToFaq,
    Reject,
    MarkReviewed,
    Dismiss,
}

/// Every action, in the order the console offers them.
pub const ALL_ACTIONS: &[InboxAction] = &[
    InboxAction::AttachSource,
    InboxAction::RequestReview,
    InboxAction::Approve,
    InboxAction::Promote,
    InboxAction::ConvertToFaq,
    InboxAction::Reject,
    InboxAction::MarkReviewed,
    InboxAction::Dismiss,
];

impl InboxAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AttachSource => "attach_source",
            Self::RequestReview => "request_review",
            Self::Approve => "approve",
            Self::Promote => "promote",
            Self::ConvertToFaq => "convert_to_faq",
            Self::Reject => "reject",
            Self::MarkReviewed => "mark_reviewed",
            Self::Dismiss => "dismiss",
        }
    }

    /// Status the item holds after the action succeeds. `None` means the
    /// status is unchanged.
    pub fn target_status(self) -> Option<InboxStatus> {
        match self {
            Self::AttachSource => None,
            Self::RequestReview => Some(InboxStatus::NeedsReview),
            Self::Approve => Some(InboxStatus::Approved),
            Self::Promote | Self::ConvertToFaq => Some(InboxStatus::Promoted),
            Self::Reject => Some(InboxStatus::Rejected),
            Self::MarkReviewed => Some(InboxStatus::Reviewed),
            Self::Dismiss => Some(InboxStatus::Dismissed),
        }
    }

    /// Whether success moves the item out of the active listing.
    pub fn is_terminal(self) -> bool {
        self.target_status().is_some_and(InboxStatus::is_terminal)
    }

    /// Actions that create a knowledge-base entry.
    pub fn requires_faq(self) -> bool {
        matches!(self, Self::Promote | Self::ConvertToFaq)
    }

    /// Whether the action belongs to the action set for `source`.
    pub fn is_offered_for(self, source: ItemSource) -> bool {
        match self {
            Self::MarkReviewed | Self::Dismiss | Self::ConvertToFaq => source.is_review_request(),
            Self::RequestReview | Self::Promote => !source.is_review_request(),
            Self::AttachSource | Self::Approve | Self::Reject => true,
        }
    }
}

impl fmt::Display for InboxAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Outcome of a transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Issue the remote call; the item ends up in this status.
    Apply(InboxStatus),
    /// The item already holds the action's terminal status. Nothing to do.
    AlreadyApplied,
}

/// Check whether `action` may run on an item currently in `status`.
pub fn check_transition(status: InboxStatus, action: InboxAction) -> Result<Transition, CoreError> {
    if status.is_terminal() {
        if action.target_status() == Some(status) {
            return Ok(Transition::AlreadyApplied);
        }
        return Err(CoreError::Conflict(format!(
            "Item is already {status}; no further actions are available"
        )));
    }

    match action {
        InboxAction::RequestReview if status != InboxStatus::Pending => Err(CoreError::Conflict(
            "Review can only be requested for pending items".to_string(),
        )),
        InboxAction::AttachSource => Ok(Transition::Apply(status)),
        other => Ok(Transition::Apply(other.target_status().unwrap_or(status))),
    }
}

/// Enforce the ownership rule.
///
/// Unassigned items accept any curating role. Assigned items accept only a
/// listed assignee or an owner/admin.
pub fn check_ownership(item: &InboxItem, actor: &Actor) -> Result<(), CoreError> {
    if !item.is_assigned() {
        if actor.can_curate() {
            return Ok(());
        }
        return Err(CoreError::Forbidden(format!(
            "Role '{}' cannot run workflow actions",
            actor.role
        )));
    }

    if item.is_assignee(&actor.id) || actor.is_privileged() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only assigned reviewers or an admin can act on this item".to_string(),
        ))
    }
}

/// Full client-side gate for one action: feature flag, source action set,
/// ownership, assignment state, then the status transition.
pub fn authorize(
    item: &InboxItem,
    actor: &Actor,
    action: InboxAction,
    faq_enabled: bool,
) -> Result<Transition, CoreError> {
    if action.requires_faq() && !faq_enabled {
        return Err(CoreError::Validation("FAQ creation is disabled".to_string()));
    }
    if !action.is_offered_for(item.source) {
        return Err(CoreError::Validation(format!(
            "Action '{action}' is not available for {} items",
            item.source
        )));
    }

    check_ownership(item, actor)?;

    if action == InboxAction::RequestReview && item.is_assigned() {
        return Err(CoreError::Conflict(
            "Item is already assigned; use reassignment instead".to_string(),
        ));
    }

    check_transition(item.status, action)
}

/// Actions the console offers `actor` for `item`.
pub fn available_actions(item: &InboxItem, actor: &Actor, faq_enabled: bool) -> Vec<InboxAction> {
    ALL_ACTIONS
        .iter()
        .copied()
        .filter(|action| {
            matches!(
                authorize(item, actor, *action, faq_enabled),
                Ok(Transition::Apply(_))
            )
        })
        .collect()
}

/// User-facing confirmation for a completed action.
///
/// Items carrying a requester get the variant mentioning the notification
/// the Inbox API sends on terminal actions.
pub fn success_message(action: InboxAction, notify_requester: bool) -> String {
    let base = match action {
        InboxAction::AttachSource => "Sources attached.",
        InboxAction::RequestReview => "Review requested.",
        InboxAction::Approve => "Item approved.",
        InboxAction::Promote | InboxAction::ConvertToFaq => "Item published to the FAQ.",
        InboxAction::Reject => "Item rejected.",
        InboxAction::MarkReviewed => "Item marked as reviewed.",
        InboxAction::Dismiss => "Item dismissed.",
    };
    if notify_requester && action.is_terminal() {
        format!("{base} The requester will be notified.")
    } else {
        base.to_string()
    }
}
