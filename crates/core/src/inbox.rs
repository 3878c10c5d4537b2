//! Inbox item model: statuses, source classification, assignment and
//! requester identity.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::citation::Citation;
use crate::error::CoreError;
use crate::types::{ItemId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of an inbox item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxStatus {
    Pending,
    NeedsReview,
    Approved,
    Rejected,
    Promoted,
    Reviewed,
    Dismissed,
}

/// Statuses that appear in the active inbox listing.
pub const ACTIVE_STATUSES: &[InboxStatus] = &[InboxStatus::Pending, InboxStatus::NeedsReview];

impl InboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::NeedsReview => "needs_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Promoted => "promoted",
            Self::Reviewed => "reviewed",
            Self::Dismissed => "dismissed",
        }
    }

    /// Terminal statuses are absorbing: no client action leaves them.
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    pub fn is_active(self) -> bool {
        ACTIVE_STATUSES.contains(&self)
    }
}

impl fmt::Display for InboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InboxStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "needs_review" => Ok(Self::NeedsReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "promoted" => Ok(Self::Promoted),
            "reviewed" => Ok(Self::Reviewed),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(CoreError::Validation(format!(
                "Invalid inbox status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Where an inbox item came from. Changes which actions are offered, never
/// which validation rules apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    #[default]
    Generated,
    Manual,
    AdminReview,
    LiveReview,
}

impl ItemSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Manual => "manual",
            Self::AdminReview => "admin_review",
            Self::LiveReview => "live_review",
        }
    }

    /// Review requests (admin-initiated or from a live session) get the
    /// mark-reviewed / dismiss action set.
    pub fn is_review_request(self) -> bool {
        matches!(self, Self::AdminReview | Self::LiveReview)
    }
}

impl fmt::Display for ItemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Assignment / requester
// ---------------------------------------------------------------------------

/// A subject-matter expert an item has been routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Whoever triggered a review request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Internal { actor_id: String },
    External { email: String },
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A candidate question/answer pair awaiting curation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxItem {
    pub id: ItemId,
    pub question: String,
    #[serde(default)]
    pub answer_draft: Option<String>,
    #[serde(default)]
    pub answer_final: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub pii_flags: Vec<String>,
    pub status: InboxStatus,
    #[serde(default)]
    pub source: ItemSource,
    #[serde(default)]
    pub assigned_to: Vec<Assignee>,
    #[serde(default)]
    pub assignment_reason: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<Timestamp>,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub requester_email: Option<String>,
    #[serde(default)]
    pub suggested_citations: Vec<Citation>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl InboxItem {
    /// Minimal pending item, mainly for fixtures and optimistic placeholders.
    pub fn new(id: impl Into<ItemId>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer_draft: None,
            answer_final: None,
            tags: BTreeSet::new(),
            pii_flags: Vec::new(),
            status: InboxStatus::Pending,
            source: ItemSource::Generated,
            assigned_to: Vec::new(),
            assignment_reason: None,
            assigned_at: None,
            requested_by: None,
            requester_email: None,
            suggested_citations: Vec::new(),
            created_at: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.assigned_to.is_empty()
    }

    pub fn is_assignee(&self, actor_id: &str) -> bool {
        self.assigned_to.iter().any(|a| a.id == actor_id)
    }

    /// Requester identity, preferring the internal actor id.
    pub fn requester(&self) -> Option<Requester> {
        let non_blank = |s: &Option<String>| s.as_ref().filter(|v| !v.trim().is_empty()).cloned();
        if let Some(actor_id) = non_blank(&self.requested_by) {
            return Some(Requester::Internal { actor_id });
        }
        non_blank(&self.requester_email).map(|email| Requester::External { email })
    }

    pub fn has_requester(&self) -> bool {
        self.requester().is_some()
    }

    /// The final answer when set, else the draft.
    pub fn effective_answer(&self) -> Option<&str> {
        [self.answer_final.as_deref(), self.answer_draft.as_deref()]
            .into_iter()
            .flatten()
            .find(|a| !a.trim().is_empty())
    }

    pub fn has_pii(&self) -> bool {
        !self.pii_flags.is_empty()
    }
}
