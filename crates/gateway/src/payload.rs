//! Request and response bodies for the Inbox API.
//!
//! Each action has its own body type; they are deliberately not shared.

use faqdesk_core::citation::Citation;
use faqdesk_core::inbox::{Assignee, InboxItem, InboxStatus, ItemSource};
use faqdesk_core::types::{ItemId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Maximum page size the Inbox API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// User-selected list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub search: Option<String>,
    pub source: Option<ItemSource>,
    pub assignee_id: Option<String>,
    pub tag: Option<String>,
}

impl ListFilters {
    /// Trim text filters and drop the empty ones.
    pub fn normalized(&self) -> Self {
        let clean = |s: &Option<String>| {
            s.as_ref()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            search: clean(&self.search),
            source: self.source,
            assignee_id: clean(&self.assignee_id),
            tag: clean(&self.tag),
        }
    }
}

/// One page request for one status bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub status: InboxStatus,
    pub cursor: Option<String>,
    pub limit: u32,
    pub filters: ListFilters,
}

impl ListQuery {
    pub fn first_page(status: InboxStatus, limit: u32, filters: ListFilters) -> Self {
        Self {
            status,
            cursor: None,
            limit,
            filters,
        }
    }

    /// Query-string pairs, omitting unset filters.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let filters = self.filters.normalized();
        let mut params = vec![
            ("status", self.status.as_str().to_string()),
            ("limit", self.limit.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(cursor) = &self.cursor {
            params.push(("cursor", cursor.clone()));
        }
        if let Some(search) = filters.search {
            params.push(("q", search));
        }
        if let Some(source) = filters.source {
            params.push(("source", source.as_str().to_string()));
        }
        if let Some(assignee) = filters.assignee_id {
            params.push(("assigned_to", assignee));
        }
        if let Some(tag) = filters.tag {
            params.push(("tag", tag));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub items: Vec<InboxItem>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Single-item actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachSourceRequest {
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproveRequest {
    pub reembed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApproveResponse {
    #[serde(default)]
    pub qa_pair_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub is_faq: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromoteResponse {
    pub qa_pair_id: String,
    #[serde(default)]
    pub published_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertToFaqRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConvertToFaqResponse {
    #[serde(default)]
    pub qa_pair_id: Option<String>,
}

/// Body for `reject` and `mark_reviewed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DismissRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestReviewRequest {
    pub reason: String,
    pub assignees: Vec<Assignee>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestReviewResponse {
    #[serde(default)]
    pub assigned_to: Vec<Assignee>,
    pub status: InboxStatus,
}

// ---------------------------------------------------------------------------
// Bulk actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkApproveRequest {
    pub ids: Vec<ItemId>,
    pub as_faq: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkRejectRequest {
    pub ids: Vec<ItemId>,
}

/// A per-id failure inside an otherwise accepted bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemError {
    pub id: ItemId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BulkResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<BulkItemError>,
}

/// `null` and a missing field both decode as an empty list.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Manual FAQ creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManualFaqResponse {
    pub qa_pair_id: String,
}
