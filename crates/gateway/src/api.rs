//! The Inbox API seam.
//!
//! [`HttpInboxApi`](crate::http::HttpInboxApi) is the production
//! implementation; tests substitute an in-memory fake.

use async_trait::async_trait;
use faqdesk_core::inbox::InboxItem;
use faqdesk_core::manual_faq::ManualFaqPayload;

use crate::error::ActionError;
use crate::payload::{
    ApproveRequest, ApproveResponse, AttachSourceRequest, BulkApproveRequest, BulkRejectRequest,
    BulkResponse, ConvertToFaqRequest, ConvertToFaqResponse, DismissRequest, ListPage, ListQuery,
    ManualFaqResponse, NoteRequest, PromoteRequest, PromoteResponse, RequestReviewRequest,
    RequestReviewResponse,
};

/// Remote source of truth for inbox items.
///
/// Every method is one request. Failures are already normalized into
/// [`ActionError`].
#[async_trait]
pub trait InboxApi: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<ListPage, ActionError>;

    async fn get(&self, id: &str) -> Result<InboxItem, ActionError>;

    async fn attach_source(
        &self,
        id: &str,
        body: &AttachSourceRequest,
    ) -> Result<InboxItem, ActionError>;

    async fn approve(&self, id: &str, body: &ApproveRequest)
        -> Result<ApproveResponse, ActionError>;

    async fn promote(&self, id: &str, body: &PromoteRequest)
        -> Result<PromoteResponse, ActionError>;

    async fn convert_to_faq(
        &self,
        id: &str,
        body: &ConvertToFaqRequest,
    ) -> Result<ConvertToFaqResponse, ActionError>;

    async fn reject(&self, id: &str, body: &NoteRequest) -> Result<(), ActionError>;

    async fn mark_reviewed(&self, id: &str, body: &NoteRequest) -> Result<(), ActionError>;

    async fn dismiss(&self, id: &str, body: &DismissRequest) -> Result<(), ActionError>;

    async fn request_review(
        &self,
        id: &str,
        body: &RequestReviewRequest,
    ) -> Result<RequestReviewResponse, ActionError>;

    async fn bulk_approve(&self, body: &BulkApproveRequest) -> Result<BulkResponse, ActionError>;

    async fn bulk_reject(&self, body: &BulkRejectRequest) -> Result<BulkResponse, ActionError>;

    async fn create_manual_faq(
        &self,
        body: &ManualFaqPayload,
    ) -> Result<ManualFaqResponse, ActionError>;
}
