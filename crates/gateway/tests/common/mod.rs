use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use faqdesk_core::inbox::{Assignee, InboxItem, InboxStatus, ItemSource};
use faqdesk_core::manual_faq::ManualFaqPayload;
use faqdesk_core::roles::Actor;
use faqdesk_gateway::payload::{
    ApproveRequest, ApproveResponse, AttachSourceRequest, BulkApproveRequest, BulkItemError,
    BulkRejectRequest, BulkResponse, ConvertToFaqRequest, ConvertToFaqResponse, DismissRequest,
    ListPage, ListQuery, ManualFaqResponse, NoteRequest, PromoteRequest, PromoteResponse,
    RequestReviewRequest, RequestReviewResponse,
};
use faqdesk_gateway::{ActionError, InboxApi};

/// One recorded request against the fake.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub id: Option<String>,
    pub body: serde_json::Value,
}

/// In-memory [`InboxApi`] that records every call.
///
/// Items registered with [`FakeInboxApi::insert`] are served by `get` and
/// echoed back by `attach_source`. A failure registered with
/// [`FakeInboxApi::fail`] is returned by every call to that method.
#[derive(Default)]
pub struct FakeInboxApi {
    items: Mutex<HashMap<String, InboxItem>>,
    failures: Mutex<HashMap<&'static str, ActionError>>,
    bulk_errors: Mutex<Vec<BulkItemError>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeInboxApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, item: InboxItem) {
        self.items.lock().unwrap().insert(item.id.clone(), item);
    }

    pub fn fail(&self, method: &'static str, error: ActionError) {
        self.failures.lock().unwrap().insert(method, error);
    }

    pub fn fail_bulk_ids(&self, ids: &[&str]) {
        *self.bulk_errors.lock().unwrap() = ids
            .iter()
            .map(|id| BulkItemError {
                id: id.to_string(),
                message: Some("locked".into()),
            })
            .collect();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn last_body(&self, method: &str) -> Option<serde_json::Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.method == method)
            .map(|c| c.body)
    }

    fn record<B: Serialize>(
        &self,
        method: &'static str,
        id: Option<&str>,
        body: &B,
    ) -> Result<(), ActionError> {
        self.calls.lock().unwrap().push(Call {
            method,
            id: id.map(str::to_string),
            body: serde_json::to_value(body).unwrap(),
        });
        match self.failures.lock().unwrap().get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn stored(&self, id: &str) -> Result<InboxItem, ActionError> {
        self.items
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ActionError::NotFound {
                message: format!("Inbox item {id} not found"),
            })
    }
}

#[async_trait]
impl InboxApi for FakeInboxApi {
    async fn list(&self, query: &ListQuery) -> Result<ListPage, ActionError> {
        self.record("list", None, &query.to_params())?;
        let items = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.status == query.status)
            .cloned()
            .collect();
        Ok(ListPage {
            items,
            next_cursor: None,
        })
    }

    async fn get(&self, id: &str) -> Result<InboxItem, ActionError> {
        self.record("get", Some(id), &())?;
        self.stored(id)
    }

    async fn attach_source(
        &self,
        id: &str,
        body: &AttachSourceRequest,
    ) -> Result<InboxItem, ActionError> {
        self.record("attach_source", Some(id), body)?;
        let mut item = self.stored(id)?;
        item.suggested_citations = body.citations.clone();
        self.insert(item.clone());
        Ok(item)
    }

    async fn approve(&self, id: &str, body: &ApproveRequest) -> Result<ApproveResponse, ActionError> {
        self.record("approve", Some(id), body)?;
        Ok(ApproveResponse::default())
    }

    async fn promote(&self, id: &str, body: &PromoteRequest) -> Result<PromoteResponse, ActionError> {
        self.record("promote", Some(id), body)?;
        Ok(PromoteResponse {
            qa_pair_id: format!("qa-{id}"),
            published_at: None,
        })
    }

    async fn convert_to_faq(
        &self,
        id: &str,
        body: &ConvertToFaqRequest,
    ) -> Result<ConvertToFaqResponse, ActionError> {
        self.record("convert_to_faq", Some(id), body)?;
        Ok(ConvertToFaqResponse {
            qa_pair_id: Some(format!("qa-{id}")),
        })
    }

    async fn reject(&self, id: &str, body: &NoteRequest) -> Result<(), ActionError> {
        self.record("reject", Some(id), body)
    }

    async fn mark_reviewed(&self, id: &str, body: &NoteRequest) -> Result<(), ActionError> {
        self.record("mark_reviewed", Some(id), body)
    }

    async fn dismiss(&self, id: &str, body: &DismissRequest) -> Result<(), ActionError> {
        self.record("dismiss", Some(id), body)
    }

    async fn request_review(
        &self,
        id: &str,
        body: &RequestReviewRequest,
    ) -> Result<RequestReviewResponse, ActionError> {
        self.record("request_review", Some(id), body)?;
        if let Ok(mut item) = self.stored(id) {
            item.status = InboxStatus::NeedsReview;
            item.assigned_to = body.assignees.clone();
            item.assignment_reason = Some(body.reason.clone());
            self.insert(item);
        }
        Ok(RequestReviewResponse {
            assigned_to: body.assignees.clone(),
            status: InboxStatus::NeedsReview,
        })
    }

    async fn bulk_approve(&self, body: &BulkApproveRequest) -> Result<BulkResponse, ActionError> {
        self.record("bulk_approve", None, body)?;
        Ok(BulkResponse {
            errors: self.bulk_errors.lock().unwrap().clone(),
        })
    }

    async fn bulk_reject(&self, body: &BulkRejectRequest) -> Result<BulkResponse, ActionError> {
        self.record("bulk_reject", None, body)?;
        Ok(BulkResponse {
            errors: self.bulk_errors.lock().unwrap().clone(),
        })
    }

    async fn create_manual_faq(
        &self,
        body: &ManualFaqPayload,
    ) -> Result<ManualFaqResponse, ActionError> {
        self.record("create_manual_faq", None, body)?;
        Ok(ManualFaqResponse {
            qa_pair_id: "qa-manual".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn curator() -> Actor {
    Actor::new("u-curator", "curator")
}

pub fn pending(id: &str) -> InboxItem {
    let mut item = InboxItem::new(id, format!("Question {id}?"));
    item.answer_draft = Some("Draft answer".into());
    item
}

pub fn review_item(id: &str, assignee: &str) -> InboxItem {
    let mut item = pending(id);
    item.source = ItemSource::AdminReview;
    item.status = InboxStatus::NeedsReview;
    item.assigned_to.push(sme(assignee));
    item
}

pub fn sme(id: &str) -> Assignee {
    Assignee {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        display_name: None,
        role: Some("sme".into()),
    }
}
