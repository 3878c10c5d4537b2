use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use faqdesk_console::config::ConsoleConfig;
use faqdesk_console::orchestrator::WorkflowOrchestrator;
use faqdesk_core::citation::Citation;
use faqdesk_core::inbox::{InboxItem, InboxStatus};
use faqdesk_core::manual_faq::ManualFaqPayload;
use faqdesk_core::roles::Actor;
use faqdesk_gateway::payload::{
    ApproveRequest, ApproveResponse, AttachSourceRequest, BulkApproveRequest, BulkItemError,
    BulkRejectRequest, BulkResponse, ConvertToFaqRequest, ConvertToFaqResponse, DismissRequest,
    ListPage, ListQuery, ManualFaqResponse, NoteRequest, PromoteRequest, PromoteResponse,
    RequestReviewRequest, RequestReviewResponse,
};
use faqdesk_gateway::{ActionError, InboxApi};

type PageKey = (InboxStatus, Option<String>);

/// In-memory Inbox API for orchestrator tests.
///
/// Pages are served per `(status, cursor)`. Detail responses can be queued
/// per id with a delay so tests can make requests complete out of order.
#[derive(Default)]
pub struct FakeInboxApi {
    pages: Mutex<HashMap<PageKey, ListPage>>,
    details: Mutex<HashMap<String, VecDeque<(Duration, Result<InboxItem, ActionError>)>>>,
    failures: Mutex<HashMap<&'static str, ActionError>>,
    bulk_errors: Mutex<Vec<String>>,
    queries: Mutex<Vec<ListQuery>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeInboxApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_page(
        &self,
        status: InboxStatus,
        cursor: Option<&str>,
        items: Vec<InboxItem>,
        next: Option<&str>,
    ) {
        self.pages.lock().unwrap().insert(
            (status, cursor.map(str::to_string)),
            ListPage {
                items,
                next_cursor: next.map(str::to_string),
            },
        );
    }

    pub fn queue_detail(&self, id: &str, delay: Duration, result: Result<InboxItem, ActionError>) {
        self.details
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back((delay, result));
    }

    pub fn fail(&self, method: &'static str, error: ActionError) {
        self.failures.lock().unwrap().insert(method, error);
    }

    pub fn fail_bulk_ids(&self, ids: &[&str]) {
        *self.bulk_errors.lock().unwrap() = ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| **m == method).count()
    }

    pub fn queries(&self) -> Vec<ListQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str) -> Result<(), ActionError> {
        self.calls.lock().unwrap().push(method);
        match self.failures.lock().unwrap().get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn bulk_response(&self) -> BulkResponse {
        BulkResponse {
            errors: self
                .bulk_errors
                .lock()
                .unwrap()
                .iter()
                .map(|id| BulkItemError {
                    id: id.clone(),
                    message: None,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl InboxApi for FakeInboxApi {
    async fn list(&self, query: &ListQuery) -> Result<ListPage, ActionError> {
        self.record("list")?;
        self.queries.lock().unwrap().push(query.clone());
        let key = (query.status, query.cursor.clone());
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(ListPage {
                items: Vec::new(),
                next_cursor: None,
            }))
    }

    async fn get(&self, id: &str) -> Result<InboxItem, ActionError> {
        self.record("get")?;
        let queued = self
            .details
            .lock()
            .unwrap()
            .get_mut(id)
            .and_then(VecDeque::pop_front);
        match queued {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Err(ActionError::NotFound {
                message: format!("Inbox item {id} not found"),
            }),
        }
    }

    async fn attach_source(
        &self,
        id: &str,
        body: &AttachSourceRequest,
    ) -> Result<InboxItem, ActionError> {
        self.record("attach_source")?;
        let mut item = pending(id);
        item.suggested_citations = body.citations.clone();
        Ok(item)
    }

    async fn approve(&self, _id: &str, _body: &ApproveRequest) -> Result<ApproveResponse, ActionError> {
        self.record("approve")?;
        Ok(ApproveResponse::default())
    }

    async fn promote(&self, id: &str, _body: &PromoteRequest) -> Result<PromoteResponse, ActionError> {
        self.record("promote")?;
        Ok(PromoteResponse {
            qa_pair_id: format!("qa-{id}"),
            published_at: None,
        })
    }

    async fn convert_to_faq(
        &self,
        _id: &str,
        _body: &ConvertToFaqRequest,
    ) -> Result<ConvertToFaqResponse, ActionError> {
        self.record("convert_to_faq")?;
        Ok(ConvertToFaqResponse::default())
    }

    async fn reject(&self, _id: &str, _body: &NoteRequest) -> Result<(), ActionError> {
        self.record("reject")
    }

    async fn mark_reviewed(&self, _id: &str, _body: &NoteRequest) -> Result<(), ActionError> {
        self.record("mark_reviewed")
    }

    async fn dismiss(&self, _id: &str, _body: &DismissRequest) -> Result<(), ActionError> {
        self.record("dismiss")
    }

    async fn request_review(
        &self,
        _id: &str,
        body: &RequestReviewRequest,
    ) -> Result<RequestReviewResponse, ActionError> {
        self.record("request_review")?;
        Ok(RequestReviewResponse {
            assigned_to: body.assignees.clone(),
            status: InboxStatus::NeedsReview,
        })
    }

    async fn bulk_approve(&self, _body: &BulkApproveRequest) -> Result<BulkResponse, ActionError> {
        self.record("bulk_approve")?;
        Ok(self.bulk_response())
    }

    async fn bulk_reject(&self, _body: &BulkRejectRequest) -> Result<BulkResponse, ActionError> {
        self.record("bulk_reject")?;
        Ok(self.bulk_response())
    }

    async fn create_manual_faq(
        &self,
        _body: &ManualFaqPayload,
    ) -> Result<ManualFaqResponse, ActionError> {
        self.record("create_manual_faq")?;
        Ok(ManualFaqResponse {
            qa_pair_id: "qa-manual".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn pending(id: &str) -> InboxItem {
    let mut item = InboxItem::new(id, format!("Question {id}?"));
    item.suggested_citations.push(Citation::new(format!("doc-{id}")));
    item
}

pub fn needs_review(id: &str) -> InboxItem {
    let mut item = pending(id);
    item.status = InboxStatus::NeedsReview;
    item
}

pub fn curator() -> Actor {
    Actor::new("u-curator", "curator")
}

/// Orchestrator over `api`, acting as a curator with default settings.
pub fn orchestrator(api: &Arc<FakeInboxApi>) -> Arc<WorkflowOrchestrator> {
    let api: Arc<dyn InboxApi> = api.clone();
    Arc::new(WorkflowOrchestrator::new(
        api,
        curator(),
        &ConsoleConfig::default(),
    ))
}

/// Serve `ids` as the first pending page and load it.
pub async fn loaded(ids: &[&str]) -> (Arc<FakeInboxApi>, Arc<WorkflowOrchestrator>) {
    let api = FakeInboxApi::new();
    api.set_page(
        InboxStatus::Pending,
        None,
        ids.iter().map(|id| pending(id)).collect(),
        None,
    );
    let orchestrator = orchestrator(&api);
    orchestrator.refresh().await.unwrap();
    (api, orchestrator)
}
