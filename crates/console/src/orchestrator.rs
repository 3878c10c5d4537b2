//! Workflow orchestrator.
//!
//! Owns the [`ListSynchronizer`] and routes every list load, detail load and
//! action result through it. Responses are fenced: a list response that was
//! overtaken by a newer refresh, or a detail response overtaken by a newer
//! load of the same id, is discarded.

use std::sync::Arc;
use std::time::Duration;

use faqdesk_core::citation::CitationRow;
use faqdesk_core::draft::{draft_key, DraftStore, SCOPE_MANUAL_FAQ};
use faqdesk_core::inbox::{InboxItem, InboxStatus, ACTIVE_STATUSES};
use faqdesk_core::manual_faq::ManualFaqInput;
use faqdesk_core::review_request::ReviewRequestForm;
use faqdesk_core::roles::Actor;
use faqdesk_core::types::ItemId;
use faqdesk_core::workflow::{available_actions, InboxAction};
use faqdesk_gateway::error::PERMISSION_EXPLANATION;
use faqdesk_gateway::payload::{BulkItemError, ListFilters, ListPage, ListQuery, ManualFaqResponse};
use faqdesk_gateway::{
    ActionError, ActionGateway, ActionResult, BulkOutcome, GatewayOptions, InboxApi,
    PublishIntent, PublishRequest,
};
use tokio::sync::{Mutex, RwLock};

use crate::config::{ConsoleConfig, MAX_DEBOUNCE, MIN_DEBOUNCE};
use crate::debounce::Debouncer;
use crate::fence::RequestFence;
use crate::sync::ListSynchronizer;

/// Fence key for the list as a whole.
const LIST_KEY: &str = "list";

fn detail_key(id: &str) -> String {
    format!("detail:{id}")
}

/// Result of a list refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was applied; `items` active items are listed.
    Applied { items: usize },
    /// A newer refresh was issued while this one was in flight.
    Superseded,
}

pub struct WorkflowOrchestrator {
    api: Arc<dyn InboxApi>,
    gateway: ActionGateway,
    actor: Actor,
    page_size: u32,
    search_debounce: Duration,
    list: RwLock<ListSynchronizer>,
    filters: RwLock<ListFilters>,
    fence: Mutex<RequestFence>,
    drafts: Mutex<DraftStore>,
}

impl WorkflowOrchestrator {
    pub fn new(api: Arc<dyn InboxApi>, actor: Actor, config: &ConsoleConfig) -> Self {
        let gateway = ActionGateway::new(
            Arc::clone(&api),
            GatewayOptions {
                faq_enabled: config.faq_enabled,
                require_citations: config.require_citations,
            },
        );
        Self {
            api,
            gateway,
            actor,
            page_size: config.page_size,
            search_debounce: config.search_debounce.clamp(MIN_DEBOUNCE, MAX_DEBOUNCE),
            list: RwLock::new(ListSynchronizer::new()),
            filters: RwLock::new(ListFilters::default()),
            fence: Mutex::new(RequestFence::new()),
            drafts: Mutex::new(DraftStore::new()),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn gateway(&self) -> &ActionGateway {
        &self.gateway
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// Clear the selection and reload the first page of every active bucket.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ActionError> {
        let token = self.fence.lock().await.issue(LIST_KEY);
        self.list.write().await.clear_selection();
        let filters = self.filters.read().await.clone();

        let (pending, needs_review) = futures::try_join!(
            self.fetch_page(InboxStatus::Pending, None, &filters),
            self.fetch_page(InboxStatus::NeedsReview, None, &filters),
        )
        .inspect_err(|e| tracing::warn!(error = %e, "Inbox refresh failed"))?;

        if !self.fence.lock().await.finish(&token) {
            tracing::debug!("Discarding superseded inbox refresh");
            return Ok(RefreshOutcome::Superseded);
        }

        let mut list = self.list.write().await;
        list.reset();
        list.merge_page(InboxStatus::Pending, pending);
        list.merge_page(InboxStatus::NeedsReview, needs_review);
        tracing::info!(items = list.len(), "Inbox refreshed");
        Ok(RefreshOutcome::Applied { items: list.len() })
    }

    /// Fetch the next page of `status`. Returns how many items were added.
    pub async fn load_more(&self, status: InboxStatus) -> Result<usize, ActionError> {
        let Some(cursor) = self.list.read().await.next_cursor(status).map(str::to_string) else {
            return Ok(0);
        };
        let token = self.fence.lock().await.current(LIST_KEY);
        let filters = self.filters.read().await.clone();

        let page = self.fetch_page(status, Some(cursor), &filters).await?;

        let fence = self.fence.lock().await;
        if token.as_ref().is_some_and(|t| !fence.is_latest(t)) {
            tracing::debug!(status = %status, "Discarding page from a superseded listing");
            return Ok(0);
        }
        drop(fence);
        Ok(self.list.write().await.merge_page(status, page).added)
    }

    /// Replace the filters and reload. The selection is always cleared.
    pub async fn set_filters(&self, filters: ListFilters) -> Result<RefreshOutcome, ActionError> {
        *self.filters.write().await = filters.normalized();
        self.refresh().await
    }

    pub async fn set_search(&self, text: &str) -> Result<RefreshOutcome, ActionError> {
        let mut filters = self.filters.read().await.clone();
        filters.search = Some(text.to_string());
        self.set_filters(filters).await
    }

    pub async fn filters(&self) -> ListFilters {
        self.filters.read().await.clone()
    }

    /// Debounced search input: only the text left standing for the
    /// configured quiet period triggers a reload.
    pub fn search_input(self: &Arc<Self>) -> Debouncer<String> {
        let orchestrator = Arc::clone(self);
        Debouncer::spawn(self.search_debounce, move |text: String| {
            let orchestrator = Arc::clone(&orchestrator);
            async move {
                if let Err(e) = orchestrator.set_search(&text).await {
                    tracing::warn!(error = %e, "Search refresh failed");
                }
            }
        })
    }

    /// Load one item's detail. Returns `None` when a newer load for the same
    /// id was issued meanwhile.
    pub async fn load_detail(&self, id: &str) -> Result<Option<InboxItem>, ActionError> {
        let token = self.fence.lock().await.issue(detail_key(id));
        let result = self.api.get(id).await;

        if !self.fence.lock().await.finish(&token) {
            tracing::debug!(item_id = %id, "Discarding stale detail response");
            return Ok(None);
        }

        match result {
            Ok(item) => {
                self.list.write().await.replace(item.clone());
                Ok(Some(item))
            }
            Err(e) => {
                if matches!(e, ActionError::NotFound { .. }) {
                    self.list.write().await.remove(id);
                }
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Single-item actions
    // -----------------------------------------------------------------------

    pub async fn attach_source(&self, id: &str, rows: &[CitationRow]) -> ActionResult {
        let item = self.actionable(id).await?;
        let result = self.gateway.attach_source(&self.actor, &item, rows).await;
        self.reconcile(id, result).await
    }

    pub async fn request_review(&self, id: &str, form: ReviewRequestForm) -> ActionResult {
        let item = self.actionable(id).await?;
        let result = self.gateway.request_review(&self.actor, &item, form).await;
        self.reconcile(id, result).await
    }

    /// Approve, or promote when FAQ creation is enabled and `request` asks
    /// for it.
    pub async fn publish(&self, id: &str, request: PublishRequest) -> ActionResult {
        let item = self.actionable(id).await?;
        let intent = PublishIntent::resolve(self.gateway.options().faq_enabled, request);
        let result = self.gateway.publish(&self.actor, &item, &intent).await;
        self.reconcile(id, result).await
    }

    pub async fn reject(&self, id: &str, note: Option<String>) -> ActionResult {
        let item = self.actionable(id).await?;
        let result = self.gateway.reject(&self.actor, &item, note).await;
        self.reconcile(id, result).await
    }

    pub async fn mark_reviewed(&self, id: &str, note: Option<String>) -> ActionResult {
        let item = self.actionable(id).await?;
        let result = self.gateway.mark_reviewed(&self.actor, &item, note).await;
        self.reconcile(id, result).await
    }

    pub async fn dismiss(&self, id: &str, reason: Option<String>) -> ActionResult {
        let item = self.actionable(id).await?;
        let result = self.gateway.dismiss(&self.actor, &item, reason).await;
        self.reconcile(id, result).await
    }

    /// Actions offered for a listed item. Locked items get none.
    pub async fn available_actions(&self, id: &str) -> Vec<InboxAction> {
        let list = self.list.read().await;
        match list.get(id) {
            Some(item) if !list.is_locked(id) => {
                available_actions(item, &self.actor, self.gateway.options().faq_enabled)
            }
            _ => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Selection / bulk
    // -----------------------------------------------------------------------

    pub async fn toggle_selected(&self, id: &str) -> bool {
        self.list.write().await.toggle_selected(id)
    }

    pub async fn select_all(&self) {
        self.list.write().await.select_all();
    }

    pub async fn clear_selection(&self) {
        self.list.write().await.clear_selection();
    }

    pub async fn selected_ids(&self) -> Vec<ItemId> {
        self.list.read().await.selection().ids()
    }

    /// Approve the current selection in one request. Selected items the
    /// actor may not act on are dropped from the request and reported as
    /// failed. The selection is cleared once the response has been
    /// reconciled.
    pub async fn bulk_approve(&self, as_faq: bool) -> Result<BulkOutcome, ActionError> {
        let (ids, refused) = self.bulk_targets().await;
        let outcome = if ids.is_empty() && !refused.is_empty() {
            BulkOutcome::refused(InboxAction::Approve, refused)
        } else {
            self.gateway
                .bulk_approve(&self.actor, &ids, as_faq)
                .await?
                .with_refused(refused)
        };
        self.reconcile_bulk(&outcome).await;
        Ok(outcome)
    }

    pub async fn bulk_reject(&self) -> Result<BulkOutcome, ActionError> {
        let (ids, refused) = self.bulk_targets().await;
        let outcome = if ids.is_empty() && !refused.is_empty() {
            BulkOutcome::refused(InboxAction::Reject, refused)
        } else {
            self.gateway
                .bulk_reject(&self.actor, &ids)
                .await?
                .with_refused(refused)
        };
        self.reconcile_bulk(&outcome).await;
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Manual FAQ drafts
    // -----------------------------------------------------------------------

    pub async fn save_manual_draft(&self, input: &ManualFaqInput) -> Result<(), ActionError> {
        let key = draft_key(&self.actor.id, SCOPE_MANUAL_FAQ);
        self.drafts.lock().await.save(&key, input)?;
        Ok(())
    }

    pub async fn load_manual_draft(&self) -> Option<ManualFaqInput> {
        let key = draft_key(&self.actor.id, SCOPE_MANUAL_FAQ);
        self.drafts.lock().await.load(&key)
    }

    /// Submit the manual FAQ form. The saved draft is cleared on success.
    pub async fn create_manual_faq(
        &self,
        input: &ManualFaqInput,
    ) -> Result<ManualFaqResponse, ActionError> {
        let created = self.gateway.create_manual_faq(&self.actor, input).await?;
        let key = draft_key(&self.actor.id, SCOPE_MANUAL_FAQ);
        self.drafts.lock().await.clear(&key);
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn snapshot(&self) -> Vec<InboxItem> {
        self.list.read().await.snapshot()
    }

    pub async fn item(&self, id: &str) -> Option<InboxItem> {
        self.list.read().await.get(id).cloned()
    }

    pub async fn needs_refresh(&self) -> bool {
        self.list.read().await.needs_refresh()
    }

    pub async fn has_more(&self) -> bool {
        let list = self.list.read().await;
        ACTIVE_STATUSES.iter().any(|status| list.has_more(*status))
    }

    // ---- private helpers ----

    async fn fetch_page(
        &self,
        status: InboxStatus,
        cursor: Option<String>,
        filters: &ListFilters,
    ) -> Result<ListPage, ActionError> {
        let mut query = ListQuery::first_page(status, self.page_size, filters.clone());
        query.cursor = cursor;
        self.api.list(&query).await
    }

    /// Snapshot of a listed item that the actor is not locked out of.
    async fn actionable(&self, id: &str) -> Result<InboxItem, ActionError> {
        let list = self.list.read().await;
        if list.is_locked(id) {
            return Err(ActionError::Permission {
                status: 403,
                message: PERMISSION_EXPLANATION.to_string(),
            });
        }
        list.get(id)
            .cloned()
            .ok_or_else(|| ActionError::NotFound {
                message: format!("Item {id} is not in the active inbox"),
            })
    }

    /// Prune the selection down to ids the actor may act on.
    async fn bulk_targets(&self) -> (Vec<ItemId>, Vec<BulkItemError>) {
        let mut list = self.list.write().await;
        let refused = list.prune_selection(&self.actor);
        (list.selection().ids(), refused)
    }

    async fn reconcile(&self, id: &str, result: ActionResult) -> ActionResult {
        self.list.write().await.apply(id, &result);
        result
    }

    async fn reconcile_bulk(&self, outcome: &BulkOutcome) {
        let notice = self.list.write().await.apply_bulk(outcome);
        if let Some(notice) = notice {
            tracing::warn!(failed = ?outcome.failed_ids(), "{notice}");
        }
    }
}
