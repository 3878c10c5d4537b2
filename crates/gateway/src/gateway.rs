//! Action gateway: one operation per workflow action.
//!
//! Each operation runs the client-side gate (ownership, transition,
//! citations), serializes the body for that specific action, calls the
//! [`InboxApi`], and returns a uniform [`ActionResult`] that the list
//! synchronizer can apply without knowing which action ran.

use std::collections::HashSet;
use std::sync::Arc;

use faqdesk_core::citation::evaluator::MSG_ATTACH_AT_LEAST_ONE;
use faqdesk_core::citation::{validate_citation_rows, CitationField, CitationRow, ValidationOutcome};
use faqdesk_core::inbox::{InboxItem, InboxStatus};
use faqdesk_core::manual_faq::{validate_manual_faq, ManualFaqInput, ManualFaqPayload};
use faqdesk_core::review_request::ReviewRequestForm;
use faqdesk_core::roles::Actor;
use faqdesk_core::types::ItemId;
use faqdesk_core::workflow::{authorize, success_message, InboxAction, Transition};

use crate::api::InboxApi;
use crate::error::{ActionError, FieldError};
use crate::intent::PublishIntent;
use crate::payload::{
    ApproveRequest, AttachSourceRequest, BulkApproveRequest, BulkItemError, BulkRejectRequest,
    BulkResponse, ConvertToFaqRequest, DismissRequest, ManualFaqResponse, NoteRequest,
    PromoteRequest, RequestReviewRequest,
};

// ---------------------------------------------------------------------------
// Options / results
// ---------------------------------------------------------------------------

/// Deployment switches that change which actions and gates apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Whether the FAQ (promote / convert) path exists at all.
    pub faq_enabled: bool,
    /// When set, approve / promote / attach need at least one citation.
    pub require_citations: bool,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            faq_enabled: true,
            require_citations: true,
        }
    }
}

/// What a successful action did to the item.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    /// The item reached a terminal status and leaves the active listing.
    Removed {
        status: InboxStatus,
        qa_pair_id: Option<String>,
    },
    /// Authoritative copy of the item after a non-terminal mutation.
    Updated(Box<InboxItem>),
    /// The item already held the action's terminal status. No call was made.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSuccess {
    pub item_id: ItemId,
    pub action: InboxAction,
    pub effect: ActionEffect,
    /// The Inbox API notifies the requester for this outcome.
    pub notify_requester: bool,
}

impl ActionSuccess {
    pub fn message(&self) -> String {
        match (&self.effect, self.action.target_status()) {
            (ActionEffect::Unchanged, Some(status)) => {
                format!("Nothing to do: this item is already {status}.")
            }
            _ => success_message(self.action, self.notify_requester),
        }
    }
}

pub type ActionResult = Result<ActionSuccess, ActionError>;

/// Reconciliation input for a bulk request that the server accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    pub action: InboxAction,
    pub selected: Vec<ItemId>,
    pub succeeded: Vec<ItemId>,
    pub failed: Vec<BulkItemError>,
}

impl BulkOutcome {
    /// `succeeded = selected - failed`. Failures for ids that were never
    /// selected are ignored.
    pub fn from_response(
        action: InboxAction,
        selected: Vec<ItemId>,
        response: BulkResponse,
    ) -> Self {
        let selected_set: HashSet<&str> = selected.iter().map(String::as_str).collect();
        let mut failed_ids = HashSet::new();
        let failed: Vec<BulkItemError> = response
            .errors
            .into_iter()
            .filter(|e| selected_set.contains(e.id.as_str()) && failed_ids.insert(e.id.clone()))
            .collect();
        let succeeded = selected
            .iter()
            .filter(|id| !failed_ids.contains(*id))
            .cloned()
            .collect();
        Self {
            action,
            selected,
            succeeded,
            failed,
        }
    }

    /// Outcome for a bulk action where every selected id was refused before
    /// any request was sent.
    pub fn refused(action: InboxAction, refused: Vec<BulkItemError>) -> Self {
        Self {
            action,
            selected: Vec::new(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
        .with_refused(refused)
    }

    /// Fold in ids refused before the request was sent. They count as both
    /// selected and failed.
    pub fn with_refused(mut self, refused: Vec<BulkItemError>) -> Self {
        for error in refused {
            if !self.selected.contains(&error.id) {
                self.selected.push(error.id.clone());
                self.failed.push(error);
            }
        }
        self
    }

    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failed.iter().map(|e| e.id.clone()).collect()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() && !self.succeeded.is_empty()
    }

    /// One aggregate notice naming the failure count, if anything failed.
    pub fn failure_notice(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let verb = match self.action {
            InboxAction::Reject => "rejected",
            _ => "approved",
        };
        Some(format!(
            "{} of {} items could not be {verb}.",
            self.failed.len(),
            self.selected.len()
        ))
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

pub struct ActionGateway {
    api: Arc<dyn InboxApi>,
    options: GatewayOptions,
}

impl ActionGateway {
    pub fn new(api: Arc<dyn InboxApi>, options: GatewayOptions) -> Self {
        Self { api, options }
    }

    pub fn options(&self) -> GatewayOptions {
        self.options
    }

    /// Live-typing feedback for the attach editor. Same rules as the
    /// pre-submit gate in [`attach_source`](Self::attach_source).
    pub fn validate_attachment(&self, rows: &[CitationRow]) -> ValidationOutcome {
        validate_citation_rows(rows, !self.options.require_citations)
    }

    /// Replace the item's suggested citations with the submitted rows.
    pub async fn attach_source(
        &self,
        actor: &Actor,
        item: &InboxItem,
        rows: &[CitationRow],
    ) -> ActionResult {
        let action = InboxAction::AttachSource;
        self.gate(item, actor, action)?;

        let outcome = self.validate_attachment(rows);
        if !outcome.is_valid {
            return Err(outcome_error(&outcome));
        }

        tracing::debug!(
            item_id = %item.id,
            action = %action,
            count = outcome.citations.len(),
            "Submitting inbox action",
        );
        let body = AttachSourceRequest {
            citations: outcome.citations.clone(),
        };
        let result = self
            .api
            .attach_source(&item.id, &body)
            .await
            .map(|fresh| self.success(item, action, ActionEffect::Updated(Box::new(fresh))))
            .map_err(|e| e.remap_citation_indices(&outcome.citation_rows));
        log_result(item, action, result)
    }

    /// Route a pending, unassigned item to subject-matter experts.
    pub async fn request_review(
        &self,
        actor: &Actor,
        item: &InboxItem,
        form: ReviewRequestForm,
    ) -> ActionResult {
        let action = InboxAction::RequestReview;
        self.gate(item, actor, action)?;
        form.check()?;

        tracing::debug!(
            item_id = %item.id,
            action = %action,
            assignees = form.assignees.len(),
            "Submitting inbox action",
        );
        let body = RequestReviewRequest {
            reason: form.reason.clone(),
            assignees: form.assignees.clone(),
        };
        let response = match self.api.request_review(&item.id, &body).await {
            Ok(response) => response,
            Err(e) => return log_result(item, action, Err(e)),
        };

        let fresh = match self.api.get(&item.id).await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    error = %e,
                    "Could not refetch item after review request; using response data",
                );
                let mut patched = item.clone();
                patched.status = response.status;
                patched.assigned_to = if response.assigned_to.is_empty() {
                    form.assignees
                } else {
                    response.assigned_to
                };
                patched.assignment_reason = Some(form.reason);
                patched
            }
        };
        log_result(
            item,
            action,
            Ok(self.success(item, action, ActionEffect::Updated(Box::new(fresh)))),
        )
    }

    /// Approve (non-FAQ) or promote / convert (FAQ) according to `intent`.
    pub async fn publish(
        &self,
        actor: &Actor,
        item: &InboxItem,
        intent: &PublishIntent,
    ) -> ActionResult {
        let action = intent.action_for(item.source);
        if self.gate(item, actor, action)? == Transition::AlreadyApplied {
            return Ok(self.unchanged(item, action));
        }

        let outcome = match intent {
            PublishIntent::Promote(promote) => validate_citation_rows(&promote.citations, true),
            PublishIntent::Approve(_) => validate_citation_rows(&[], true),
        };
        if !outcome.is_valid {
            return Err(outcome_error(&outcome));
        }
        let submitted = &outcome.citations;
        if self.options.require_citations
            && submitted.is_empty()
            && item.suggested_citations.is_empty()
        {
            return Err(ActionError::validation(MSG_ATTACH_AT_LEAST_ONE));
        }

        tracing::debug!(
            item_id = %item.id,
            action = %action,
            count = submitted.len(),
            "Submitting inbox action",
        );
        let replacement = (!submitted.is_empty()).then(|| submitted.clone());
        let result = match intent {
            PublishIntent::Approve(approve) => {
                let body = ApproveRequest {
                    reembed: approve.reembed,
                    answer: approve.answer.clone(),
                };
                self.api
                    .approve(&item.id, &body)
                    .await
                    .map(|r| self.removed(item, action, r.qa_pair_id))
            }
            PublishIntent::Promote(promote) if action == InboxAction::ConvertToFaq => {
                let body = ConvertToFaqRequest {
                    answer: promote.answer.clone(),
                    citations: replacement,
                };
                self.api
                    .convert_to_faq(&item.id, &body)
                    .await
                    .map(|r| self.removed(item, action, r.qa_pair_id))
            }
            PublishIntent::Promote(promote) => {
                let body = PromoteRequest {
                    citations: replacement,
                    answer: promote.answer.clone(),
                    title: promote.title.clone(),
                    is_faq: true,
                };
                self.api
                    .promote(&item.id, &body)
                    .await
                    .map(|r| self.removed(item, action, Some(r.qa_pair_id)))
            }
        }
        .map_err(|e| e.remap_citation_indices(&outcome.citation_rows));
        log_result(item, action, result)
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        item: &InboxItem,
        note: Option<String>,
    ) -> ActionResult {
        let action = InboxAction::Reject;
        if self.gate(item, actor, action)? == Transition::AlreadyApplied {
            return Ok(self.unchanged(item, action));
        }
        tracing::debug!(item_id = %item.id, action = %action, "Submitting inbox action");
        let body = NoteRequest { note: clean(note) };
        let result = self
            .api
            .reject(&item.id, &body)
            .await
            .map(|()| self.removed(item, action, None));
        log_result(item, action, result)
    }

    /// Close a review request without creating a knowledge-base entry.
    pub async fn mark_reviewed(
        &self,
        actor: &Actor,
        item: &InboxItem,
        note: Option<String>,
    ) -> ActionResult {
        let action = InboxAction::MarkReviewed;
        if self.gate(item, actor, action)? == Transition::AlreadyApplied {
            return Ok(self.unchanged(item, action));
        }
        tracing::debug!(item_id = %item.id, action = %action, "Submitting inbox action");
        let body = NoteRequest { note: clean(note) };
        let result = self
            .api
            .mark_reviewed(&item.id, &body)
            .await
            .map(|()| self.removed(item, action, None));
        log_result(item, action, result)
    }

    pub async fn dismiss(
        &self,
        actor: &Actor,
        item: &InboxItem,
        reason: Option<String>,
    ) -> ActionResult {
        let action = InboxAction::Dismiss;
        if self.gate(item, actor, action)? == Transition::AlreadyApplied {
            return Ok(self.unchanged(item, action));
        }
        tracing::debug!(item_id = %item.id, action = %action, "Submitting inbox action");
        let body = DismissRequest {
            reason: clean(reason),
        };
        let result = self
            .api
            .dismiss(&item.id, &body)
            .await
            .map(|()| self.removed(item, action, None));
        log_result(item, action, result)
    }

    /// Approve a whole selection in one request. `as_faq` only takes effect
    /// when FAQ creation is enabled.
    pub async fn bulk_approve(
        &self,
        actor: &Actor,
        ids: &[ItemId],
        as_faq: bool,
    ) -> Result<BulkOutcome, ActionError> {
        let selected = bulk_selection(actor, ids)?;
        let body = BulkApproveRequest {
            ids: selected.clone(),
            as_faq: as_faq && self.options.faq_enabled,
        };
        tracing::debug!(count = selected.len(), as_faq = body.as_faq, "Submitting bulk approve");
        let response = self.api.bulk_approve(&body).await.inspect_err(|e| {
            tracing::warn!(count = selected.len(), error = %e, "Bulk approve failed");
        })?;
        Ok(BulkOutcome::from_response(InboxAction::Approve, selected, response))
    }

    pub async fn bulk_reject(
        &self,
        actor: &Actor,
        ids: &[ItemId],
    ) -> Result<BulkOutcome, ActionError> {
        let selected = bulk_selection(actor, ids)?;
        let body = BulkRejectRequest {
            ids: selected.clone(),
        };
        tracing::debug!(count = selected.len(), "Submitting bulk reject");
        let response = self.api.bulk_reject(&body).await.inspect_err(|e| {
            tracing::warn!(count = selected.len(), error = %e, "Bulk reject failed");
        })?;
        Ok(BulkOutcome::from_response(InboxAction::Reject, selected, response))
    }

    /// Create a verified FAQ entry directly from the manual authoring form.
    pub async fn create_manual_faq(
        &self,
        actor: &Actor,
        input: &ManualFaqInput,
    ) -> Result<ManualFaqResponse, ActionError> {
        if !self.options.faq_enabled {
            return Err(ActionError::validation("FAQ creation is disabled"));
        }
        if !actor.can_curate() {
            return Err(ActionError::Permission {
                status: 403,
                message: format!("Role '{}' cannot create FAQ entries", actor.role),
            });
        }
        let payload: ManualFaqPayload = validate_manual_faq(input).map_err(|errors| {
            let mut err = outcome_error(&errors.citations);
            if let ActionError::Validation { message, fields } = &mut err {
                *message = errors.summary();
                let form_fields = [("question", &errors.question), ("answer", &errors.answer)];
                for (field, problem) in form_fields {
                    if let Some(problem) = problem {
                        fields.push(FieldError::new(field, problem.clone(), None));
                    }
                }
            }
            err
        })?;

        let response = self.api.create_manual_faq(&payload).await;
        match &response {
            Ok(created) => tracing::info!(qa_pair_id = %created.qa_pair_id, "Manual FAQ created"),
            Err(e) => tracing::warn!(error = %e, "Manual FAQ creation failed"),
        }
        response
    }

    // ---- private helpers ----

    fn gate(
        &self,
        item: &InboxItem,
        actor: &Actor,
        action: InboxAction,
    ) -> Result<Transition, ActionError> {
        authorize(item, actor, action, self.options.faq_enabled).map_err(|e| {
            tracing::debug!(
                item_id = %item.id,
                action = %action,
                actor_id = %actor.id,
                error = %e,
                "Action blocked before submission",
            );
            ActionError::from(e)
        })
    }

    fn success(
        &self,
        item: &InboxItem,
        action: InboxAction,
        effect: ActionEffect,
    ) -> ActionSuccess {
        ActionSuccess {
            item_id: item.id.clone(),
            action,
            effect,
            notify_requester: action.is_terminal() && item.has_requester(),
        }
    }

    fn removed(
        &self,
        item: &InboxItem,
        action: InboxAction,
        qa_pair_id: Option<String>,
    ) -> ActionSuccess {
        let status = action.target_status().unwrap_or(item.status);
        self.success(item, action, ActionEffect::Removed { status, qa_pair_id })
    }

    fn unchanged(&self, item: &InboxItem, action: InboxAction) -> ActionSuccess {
        tracing::debug!(
            item_id = %item.id,
            action = %action,
            "Action already applied; skipping request",
        );
        ActionSuccess {
            item_id: item.id.clone(),
            action,
            effect: ActionEffect::Unchanged,
            notify_requester: false,
        }
    }
}

fn log_result(item: &InboxItem, action: InboxAction, result: ActionResult) -> ActionResult {
    match &result {
        Ok(_) => tracing::info!(item_id = %item.id, action = %action, "Inbox action completed"),
        Err(e) => {
            tracing::warn!(item_id = %item.id, action = %action, error = %e, "Inbox action failed")
        }
    }
    result
}

fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// De-duplicated, order-preserving selection, gated on role.
fn bulk_selection(actor: &Actor, ids: &[ItemId]) -> Result<Vec<ItemId>, ActionError> {
    if !actor.can_curate() {
        return Err(ActionError::Permission {
            status: 403,
            message: format!("Role '{}' cannot run bulk actions", actor.role),
        });
    }
    let mut seen = HashSet::new();
    let selected: Vec<ItemId> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();
    if selected.is_empty() {
        return Err(ActionError::validation("Select at least one item."));
    }
    Ok(selected)
}

/// Turn a failed row validation into a field-indexed validation error.
fn outcome_error(outcome: &ValidationOutcome) -> ActionError {
    static FIELDS: [(CitationField, &str); 5] = [
        (CitationField::DocId, "doc_id"),
        (CitationField::Page, "page"),
        (CitationField::SpanStart, "span_start"),
        (CitationField::SpanEnd, "span_end"),
        (CitationField::SpanText, "span_text"),
    ];
    let fields = outcome
        .row_errors
        .iter()
        .enumerate()
        .flat_map(|(index, errors)| {
            FIELDS.iter().filter_map(move |(field, name)| {
                errors
                    .get(*field)
                    .map(|message| FieldError::new(*name, message, Some(index)))
            })
        })
        .collect();
    ActionError::Validation {
        message: outcome
            .first_message()
            .unwrap_or_else(|| "Citations are invalid.".to_string()),
        fields,
    }
}
