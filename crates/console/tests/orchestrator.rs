//! Orchestrator behaviour against an in-memory Inbox API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;

use common::{curator, loaded, needs_review, orchestrator, pending, FakeInboxApi};
use faqdesk_console::config::ConsoleConfig;
use faqdesk_console::orchestrator::{RefreshOutcome, WorkflowOrchestrator};
use faqdesk_core::citation::CitationRow;
use faqdesk_core::inbox::{Assignee, InboxStatus, ItemSource};
use faqdesk_core::manual_faq::ManualFaqInput;
use faqdesk_core::roles::Actor;
use faqdesk_core::workflow::InboxAction;
use faqdesk_gateway::payload::ListFilters;
use faqdesk_gateway::{ActionEffect, ActionError, ErrorKind, InboxApi, PublishRequest};

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn assigned_elsewhere(id: &str) -> faqdesk_core::inbox::InboxItem {
    let mut item = needs_review(id);
    item.source = ItemSource::AdminReview;
    item.assigned_to.push(Assignee {
        id: "u-x".into(),
        email: "x@example.com".into(),
        display_name: None,
        role: None,
    });
    item
}

fn listed(items: &[faqdesk_core::inbox::InboxItem]) -> Vec<String> {
    items.iter().map(|i| i.id.clone()).collect()
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_lists_both_active_buckets() {
    let api = FakeInboxApi::new();
    api.set_page(InboxStatus::Pending, None, vec![pending("A")], None);
    api.set_page(InboxStatus::NeedsReview, None, vec![needs_review("B")], None);

    let orchestrator = orchestrator(&api);
    let outcome = orchestrator.refresh().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Applied { items: 2 });
    assert_eq!(listed(&orchestrator.snapshot().await), ids(&["A", "B"]));
    assert_eq!(api.count("list"), 2);
}

#[tokio::test]
async fn load_more_follows_cursor_and_skips_duplicates() {
    let api = FakeInboxApi::new();
    api.set_page(InboxStatus::Pending, None, vec![pending("A")], Some("c-2"));
    api.set_page(
        InboxStatus::Pending,
        Some("c-2"),
        vec![pending("A"), pending("C")],
        None,
    );

    let orchestrator = orchestrator(&api);
    orchestrator.refresh().await.unwrap();
    assert!(orchestrator.has_more().await);

    let added = orchestrator.load_more(InboxStatus::Pending).await.unwrap();

    assert_eq!(added, 1);
    assert_eq!(listed(&orchestrator.snapshot().await), ids(&["A", "C"]));
    assert!(!orchestrator.has_more().await);
    assert_eq!(
        orchestrator.load_more(InboxStatus::Pending).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn filter_change_clears_selection_and_refetches() {
    let (api, orchestrator) = loaded(&["A", "B"]).await;
    orchestrator.toggle_selected("A").await;
    assert_eq!(orchestrator.selected_ids().await, ids(&["A"]));

    orchestrator
        .set_filters(ListFilters {
            source: Some(ItemSource::Manual),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(orchestrator.selected_ids().await.is_empty());
    let last = api.queries().pop().unwrap();
    assert_eq!(last.filters.source, Some(ItemSource::Manual));
    assert_eq!(last.cursor, None);
}

#[tokio::test]
async fn manual_refresh_clears_selection() {
    let (_api, orchestrator) = loaded(&["A", "B"]).await;
    orchestrator.select_all().await;
    assert_eq!(orchestrator.selected_ids().await.len(), 2);

    orchestrator.refresh().await.unwrap();
    assert!(orchestrator.selected_ids().await.is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_current_items() {
    let (api, orchestrator) = loaded(&["A"]).await;
    api.fail(
        "list",
        ActionError::Failure {
            status: Some(503),
            message: "down".into(),
        },
    );

    let err = orchestrator.refresh().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(listed(&orchestrator.snapshot().await), ids(&["A"]));
}

#[tokio::test(start_paused = true)]
async fn debounced_search_issues_one_refresh() {
    let (api, orchestrator) = loaded(&["A"]).await;
    let before = api.count("list");
    let search = orchestrator.search_input();

    for text in ["r", "re", "ref", "refund"] {
        search.push(text.to_string());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(600)).await;

    // One refresh = one list call per active bucket.
    assert_eq!(api.count("list"), before + 2);
    assert_eq!(
        orchestrator.filters().await.search.as_deref(),
        Some("refund")
    );
}

#[tokio::test(start_paused = true)]
async fn search_quiet_period_is_clamped_to_configured_bounds() {
    let api = FakeInboxApi::new();
    api.set_page(InboxStatus::Pending, None, vec![pending("A")], None);
    let config = ConsoleConfig {
        search_debounce: Duration::from_millis(10),
        ..ConsoleConfig::default()
    };
    let inbox_api: Arc<dyn InboxApi> = api.clone();
    let orchestrator = Arc::new(WorkflowOrchestrator::new(inbox_api, curator(), &config));
    orchestrator.refresh().await.unwrap();
    let before = api.count("list");

    let search = orchestrator.search_input();
    for text in ["r", "re", "ref"] {
        search.push(text.to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(api.count("list"), before);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(api.count("list"), before + 2);
}

// ---------------------------------------------------------------------------
// Detail fencing
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stale_detail_response_is_discarded() {
    let (api, orchestrator) = loaded(&["A"]).await;
    let mut old = pending("A");
    old.answer_draft = Some("old".into());
    let mut new = pending("A");
    new.answer_draft = Some("new".into());
    api.queue_detail("A", Duration::from_millis(200), Ok(old));
    api.queue_detail("A", Duration::from_millis(50), Ok(new));

    let (first, second) = tokio::join!(orchestrator.load_detail("A"), orchestrator.load_detail("A"));

    assert_eq!(first.unwrap(), None);
    assert_eq!(
        second.unwrap().and_then(|i| i.answer_draft).as_deref(),
        Some("new")
    );
    assert_eq!(
        orchestrator.item("A").await.unwrap().answer_draft.as_deref(),
        Some("new")
    );
}

#[tokio::test]
async fn missing_detail_removes_item() {
    let (_api, orchestrator) = loaded(&["A", "B"]).await;

    let err = orchestrator.load_detail("B").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(listed(&orchestrator.snapshot().await), ids(&["A"]));
}

// ---------------------------------------------------------------------------
// Single-item actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminal_action_removes_item_without_refetch() {
    let (api, orchestrator) = loaded(&["A", "B"]).await;
    let lists_before = api.count("list");

    let ok = orchestrator
        .publish("A", PublishRequest::default())
        .await
        .unwrap();

    assert_matches!(ok.effect, ActionEffect::Removed { status: InboxStatus::Approved, .. });
    assert_eq!(listed(&orchestrator.snapshot().await), ids(&["B"]));
    assert_eq!(api.count("list"), lists_before);
    assert_eq!(api.count("get"), 0);
}

#[tokio::test]
async fn promote_rejects_invalid_rows_before_any_request() {
    let (api, orchestrator) = loaded(&["A"]).await;
    let long_text = CitationRow {
        doc_id: "D1".into(),
        span_text: "x".repeat(900),
        ..Default::default()
    };
    let too_many: Vec<CitationRow> = (1..=4)
        .map(|n| CitationRow::with_doc_id(format!("D{n}")))
        .collect();

    for citations in [vec![long_text], too_many] {
        let err = orchestrator
            .publish(
                "A",
                PublishRequest {
                    wants_faq: true,
                    citations,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(api.count("promote"), 0);
    assert!(orchestrator.item("A").await.is_some());
}

#[tokio::test]
async fn attach_replaces_item_in_place() {
    let (_api, orchestrator) = loaded(&["A", "B", "C"]).await;

    orchestrator
        .attach_source("B", &[CitationRow::with_doc_id("D7")])
        .await
        .unwrap();

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(listed(&snapshot), ids(&["A", "B", "C"]));
    assert_eq!(snapshot[1].suggested_citations[0].doc_id, "D7");
}

#[tokio::test]
async fn conflict_leaves_item_in_last_known_state() {
    let (api, orchestrator) = loaded(&["A"]).await;
    api.fail(
        "reject",
        ActionError::from_response(409, r#"{"error": "Already approved", "details": {"existing_qa_pair_id": "qa-3"}}"#),
    );

    let err = orchestrator.reject("A", None).await.unwrap_err();

    assert_eq!(err.conflicting_id(), Some("qa-3"));
    let item = orchestrator.item("A").await.unwrap();
    assert_eq!(item.status, InboxStatus::Pending);
    assert!(orchestrator.needs_refresh().await);
}

#[tokio::test]
async fn server_permission_error_locks_item() {
    let (api, orchestrator) = loaded(&["A"]).await;
    api.fail(
        "reject",
        ActionError::from_response(403, r#"{"detail": "Not your item"}"#),
    );

    let err = orchestrator.reject("A", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert!(orchestrator.available_actions("A").await.is_empty());

    // Further attempts are refused locally.
    let again = orchestrator.reject("A", None).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Permission);
    assert_eq!(api.count("reject"), 1);
}

#[tokio::test]
async fn non_assignee_curator_cannot_act() {
    let api = FakeInboxApi::new();
    api.set_page(InboxStatus::NeedsReview, None, vec![assigned_elsewhere("A")], None);
    let orchestrator = orchestrator(&api);
    orchestrator.refresh().await.unwrap();

    for result in [
        orchestrator.mark_reviewed("A", None).await,
        orchestrator.dismiss("A", None).await,
        orchestrator.reject("A", None).await,
    ] {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Permission);
    }
    assert_eq!(
        orchestrator.item("A").await.unwrap().status,
        InboxStatus::NeedsReview
    );
    assert!(orchestrator.available_actions("A").await.is_empty());
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let (api, orchestrator) = loaded(&["A"]).await;
    let err = orchestrator.dismiss("Z", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(api.count("dismiss"), 0);
}

#[tokio::test]
async fn available_actions_follow_source() {
    let (_api, orchestrator) = loaded(&["A"]).await;
    assert_eq!(
        orchestrator.available_actions("A").await,
        vec![
            InboxAction::AttachSource,
            InboxAction::RequestReview,
            InboxAction::Approve,
            InboxAction::Promote,
            InboxAction::Reject,
        ]
    );
}

// ---------------------------------------------------------------------------
// Bulk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_partial_failure_keeps_failed_item_and_clears_selection() {
    let (api, orchestrator) = loaded(&["A", "B", "C"]).await;
    api.fail_bulk_ids(&["B"]);
    for id in ["A", "B", "C"] {
        orchestrator.toggle_selected(id).await;
    }

    let outcome = orchestrator.bulk_approve(false).await.unwrap();

    assert_eq!(outcome.failed_ids(), ids(&["B"]));
    assert_eq!(listed(&orchestrator.snapshot().await), ids(&["B"]));
    assert!(orchestrator.selected_ids().await.is_empty());
    assert_eq!(
        outcome.failure_notice().as_deref(),
        Some("1 of 3 items could not be approved.")
    );
}

#[tokio::test]
async fn rejected_bulk_request_keeps_selection() {
    let (api, orchestrator) = loaded(&["A", "B"]).await;
    api.fail(
        "bulk_reject",
        ActionError::Failure {
            status: None,
            message: "timeout".into(),
        },
    );
    orchestrator.select_all().await;

    let err = orchestrator.bulk_reject().await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(orchestrator.selected_ids().await, ids(&["A", "B"]));
    assert_eq!(orchestrator.snapshot().await.len(), 2);
}

#[tokio::test]
async fn bulk_skips_items_owned_by_someone_else() {
    let api = FakeInboxApi::new();
    api.set_page(InboxStatus::Pending, None, vec![pending("B")], None);
    api.set_page(InboxStatus::NeedsReview, None, vec![assigned_elsewhere("A")], None);
    let orchestrator = orchestrator(&api);
    orchestrator.refresh().await.unwrap();
    orchestrator.select_all().await;

    let outcome = orchestrator.bulk_reject().await.unwrap();

    assert_eq!(api.count("bulk_reject"), 1);
    assert_eq!(outcome.succeeded, ids(&["B"]));
    assert_eq!(outcome.failed_ids(), ids(&["A"]));
    assert_eq!(listed(&orchestrator.snapshot().await), ids(&["A"]));
    assert!(orchestrator.selected_ids().await.is_empty());
}

#[tokio::test]
async fn locked_item_cannot_be_bulk_actioned() {
    let api = FakeInboxApi::new();
    api.set_page(InboxStatus::NeedsReview, None, vec![assigned_elsewhere("A")], None);
    let orchestrator = orchestrator(&api);
    orchestrator.refresh().await.unwrap();

    let err = orchestrator.reject("A", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    orchestrator.select_all().await;
    assert!(orchestrator.selected_ids().await.is_empty());
    assert!(!orchestrator.toggle_selected("A").await);
    let err = orchestrator.bulk_reject().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(api.count("bulk_reject"), 0);
    assert!(orchestrator.item("A").await.is_some());
}

#[tokio::test]
async fn fully_refused_selection_sends_nothing() {
    let api = FakeInboxApi::new();
    api.set_page(InboxStatus::NeedsReview, None, vec![assigned_elsewhere("A")], None);
    let orchestrator = orchestrator(&api);
    orchestrator.refresh().await.unwrap();
    orchestrator.toggle_selected("A").await;

    let outcome = orchestrator.bulk_approve(false).await.unwrap();

    assert_eq!(api.count("bulk_approve"), 0);
    assert_eq!(outcome.failed_ids(), ids(&["A"]));
    assert_eq!(
        outcome.failure_notice().as_deref(),
        Some("1 of 1 items could not be approved.")
    );
    assert!(orchestrator.item("A").await.is_some());
    assert!(orchestrator.selected_ids().await.is_empty());
}

#[tokio::test]
async fn empty_selection_is_rejected_locally() {
    let (api, orchestrator) = loaded(&["A"]).await;
    let err = orchestrator.bulk_reject().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(api.count("bulk_reject"), 0);
}

// ---------------------------------------------------------------------------
// Manual FAQ drafts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manual_draft_survives_until_created() {
    let api = FakeInboxApi::new();
    let orchestrator = orchestrator(&api);
    let input = ManualFaqInput {
        question: "How long do refunds take?".into(),
        answer: "Five business days.".into(),
        ..Default::default()
    };

    orchestrator.save_manual_draft(&input).await.unwrap();
    assert_eq!(
        orchestrator.load_manual_draft().await.map(|d| d.question),
        Some(input.question.clone())
    );

    orchestrator.create_manual_faq(&input).await.unwrap();
    assert!(orchestrator.load_manual_draft().await.is_none());
}

#[tokio::test]
async fn drafts_are_scoped_per_actor() {
    let api = FakeInboxApi::new();
    let shared: Arc<dyn InboxApi> = api.clone();
    let config = ConsoleConfig::default();
    let alice = WorkflowOrchestrator::new(Arc::clone(&shared), curator(), &config);
    let bob = WorkflowOrchestrator::new(shared, Actor::new("u-bob", "curator"), &config);

    alice
        .save_manual_draft(&ManualFaqInput {
            question: "Q".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    // Each orchestrator keeps its own store, keyed by its actor.
    assert!(alice.load_manual_draft().await.is_some());
    assert!(bob.load_manual_draft().await.is_none());
}
