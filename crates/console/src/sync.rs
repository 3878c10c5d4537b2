//! List synchronizer: the single writer of the active item collection.
//!
//! The collection holds only `pending` and `needs_review` items, merged from
//! per-status cursor pages. Action results, detail loads and bulk outcomes
//! are all applied here; nothing else mutates the list.

use std::collections::{HashMap, HashSet};

use faqdesk_core::inbox::{InboxItem, InboxStatus, ACTIVE_STATUSES};
use faqdesk_core::roles::Actor;
use faqdesk_core::types::ItemId;
use faqdesk_core::workflow::check_ownership;
use faqdesk_gateway::error::PERMISSION_EXPLANATION;
use faqdesk_gateway::payload::{BulkItemError, ListPage};
use faqdesk_gateway::{ActionEffect, ActionError, ActionResult, BulkOutcome};
use indexmap::IndexMap;

use crate::selection::Selection;

/// Paging position of one status bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketCursor {
    NotLoaded,
    More(String),
    Exhausted,
}

/// What a page merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    /// Already present, or not in an active status.
    pub dropped: usize,
}

#[derive(Debug)]
pub struct ListSynchronizer {
    items: IndexMap<ItemId, InboxItem>,
    cursors: HashMap<InboxStatus, BucketCursor>,
    selection: Selection,
    locked: HashSet<ItemId>,
    needs_refresh: bool,
}

impl Default for ListSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSynchronizer {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
            cursors: ACTIVE_STATUSES
                .iter()
                .map(|status| (*status, BucketCursor::NotLoaded))
                .collect(),
            selection: Selection::default(),
            locked: HashSet::new(),
            needs_refresh: false,
        }
    }

    /// Drop everything ahead of a fresh first-page load.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ---- paging ----

    /// Merge one page for `status`. Items whose id is already listed are
    /// dropped, never overwritten.
    pub fn merge_page(&mut self, status: InboxStatus, page: ListPage) -> MergeStats {
        let mut stats = MergeStats::default();
        for item in page.items {
            if !item.status.is_active() || self.items.contains_key(&item.id) {
                stats.dropped += 1;
                continue;
            }
            self.items.insert(item.id.clone(), item);
            stats.added += 1;
        }

        let cursor = match page.next_cursor.filter(|c| !c.is_empty()) {
            Some(next) => BucketCursor::More(next),
            None => BucketCursor::Exhausted,
        };
        self.cursors.insert(status, cursor);

        tracing::debug!(
            status = %status,
            added = stats.added,
            dropped = stats.dropped,
            total = self.items.len(),
            "Merged inbox page",
        );
        stats
    }

    pub fn cursor(&self, status: InboxStatus) -> &BucketCursor {
        self.cursors.get(&status).unwrap_or(&BucketCursor::NotLoaded)
    }

    /// Cursor for the next page of `status`, if there is one.
    pub fn next_cursor(&self, status: InboxStatus) -> Option<&str> {
        match self.cursor(status) {
            BucketCursor::More(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn has_more(&self, status: InboxStatus) -> bool {
        self.next_cursor(status).is_some()
    }

    // ---- single-item reconciliation ----

    /// Apply the outcome of a single-item action on `item_id`.
    pub fn apply(&mut self, item_id: &str, result: &ActionResult) {
        match result {
            Ok(success) => match &success.effect {
                ActionEffect::Removed { .. } | ActionEffect::Unchanged => self.remove(item_id),
                ActionEffect::Updated(fresh) => self.replace(fresh.as_ref().clone()),
            },
            Err(ActionError::NotFound { .. }) => self.remove(item_id),
            Err(ActionError::Conflict { .. }) => {
                tracing::warn!(item_id = %item_id, "Conflict reported; inbox needs a refresh");
                self.needs_refresh = true;
            }
            Err(ActionError::Permission { .. }) => {
                tracing::warn!(item_id = %item_id, "Permission denied; locking item");
                self.locked.insert(item_id.to_string());
                self.selection.remove(item_id);
            }
            Err(ActionError::Validation { .. } | ActionError::Failure { .. }) => {}
        }
    }

    /// Replace a listed item with an authoritative copy. A copy that is no
    /// longer active removes the item. Unlisted items are not added.
    pub fn replace(&mut self, fresh: InboxItem) {
        if !fresh.status.is_active() {
            self.remove(&fresh.id);
            return;
        }
        if let Some(slot) = self.items.get_mut(&fresh.id) {
            *slot = fresh;
        }
    }

    pub fn remove(&mut self, item_id: &str) {
        if self.items.shift_remove(item_id).is_some() {
            tracing::debug!(item_id = %item_id, "Removed item from active inbox");
        }
        self.selection.remove(item_id);
    }

    // ---- bulk reconciliation ----

    /// Remove the ids that succeeded, keep the failed ones, then clear the
    /// selection. Returns the aggregate failure notice, if any.
    pub fn apply_bulk(&mut self, outcome: &BulkOutcome) -> Option<String> {
        for id in &outcome.succeeded {
            self.items.shift_remove(id);
        }
        self.selection.clear();
        tracing::info!(
            action = %outcome.action,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Reconciled bulk action",
        );
        outcome.failure_notice()
    }

    // ---- selection ----

    /// Toggle a listed id. Unlisted and locked ids cannot be selected.
    pub fn toggle_selected(&mut self, item_id: &str) -> bool {
        if !self.items.contains_key(item_id) || self.locked.contains(item_id) {
            return false;
        }
        self.selection.toggle(item_id)
    }

    /// Select every listed id that is not locked.
    pub fn select_all(&mut self) {
        for id in self.items.keys().filter(|id| !self.locked.contains(*id)) {
            self.selection.insert(id.clone());
        }
    }

    /// Drop selected ids that `actor` may not act on: unlisted, locked, or
    /// assigned to someone else. Each dropped id is returned as a failure.
    pub fn prune_selection(&mut self, actor: &Actor) -> Vec<BulkItemError> {
        let mut refused = Vec::new();
        let (items, locked) = (&self.items, &self.locked);
        self.selection.retain(|id| {
            let problem = match items.get(id) {
                None => Some("Item is no longer in the inbox.".to_string()),
                Some(_) if locked.contains(id) => Some(PERMISSION_EXPLANATION.to_string()),
                Some(item) => check_ownership(item, actor).err().map(|e| e.to_string()),
            };
            match problem {
                Some(message) => {
                    refused.push(BulkItemError {
                        id: id.to_string(),
                        message: Some(message),
                    });
                    false
                }
                None => true,
            }
        });
        if !refused.is_empty() {
            tracing::debug!(
                refused = refused.len(),
                remaining = self.selection.len(),
                "Pruned selection before bulk action",
            );
        }
        refused
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ---- reads ----

    pub fn get(&self, item_id: &str) -> Option<&InboxItem> {
        self.items.get(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.keys().cloned().collect()
    }

    /// Owned copy of the collection, in listing order.
    pub fn snapshot(&self) -> Vec<InboxItem> {
        self.items.values().cloned().collect()
    }

    pub fn is_locked(&self, item_id: &str) -> bool {
        self.locked.contains(item_id)
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }
}
