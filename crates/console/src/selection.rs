//! Ids chosen for a bulk action.

use faqdesk_core::types::ItemId;
use indexmap::IndexSet;

/// Insertion-ordered set of selected ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: IndexSet<ItemId>,
}

impl Selection {
    /// Flip `id` in or out. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.shift_remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn insert(&mut self, id: impl Into<ItemId>) {
        self.ids.insert(id.into());
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.shift_remove(id);
    }

    /// Keep only ids for which `keep` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.ids.retain(|id| keep(id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.ids.iter().cloned().collect()
    }
}
