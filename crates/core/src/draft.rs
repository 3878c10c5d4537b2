//! Keyed draft store for in-progress forms.
//!
//! Drafts are held as serialized JSON so that any form type round-trips the
//! same way it would through session storage. Keys are scoped per actor.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Draft scope for the manual FAQ creation form.
pub const SCOPE_MANUAL_FAQ: &str = "manual_faq";

/// Build the storage key for an actor's draft in a given scope.
pub fn draft_key(actor_id: &str, scope: &str) -> String {
    format!("{scope}:{actor_id}")
}

/// In-memory draft storage with load / save / clear.
#[derive(Debug, Default)]
pub struct DraftStore {
    entries: HashMap<String, String>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a draft, replacing any previous one under the same key.
    pub fn save<T: Serialize>(&mut self, key: &str, draft: &T) -> Result<(), CoreError> {
        let encoded = serde_json::to_string(draft)
            .map_err(|e| CoreError::Internal(format!("Failed to encode draft: {e}")))?;
        self.entries.insert(key.to_string(), encoded);
        Ok(())
    }

    /// Load a draft. An entry that no longer decodes as `T` is discarded.
    pub fn load<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let encoded = self.entries.get(key)?;
        match serde_json::from_str(encoded) {
            Ok(draft) => Some(draft),
            Err(_) => {
                self.entries.remove(key);
                None
            }
        }
    }

    pub fn clear(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
