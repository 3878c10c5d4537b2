//! Per-key request sequencing.
//!
//! Every dispatched request takes a token for its key (an item id, or the
//! list itself). When the response arrives it is applied only if its token
//! is still the latest one issued for that key.

use std::collections::HashMap;

/// Proof of dispatch order for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceToken {
    key: String,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct RequestFence {
    next_seq: u64,
    latest: HashMap<String, u64>,
}

impl RequestFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new request, superseding any earlier one.
    pub fn issue(&mut self, key: impl Into<String>) -> FenceToken {
        self.next_seq += 1;
        let key = key.into();
        self.latest.insert(key.clone(), self.next_seq);
        FenceToken {
            key,
            seq: self.next_seq,
        }
    }

    /// The most recently issued token for `key`, if any.
    pub fn current(&self, key: &str) -> Option<FenceToken> {
        self.latest.get(key).map(|seq| FenceToken {
            key: key.to_string(),
            seq: *seq,
        })
    }

    pub fn is_latest(&self, token: &FenceToken) -> bool {
        self.latest.get(&token.key) == Some(&token.seq)
    }

    /// Settle a completed request. Returns whether its response may be
    /// applied. The token stays current until a newer one is issued.
    pub fn finish(&self, token: &FenceToken) -> bool {
        let applied = self.is_latest(token);
        if !applied {
            tracing::trace!(key = %token.key, seq = token.seq, "Request superseded");
        }
        applied
    }
}
