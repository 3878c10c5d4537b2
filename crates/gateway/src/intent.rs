//! Publish intents.
//!
//! Approving and promoting hit different endpoints with different bodies.
//! The choice is made once per submission by [`PublishIntent::resolve`] and
//! each variant carries only the fields valid for it.

use faqdesk_core::citation::CitationRow;
use faqdesk_core::inbox::ItemSource;
use faqdesk_core::workflow::InboxAction;

/// Non-FAQ approval: marks the item approved and triggers re-embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveIntent {
    pub reembed: bool,
    pub answer: Option<String>,
}

/// FAQ path: the item becomes a verified knowledge-base entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoteIntent {
    pub answer: Option<String>,
    pub title: Option<String>,
    /// Replacement citation rows, validated at submission. No non-blank
    /// rows means "use the item's attached ones".
    pub citations: Vec<CitationRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishIntent {
    Approve(ApproveIntent),
    Promote(PromoteIntent),
}

/// Raw user input from the publish form, before the path is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishRequest {
    pub wants_faq: bool,
    pub answer: Option<String>,
    pub title: Option<String>,
    pub citations: Vec<CitationRow>,
}

impl PublishIntent {
    /// Pick the FAQ path only when FAQ creation is enabled AND the caller
    /// asked for it. Fields that do not belong to the chosen path are dropped.
    pub fn resolve(faq_enabled: bool, request: PublishRequest) -> Self {
        let clean = |s: Option<String>| {
            s.map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if faq_enabled && request.wants_faq {
            Self::Promote(PromoteIntent {
                answer: clean(request.answer),
                title: clean(request.title),
                citations: request.citations,
            })
        } else {
            Self::Approve(ApproveIntent {
                reembed: true,
                answer: clean(request.answer),
            })
        }
    }

    /// The workflow action this intent performs on an item from `source`.
    /// Review-request items promote through `convert_to_faq`.
    pub fn action_for(&self, source: ItemSource) -> InboxAction {
        match self {
            Self::Approve(_) => InboxAction::Approve,
            Self::Promote(_) if source.is_review_request() => InboxAction::ConvertToFaq,
            Self::Promote(_) => InboxAction::Promote,
        }
    }

    pub fn is_faq(&self) -> bool {
        matches!(self, Self::Promote(_))
    }
}
