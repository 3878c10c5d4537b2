//! Inbox API boundary.
//!
//! Provides the [`InboxApi`] seam and its reqwest implementation, the
//! request/response payloads, the single error-normalization step that turns
//! any HTTP failure into an [`ActionError`], and the [`ActionGateway`] that
//! gates, serializes and classifies every workflow action.

pub mod api;
pub mod error;
pub mod gateway;
pub mod http;
pub mod intent;
pub mod payload;

pub use api::InboxApi;
pub use error::{ActionError, ErrorKind, FieldError};
pub use gateway::{
    ActionEffect, ActionGateway, ActionResult, ActionSuccess, BulkOutcome, GatewayOptions,
};
pub use http::HttpInboxApi;
pub use intent::{ApproveIntent, PromoteIntent, PublishIntent, PublishRequest};
