//! Domain logic for the inbox review workflow.
//!
//! Everything in this crate is pure: no network, no clocks beyond
//! timestamps carried on the data, no shared mutable state. The gateway and
//! console crates build on these types.

pub mod citation;
pub mod draft;
pub mod error;
pub mod inbox;
pub mod manual_faq;
pub mod review_request;
pub mod roles;
pub mod types;
pub mod workflow;
