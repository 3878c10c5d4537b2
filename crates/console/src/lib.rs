//! Workflow coordination for the inbox console.
//!
//! The [`ListSynchronizer`](sync::ListSynchronizer) is the only writer of
//! the active item collection. The
//! [`WorkflowOrchestrator`](orchestrator::WorkflowOrchestrator) routes list
//! loads and action results through it, fencing stale responses on the way.

pub mod config;
pub mod debounce;
pub mod fence;
pub mod orchestrator;
pub mod selection;
pub mod sync;
