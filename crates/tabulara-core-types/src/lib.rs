//! Core types shared across Tabulara facilities
//!
//! This crate provides foundational types used by the error facility, the
//! logging facility and the dispatcher:
//!
//! - **Correlation types**: CommandId, RequestId, RequestContext
//! - **Schema constants**: Canonical log field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{CommandId, RequestContext, RequestId};
