//! Tabulara Engine - dispatcher facade over the command core
//!
//! Owns one store and one idempotency ledger, runs the validation stages in
//! order and shapes every outcome into a `DispatchResult` that a transport can
//! map straight onto a status code and JSON body.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod result;
pub mod shared;

pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use result::{DispatchOutcome, DispatchResult};
pub use shared::SharedDispatcher;
