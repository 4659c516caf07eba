//! Thread-shareable dispatcher handle
//!
//! Serializes every dispatch behind one mutex. The store is replaced only by a
//! single commit assignment, so a poisoned lock still guards consistent state
//! and is recovered rather than propagated.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::result::DispatchResult;

#[derive(Clone)]
pub struct SharedDispatcher(Arc<Mutex<Dispatcher>>);

impl SharedDispatcher {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self(Arc::new(Mutex::new(dispatcher)))
    }

    fn lock(&self) -> MutexGuard<'_, Dispatcher> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dispatch(&self, body: &Value) -> DispatchResult {
        self.lock().dispatch(body)
    }

    pub fn dispatch_raw(&self, raw: &str) -> DispatchResult {
        self.lock().dispatch_raw(raw)
    }

    /// Run a read-only query under the lock
    pub fn read<R>(&self, query: impl FnOnce(&Dispatcher) -> R) -> R {
        query(&self.lock())
    }
}

impl From<Dispatcher> for SharedDispatcher {
    fn from(dispatcher: Dispatcher) -> Self {
        Self::new(dispatcher)
    }
}
