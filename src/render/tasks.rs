//! Attribution of failed tasks back to the node that spawned them.

use anyhow::anyhow;
use rustc_hash::FxHashMap;
use std::any::Any;
use tokio::task::{AbortHandle, Id, JoinError};

use crate::tree::{NodeId, Page};

/// Task id → node, for the tasks of one `JoinSet`.
#[derive(Debug, Default)]
pub(super) struct Owners(FxHashMap<Id, NodeId>);

impl Owners {
    pub(super) fn insert(&mut self, handle: &AbortHandle, node: NodeId) {
        self.0.insert(handle.id(), node);
    }

    /// Contain a join failure at the node that owned the task.
    pub(super) fn contain(&self, page: &Page, err: JoinError, hook: &str) {
        let Some(&node) = self.0.get(&err.id()) else {
            return;
        };
        let err = if err.is_panic() {
            anyhow!("{hook} panicked: {}", panic_message(err.into_panic()))
        } else {
            anyhow!("{hook} was cancelled")
        };
        page.log_error(node, err);
    }
}

pub(super) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "unknown panic".to_string(), |s| (*s).to_string()),
    }
}
