//! Per-node error containment.
//!
//! A failing hook never unwinds past its node. Instead:
//!
//! 1. [`Page::log_error`] flags the node (`had_error`, never cleared),
//! 2. the error is passed up the parent chain with the originating path,
//! 3. the root records it once in the page's sink and logs a warning.
//!
//! Flagged nodes are skipped by the context and render phases and contribute
//! empty output.

use parking_lot::Mutex;
use std::fmt;

use super::{NodeId, Page};
use crate::log;

/// A contained, recoverable error attributed to one subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentError {
    /// Path of the node where the error originated.
    pub path: String,
    pub template_key: String,
    pub message: String,
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path} [{}]: {}", self.template_key, self.message)
    }
}

/// Terminal sink owned by the page root.
#[derive(Debug, Default)]
pub(super) struct ErrorSink {
    entries: Mutex<Vec<ComponentError>>,
}

impl ErrorSink {
    fn record(&self, error: ComponentError) {
        log!("error"; "{error}");
        self.entries.lock().push(error);
    }

    pub(super) fn snapshot(&self) -> Vec<ComponentError> {
        self.entries.lock().clone()
    }
}

impl Page {
    /// Contain `err` at node `id`: flag the node and report it to the root.
    pub fn log_error(&self, id: NodeId, err: anyhow::Error) {
        let node = self.node(id);
        node.mark_error();
        let error = ComponentError {
            path: node.path().to_string(),
            template_key: node.template_key().to_string(),
            message: format!("{err:#}"),
        };
        self.pass_error(id, error);
    }

    /// Forward an error toward the root; the root records it.
    ///
    /// Unlike [`log_error`](Self::log_error) this does not flag `at`, which is
    /// how a node reports a problem with a child that was never created.
    pub(crate) fn pass_error(&self, at: NodeId, error: ComponentError) {
        match self.node(at).parent() {
            Some(parent) => self.pass_error(parent, error),
            None => self.errors.record(error),
        }
    }
}
