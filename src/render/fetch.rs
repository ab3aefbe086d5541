//! Phase 1: fetch every node concurrently.

use std::sync::Arc;
use tokio::task::JoinSet;

use super::tasks;
use crate::tree::{Page, Scope};

/// Run every node's `fetch` as its own task and wait for all of them.
///
/// Nodes are collected pre-order into a flat list; there is no ordering
/// between any two fetches. A failure leaves that node's `fetched` empty and
/// flags it, without touching any other node.
pub(super) async fn fetch_all(page: &Arc<Page>) {
    let mut set = JoinSet::new();
    let mut owners = tasks::Owners::default();

    for id in page.preorder() {
        let template = Arc::clone(page.node(id).template());
        let scope = Scope::new(Arc::clone(page), id);
        let handle = set.spawn(async move { (id, template.fetch(&scope).await) });
        owners.insert(&handle, id);
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((id, Ok(value))) => page.node(id).set_fetched(value),
            Ok((id, Err(err))) => page.log_error(id, err.context("fetch failed")),
            Err(err) => owners.contain(page, err, "fetch"),
        }
    }
}
