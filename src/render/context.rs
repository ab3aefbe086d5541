//! Phase 2: top-down render context.
//!
//! Each node awaits its own `set_context` and only then starts its children,
//! which run concurrently with each other. Context therefore flows strictly
//! parent → child while sibling subtrees proceed independently.

use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::{collections::BTreeMap, future::Future, pin::Pin, sync::Arc};
use tokio::task::JoinSet;

use super::tasks;
use crate::tree::{NodeId, Page, Scope};

/// Deepest HTML heading level.
const MAX_HEADER_LEVEL: u8 = 6;

/// Headers and metadata of the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl RequestMeta {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Per-node state propagated from parent to child.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCtx {
    /// Heading level for the node's own title, starting at 1 on the root.
    pub header_level: u8,
    pub request: Arc<RequestMeta>,
    /// Free-form values a template hands down to its subtree.
    pub values: Map<String, Value>,
}

impl RenderCtx {
    pub fn new(request: RequestMeta) -> Self {
        Self {
            header_level: 1,
            request: Arc::new(request),
            values: Map::new(),
        }
    }

    /// Context one heading level deeper, capped at `<h6>`.
    pub fn nested(&self) -> Self {
        Self {
            header_level: self.header_level.saturating_add(1).min(MAX_HEADER_LEVEL),
            ..self.clone()
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

type SubtreeFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Run phase 2 from the root with `initial` as its inbound context.
pub(super) async fn apply_context(page: &Arc<Page>, initial: RenderCtx) {
    spawn_subtrees(page, &[NodeId::ROOT], Arc::new(initial)).await;
}

/// Start one task per subtree and wait for all of them.
///
/// A panicking `set_context` is contained at the node whose task it was.
async fn spawn_subtrees(page: &Arc<Page>, roots: &[NodeId], inbound: Arc<RenderCtx>) {
    let mut set = JoinSet::new();
    let mut owners = tasks::Owners::default();
    for &id in roots {
        let handle = set.spawn(context_subtree(Arc::clone(page), id, Arc::clone(&inbound)));
        owners.insert(&handle, id);
    }

    while let Some(joined) = set.join_next().await {
        if let Err(err) = joined {
            owners.contain(page, err, "set_context");
        }
    }
}

fn context_subtree(page: Arc<Page>, id: NodeId, inbound: Arc<RenderCtx>) -> SubtreeFuture {
    Box::pin(async move {
        let node = page.node(id);
        if node.had_error() {
            return;
        }

        let template = Arc::clone(node.template());
        let scope = Scope::new(Arc::clone(&page), id);
        let ctx = match template.set_context(&scope, &inbound).await {
            Ok(ctx) => Arc::new(ctx),
            Err(err) => {
                page.log_error(id, err);
                return;
            }
        };
        node.set_render_ctx(Arc::clone(&ctx));

        let children: SmallVec<[NodeId; 8]> = node.children().collect();
        if !children.is_empty() {
            spawn_subtrees(&page, &children, ctx).await;
        }
    })
}
