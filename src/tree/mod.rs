//! Live component tree.
//!
//! Hydration turns a [`PageRecord`](crate::data::PageRecord) into a [`Page`]:
//! an arena of [`Node`]s where parent and page links are indices, so the tree
//! has a single owner and no reference cycles.
//!
//! ```text
//! Page
//! ├── nodes[0]  root       path ""            parent None
//! ├── nodes[1]  text       path "/main/0"     parent 0
//! ├── nodes[2]  section    path "/main/1"     parent 0
//! └── nodes[3]  heading    path "/main/1/body/0" parent 2
//! ```
//!
//! Nodes are stored in pre-order. Everything that is written during a render
//! (error flag, fetched value, render context) sits behind a per-node lock so
//! the page can be shared across the tasks of one render invocation.

mod error;
mod hydrate;
mod report;
mod scope;

pub use error::HydrateError;
pub use hydrate::hydrate;
pub use report::ComponentError;
pub use scope::Scope;

use compact_str::CompactString;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::{fmt, sync::Arc};

use crate::data::{PageRecord, SchemaVersion};
use crate::render::RenderCtx;
use crate::template::Template;
use report::ErrorSink;

/// Index of a node inside its page's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The page root is always the first node.
    pub const ROOT: NodeId = NodeId(0);

    pub const fn index(self) -> usize {
        self.0
    }
}

/// A named slot holding ordered children.
#[derive(Debug, Clone)]
pub struct Area {
    pub name: CompactString,
    pub children: Vec<NodeId>,
}

/// Per-invocation mutable state of a node.
#[derive(Debug, Default)]
struct NodeState {
    had_error: bool,
    fetched: Option<Arc<Value>>,
    render_ctx: Option<Arc<RenderCtx>>,
}

/// One hydrated component.
pub struct Node {
    id: NodeId,
    template_key: CompactString,
    template: Arc<dyn Template>,
    data: Map<String, Value>,
    areas: Vec<Area>,
    path: String,
    parent: Option<NodeId>,
    page: NodeId,
    edit_mode: bool,
    state: Mutex<NodeState>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn template_key(&self) -> &str {
        &self.template_key
    }

    pub(crate) fn template(&self) -> &Arc<dyn Template> {
        &self.template
    }

    /// Own fields, without `templateKey` and `areas`.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Children of one area, empty if the area does not exist.
    pub fn area(&self, name: &str) -> &[NodeId] {
        self.areas
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.children.as_slice())
            .unwrap_or(&[])
    }

    /// All children across areas, in area order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.areas.iter().flat_map(|a| a.children.iter().copied())
    }

    /// Address from the root: `""` for the root, `/<area>/<index>` appended per level.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The page root this node belongs to.
    pub fn page(&self) -> NodeId {
        self.page
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn had_error(&self) -> bool {
        self.state.lock().had_error
    }

    pub fn fetched(&self) -> Option<Arc<Value>> {
        self.state.lock().fetched.clone()
    }

    pub fn render_ctx(&self) -> Option<Arc<RenderCtx>> {
        self.state.lock().render_ctx.clone()
    }

    pub(crate) fn set_fetched(&self, value: Value) {
        self.state.lock().fetched = Some(Arc::new(value));
    }

    pub(crate) fn set_render_ctx(&self, ctx: Arc<RenderCtx>) {
        self.state.lock().render_ctx = Some(ctx);
    }

    /// Set the error flag. It is never cleared for the rest of the invocation.
    fn mark_error(&self) {
        self.state.lock().had_error = true;
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("template_key", &self.template_key)
            .field("path", &self.path)
            .field("parent", &self.parent)
            .field("areas", &self.areas)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

/// Page-level identity copied from the record envelope.
#[derive(Debug, Clone)]
pub struct PageInfo {
    pub id: String,
    pub link_id: String,
    pub path: String,
    pub site: Map<String, Value>,
    pub saved_at_version: SchemaVersion,
    /// Parent pages, nearest first.
    pub ancestors: Vec<PageRecord>,
}

/// Root of a hydrated tree and owner of every node in it.
pub struct Page {
    nodes: Vec<Node>,
    info: PageInfo,
    errors: ErrorSink,
    head_content: Mutex<String>,
}

impl Page {
    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.0]
    }

    /// # Panics
    ///
    /// Panics if `id` belongs to another page.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Nodes in pre-order (root first, then each area's children depth-first).
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids collected by an explicit pre-order walk from the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            let children: SmallVec<[NodeId; 8]> = self.node(id).children().collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }

    /// Look a node up by its path.
    pub fn find(&self, path: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.path == path)
    }

    pub fn info(&self) -> &PageInfo {
        &self.info
    }

    /// Stylesheet and script tags collected after the context phase.
    pub fn head_content(&self) -> String {
        self.head_content.lock().clone()
    }

    pub(crate) fn set_head_content(&self, head: String) {
        *self.head_content.lock() = head;
    }

    /// Every error contained so far, in the order they were reported.
    pub fn errors(&self) -> Vec<ComponentError> {
        self.errors.snapshot()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("info", &self.info)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
