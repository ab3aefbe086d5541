//! What a template hook sees of the tree.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::{Node, NodeId, Page};
use crate::render::RenderCtx;

/// Handle to one node of a live page, passed to every template hook.
///
/// Cheap to clone and `'static`, so hooks can move it into spawned work.
#[derive(Clone)]
pub struct Scope {
    page: Arc<Page>,
    id: NodeId,
}

impl Scope {
    pub(crate) fn new(page: Arc<Page>, id: NodeId) -> Self {
        Self { page, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn node(&self) -> &Node {
        self.page.node(self.id)
    }

    pub fn template_key(&self) -> &str {
        self.node().template_key()
    }

    pub fn path(&self) -> &str {
        self.node().path()
    }

    pub fn data(&self) -> &Map<String, Value> {
        self.node().data()
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data().get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    pub fn edit_mode(&self) -> bool {
        self.node().edit_mode()
    }

    /// Result of this node's fetch, once phase 1 has completed for it.
    pub fn fetched(&self) -> Option<Arc<Value>> {
        self.node().fetched()
    }

    /// This node's own context, once its `set_context` has resolved.
    pub fn render_ctx(&self) -> Option<Arc<RenderCtx>> {
        self.node().render_ctx()
    }

    pub fn parent(&self) -> Option<Scope> {
        self.node().parent().map(|id| self.at(id))
    }

    /// Parent, grandparent, ... up to and including the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Scope> + '_ {
        std::iter::successors(self.parent(), Scope::parent)
    }

    /// Scopes of the children in one area.
    pub fn children(&self, area: &str) -> Vec<Scope> {
        self.node().area(area).iter().map(|&id| self.at(id)).collect()
    }

    /// Look a field up for inheritance: this node, its ancestors in the tree,
    /// then the root data of each ancestor page record, nearest first.
    pub fn inherited(&self, key: &str) -> Option<&Value> {
        let mut current = Some(self.id);
        while let Some(id) = current {
            let node = self.page.node(id);
            if let Some(value) = node.data().get(key) {
                return Some(value);
            }
            current = node.parent();
        }
        self.page
            .info()
            .ancestors
            .iter()
            .find_map(|record| record.data.root.field(key))
    }

    fn at(&self, id: NodeId) -> Scope {
        Scope::new(Arc::clone(&self.page), id)
    }
}
