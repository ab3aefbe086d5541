//! Phase 3 and the variation path: bottom-up output.

use compact_str::CompactString;
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use super::tasks;
use crate::tree::{NodeId, Page, Scope};

/// Rendered outputs of a node's children, grouped by area.
///
/// Areas keep their order; a child that failed or was flagged appears as an
/// empty string so positions line up with the node's areas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaOutputs {
    areas: Vec<(CompactString, Vec<String>)>,
}

impl AreaOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, area: impl Into<CompactString>, outputs: Vec<String>) {
        self.areas.push((area.into(), outputs));
    }

    /// Outputs of one area; empty if the node has no such area.
    pub fn get(&self, area: &str) -> &[String] {
        self.areas
            .iter()
            .find(|(name, _)| name == area)
            .map(|(_, outputs)| outputs.as_slice())
            .unwrap_or(&[])
    }

    /// One area's outputs joined without separator.
    pub fn joined(&self, area: &str) -> String {
        self.get(area).concat()
    }

    /// Every area's outputs joined, in area order.
    pub fn concat(&self) -> String {
        self.areas
            .iter()
            .flat_map(|(_, outputs)| outputs.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn area_names(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.areas.iter().all(|(_, outputs)| outputs.is_empty())
    }
}

/// Render `id` and its subtree to HTML, children first.
pub(super) fn render_html(page: &Arc<Page>, id: NodeId) -> String {
    render_with(page, id, &|scope, children| {
        scope.node().template().render(scope, children)
    })
}

/// Render `id` and its subtree as the variation `extension`, children first.
pub(super) fn render_variation(page: &Arc<Page>, id: NodeId, extension: &str) -> String {
    render_with(page, id, &|scope, children| {
        scope
            .node()
            .template()
            .render_variation(scope, extension, children)
    })
}

type RenderHook<'a> = dyn Fn(&Scope, &AreaOutputs) -> anyhow::Result<String> + 'a;

fn render_with(page: &Arc<Page>, id: NodeId, hook: &RenderHook<'_>) -> String {
    let node = page.node(id);
    if node.had_error() {
        return String::new();
    }

    let mut children = AreaOutputs::new();
    for area in node.areas() {
        let outputs = area
            .children
            .iter()
            .map(|&child| render_with(page, child, hook))
            .collect();
        children.push(area.name.clone(), outputs);
    }

    let scope = Scope::new(Arc::clone(page), id);
    match catch_unwind(AssertUnwindSafe(|| hook(&scope, &children))) {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            page.log_error(id, err.context("render failed"));
            String::new()
        }
        Err(payload) => {
            let reason = tasks::panic_message(payload);
            page.log_error(id, anyhow::anyhow!("render panicked: {reason}"));
            String::new()
        }
    }
}
