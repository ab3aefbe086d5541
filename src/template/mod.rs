//! Template implementations and their registry.
//!
//! A template is the behavior behind a `templateKey`. The hydrator looks the
//! key up in a [`TemplateRegistry`] and every live node of that key shares the
//! same `Arc<dyn Template>`; per-node state (data, fetched value, render
//! context) lives on the node and reaches the template through a [`Scope`].
//!
//! # Hooks
//!
//! | Hook               | Phase    | Default                               |
//! |--------------------|----------|---------------------------------------|
//! | `fetch`            | 1        | `Value::Null`                         |
//! | `set_context`      | 2        | inherit the parent's context          |
//! | `render`           | 3        | required                              |
//! | `render_variation` | variation| concatenate child outputs             |
//! | `resources`        | head     | no stylesheets or scripts             |
//! | `migrations`       | startup  | none                                  |

pub mod builtin;
mod registry;

pub use registry::TemplateRegistry;

use anyhow::Result;
use async_trait::async_trait;
use compact_str::CompactString;
use serde_json::Value;

use crate::migrate::Migration;
use crate::render::{AreaOutputs, RenderCtx};
use crate::tree::Scope;

/// Behavior of one template key.
///
/// Every hook may fail; failures are contained to the node that raised them
/// (see [`Page::log_error`](crate::tree::Page::log_error)).
#[async_trait]
pub trait Template: Send + Sync + 'static {
    /// Load whatever the component needs from outside the page record.
    ///
    /// Runs concurrently with every other node's fetch. Ancestor data and the
    /// page record are available through the scope.
    async fn fetch(&self, _scope: &Scope) -> Result<Value> {
        Ok(Value::Null)
    }

    /// Derive this node's render context from its parent's.
    ///
    /// Children only start their own `set_context` once this resolves.
    async fn set_context(&self, _scope: &Scope, parent: &RenderCtx) -> Result<RenderCtx> {
        Ok(parent.clone())
    }

    /// Produce HTML given the already rendered children, grouped by area.
    fn render(&self, scope: &Scope, children: &AreaOutputs) -> Result<String>;

    /// Produce a non-HTML output (e.g. a feed) from fetch-phase data only.
    fn render_variation(
        &self,
        _scope: &Scope,
        _extension: &str,
        children: &AreaOutputs,
    ) -> Result<String> {
        Ok(children.concat())
    }

    /// Stylesheets and scripts this template needs in the page head.
    fn resources(&self) -> Resources {
        Resources::default()
    }

    /// Schema history of this template's stored data.
    ///
    /// Collected once into a [`MigrationRegistry`](crate::migrate::MigrationRegistry)
    /// by [`MigrationRegistry::from_templates`](crate::migrate::MigrationRegistry::from_templates).
    fn migrations(&self) -> Vec<Migration> {
        Vec::new()
    }
}

/// Head resources declared by a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    pub stylesheets: Vec<CompactString>,
    pub scripts: Vec<CompactString>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stylesheet(mut self, href: impl Into<CompactString>) -> Self {
        self.stylesheets.push(href.into());
        self
    }

    pub fn script(mut self, src: impl Into<CompactString>) -> Self {
        self.scripts.push(src.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stylesheets.is_empty() && self.scripts.is_empty()
    }
}
