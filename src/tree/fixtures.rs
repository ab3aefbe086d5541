//! Test templates that record what the pipeline asks of them.

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::sync::{Barrier, Notify};

use super::{Page, Scope, hydrate};
use crate::data::{ComponentData, PageData, PageRecord, SchemaVersion};
use crate::render::{AreaOutputs, RenderCtx};
use crate::template::{Resources, Template, TemplateRegistry};

/// Hook a stub should fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fail {
    Fetch,
    Context,
    Render,
    Variation,
    PanicFetch,
    PanicContext,
}

/// Synchronization a stub performs before recording its hook.
#[derive(Clone)]
pub(crate) enum Gate {
    /// Fetch waits until every party has reached the barrier.
    FetchBarrier(Arc<Barrier>),
    /// Fetch sleeps first.
    FetchDelay(Duration),
    /// `set_context` waits for a permit.
    ContextWait(Arc<Notify>),
    /// `set_context` hands out a permit.
    ContextOpen(Arc<Notify>),
}

/// Shared, ordered log of hook invocations (`"fetch /main/0"`, ...).
#[derive(Debug, Clone, Default)]
pub(crate) struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    fn push(&self, event: String) {
        self.0.lock().push(event);
    }

    pub(crate) fn all(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub(crate) fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == event)
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.0.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Configurable template.
///
/// - fetch returns the node's `feed` field (or null)
/// - render wraps `body` and the children in `<tag>`; the root also emits head content
/// - variation emits the fetched string followed by the children
#[derive(Clone)]
pub(crate) struct Stub {
    tag: &'static str,
    events: Events,
    fail: Option<Fail>,
    nest: bool,
    resources: Resources,
    gate: Option<Gate>,
}

impl Stub {
    pub(crate) fn new(tag: &'static str, events: &Events) -> Self {
        Self {
            tag,
            events: events.clone(),
            fail: None,
            nest: false,
            resources: Resources::default(),
            gate: None,
        }
    }

    pub(crate) fn failing(mut self, fail: Fail) -> Self {
        self.fail = Some(fail);
        self
    }

    /// Hand children a context one heading level deeper.
    pub(crate) fn nesting(mut self) -> Self {
        self.nest = true;
        self
    }

    pub(crate) fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    pub(crate) fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl Template for Stub {
    async fn fetch(&self, scope: &Scope) -> Result<Value> {
        tokio::task::yield_now().await;
        match &self.gate {
            Some(Gate::FetchBarrier(barrier)) => {
                barrier.wait().await;
            }
            Some(Gate::FetchDelay(delay)) => tokio::time::sleep(*delay).await,
            _ => {}
        }
        self.events.push(format!("fetch {}", scope.path()));
        match self.fail {
            Some(Fail::Fetch) => bail!("boom"),
            Some(Fail::PanicFetch) => panic!("fetch exploded"),
            _ => Ok(scope.field("feed").cloned().unwrap_or(Value::Null)),
        }
    }

    async fn set_context(&self, scope: &Scope, parent: &RenderCtx) -> Result<RenderCtx> {
        tokio::task::yield_now().await;
        match &self.gate {
            Some(Gate::ContextWait(gate)) => gate.notified().await,
            Some(Gate::ContextOpen(gate)) => gate.notify_one(),
            _ => {}
        }
        self.events
            .push(format!("ctx {} {}", scope.path(), parent.header_level));
        match self.fail {
            Some(Fail::Context) => bail!("context failed"),
            Some(Fail::PanicContext) => panic!("context exploded"),
            _ if self.nest => Ok(parent.nested()),
            _ => Ok(parent.clone()),
        }
    }

    fn render(&self, scope: &Scope, children: &AreaOutputs) -> Result<String> {
        self.events.push(format!("render {}", scope.path()));
        if self.fail == Some(Fail::Render) {
            bail!("render failed");
        }
        let tag = self.tag;
        if scope.node().is_root() {
            let head = scope.page().head_content();
            return Ok(format!("<{tag}>{head}{}</{tag}>", children.concat()));
        }
        let body = scope.str_field("body").unwrap_or_default();
        Ok(format!("<{tag}>{body}{}</{tag}>", children.concat()))
    }

    fn render_variation(
        &self,
        scope: &Scope,
        extension: &str,
        children: &AreaOutputs,
    ) -> Result<String> {
        self.events
            .push(format!("variation {} {extension}", scope.path()));
        if self.fail == Some(Fail::Variation) {
            bail!("variation failed");
        }
        let fetched = scope.fetched();
        let own = fetched.as_deref().and_then(Value::as_str).unwrap_or_default();
        Ok(format!("{own}{}", children.concat()))
    }

    fn resources(&self) -> Resources {
        self.resources.clone()
    }
}

/// Registry of stubs sharing one event log.
///
/// Page: `home`. Components: `section` (nests headings), `text`, `list`, and
/// one failing key per hook (`fail-fetch`, `fail-ctx`, ...).
pub(crate) fn registry_with(events: &Events) -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    registry
        .register_page("home", Stub::new("page", events))
        .register_component("section", Stub::new("section", events).nesting())
        .register_component("text", Stub::new("p", events))
        .register_component("list", Stub::new("ul", events))
        .register_component("fail-fetch", Stub::new("p", events).failing(Fail::Fetch))
        .register_component("fail-ctx", Stub::new("p", events).failing(Fail::Context))
        .register_component("fail-render", Stub::new("p", events).failing(Fail::Render))
        .register_component(
            "fail-variation",
            Stub::new("p", events).failing(Fail::Variation),
        )
        .register_component("panic-fetch", Stub::new("p", events).failing(Fail::PanicFetch))
        .register_component("panic-ctx", Stub::new("p", events).failing(Fail::PanicContext));
    registry
}

pub(crate) fn registry() -> TemplateRegistry {
    registry_with(&Events::default())
}

pub(crate) fn record_of(root: ComponentData) -> PageRecord {
    PageRecord::new("page-1", PageData::new(root, SchemaVersion::default()))
}

pub(crate) fn page_of(root: ComponentData, registry: &TemplateRegistry) -> Arc<Page> {
    hydrate(&record_of(root), registry, false).expect("fixture page hydrates")
}
