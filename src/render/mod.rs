//! Three-phase rendering of a hydrated page.
//!
//! # Pipeline
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!  Page ───► │ Phase 1: fetch    every node, all at once    │
//!            └──────────────────────┬───────────────────────┘
//!                                   │ barrier
//!                 ext != html ──────┼──────────────► variation (bottom-up) ──► String
//!                                   ▼
//!            ┌──────────────────────────────────────────────┐
//!            │ Phase 2: context  parent before child,       │
//!            │                   siblings concurrently      │
//!            └──────────────────────┬───────────────────────┘
//!                                   │ barrier, head content assembled
//!                                   ▼
//!            ┌──────────────────────────────────────────────┐
//!            │ Phase 3: render   children before parent     │
//!            └──────────────────────┬───────────────────────┘
//!                                   ▼
//!                                 String
//! ```
//!
//! No hook failure escapes [`render`]; each one is contained at its node (see
//! [`Page::log_error`]) and the node contributes an empty string.

mod context;
mod fetch;
mod head;
mod output;
mod tasks;

pub use context::{RenderCtx, RequestMeta};
pub use output::AreaOutputs;

use compact_str::CompactString;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::tree::{ComponentError, NodeId, Page};

/// Extension of the standard HTML output; anything else is a variation.
pub const HTML_EXTENSION: &str = "html";

/// What the caller asks of one render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output extension, without the leading dot.
    pub extension: CompactString,
    /// Request headers and metadata handed to the root context.
    pub request: RequestMeta,
    /// Values seeded into the root context, visible to every node.
    pub values: Map<String, Value>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            extension: CompactString::const_new(HTML_EXTENSION),
            request: RequestMeta::default(),
            values: Map::new(),
        }
    }
}

impl RenderOptions {
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = normalize_extension(extension);
        self
    }

    pub fn with_request(mut self, request: RequestMeta) -> Self {
        self.request = request;
        self
    }

    pub fn with_values(mut self, values: Map<String, Value>) -> Self {
        self.values = values;
        self
    }

    pub fn is_variation(&self) -> bool {
        normalize_extension(&self.extension) != HTML_EXTENSION
    }
}

/// Lowercase, strip a leading dot, and treat empty as HTML.
pub fn normalize_extension(extension: &str) -> CompactString {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        CompactString::const_new(HTML_EXTENSION)
    } else {
        CompactString::from(trimmed.to_ascii_lowercase())
    }
}

/// Output of a render plus every error contained along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub output: String,
    pub errors: Vec<ComponentError>,
}

/// Run the pipeline over `page`.
///
/// Must be called inside a tokio runtime: fetches and context calls run as
/// tasks. The page is meant for one invocation; its error flags and fetched
/// values are not reset.
pub async fn render(page: &Arc<Page>, options: &RenderOptions) -> Rendered {
    fetch::fetch_all(page).await;

    let output = if options.is_variation() {
        let extension = normalize_extension(&options.extension);
        output::render_variation(page, NodeId::ROOT, &extension)
    } else {
        let initial = RenderCtx {
            values: options.values.clone(),
            ..RenderCtx::new(options.request.clone())
        };
        context::apply_context(page, initial).await;
        page.set_head_content(head::assemble(page));
        output::render_html(page, NodeId::ROOT)
    };

    Rendered {
        output,
        errors: page.errors(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ComponentData;
    use crate::template::Resources;
    use crate::tree::fixtures::{Events, Gate, Stub, page_of, registry, registry_with};
    use crate::tree::Scope;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(""), "html");
        assert_eq!(normalize_extension(".RSS"), "rss");
        assert_eq!(normalize_extension("json"), "json");
        assert!(!RenderOptions::default().is_variation());
        assert!(RenderOptions::default().with_extension("rss").is_variation());
        assert!(!RenderOptions::default().with_extension(".HTML").is_variation());
    }

    #[tokio::test]
    async fn test_full_render() {
        let root = ComponentData::new("home").with_child(
            "main",
            ComponentData::new("section")
                .with_child("body", ComponentData::new("text").with_field("body", "a"))
                .with_child("body", ComponentData::new("text").with_field("body", "b")),
        );
        let page = page_of(root, &registry());

        let rendered = render(&page, &RenderOptions::default()).await;
        assert_eq!(
            rendered.output,
            "<page><section><p>a</p><p>b</p></section></page>"
        );
        assert!(rendered.errors.is_empty());
    }

    // A failing fetch blanks only its own node.
    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let events = Events::default();
        let root = ComponentData::new("home")
            .with_child("main", ComponentData::new("text").with_field("body", "left"))
            .with_child("main", ComponentData::new("fail-fetch").with_field("body", "x"))
            .with_child(
                "main",
                ComponentData::new("text")
                    .with_field("body", "right")
                    .with_field("feed", "kept"),
            );
        let page = page_of(root, &registry_with(&events));

        let rendered = render(&page, &RenderOptions::default()).await;

        assert_eq!(rendered.output, "<page><p>left</p><p>right</p></page>");
        assert_eq!(rendered.errors.len(), 1);
        assert_eq!(rendered.errors[0].path, "/main/1");
        assert!(rendered.errors[0].message.contains("boom"));

        // Siblings keep their fetched values; the failed node has none
        assert!(page.find("/main/1").unwrap().fetched().is_none());
        assert_eq!(
            page.find("/main/2").unwrap().fetched().as_deref(),
            Some(&serde_json::json!("kept"))
        );

        // Never asked for context or render
        assert_eq!(events.position("ctx /main/1 1"), None);
        assert_eq!(events.position("render /main/1"), None);
        assert!(events.position("render /main/2").is_some());
    }

    // Failures in every phase still produce a page.
    #[tokio::test]
    async fn test_errors_in_every_phase_never_abort() {
        let root = ComponentData::new("home")
            .with_child("main", ComponentData::new("fail-fetch"))
            .with_child("main", ComponentData::new("fail-ctx"))
            .with_child("main", ComponentData::new("fail-render"))
            .with_child("main", ComponentData::new("panic-fetch"))
            .with_child("main", ComponentData::new("panic-ctx"))
            .with_child("main", ComponentData::new("text").with_field("body", "ok"));
        let page = page_of(root, &registry());

        let rendered = render(&page, &RenderOptions::default()).await;

        assert_eq!(rendered.output, "<page><p>ok</p></page>");
        let mut paths: Vec<_> = rendered.errors.iter().map(|e| e.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["/main/0", "/main/1", "/main/2", "/main/3", "/main/4"]);
    }

    #[tokio::test]
    async fn test_root_failure_still_returns_string() {
        let events = Events::default();
        let mut registry = registry_with(&events);
        registry.register_page(
            "broken",
            Stub::new("page", &events).failing(crate::tree::fixtures::Fail::Render),
        );
        let root = ComponentData::new("broken")
            .with_child("main", ComponentData::new("text").with_field("body", "a"));
        let page = page_of(root, &registry);

        let rendered = render(&page, &RenderOptions::default()).await;
        assert_eq!(rendered.output, "");
        assert_eq!(rendered.errors.len(), 1);
        assert_eq!(rendered.errors[0].path, "");
    }

    // A variation skips context and render entirely.
    #[tokio::test]
    async fn test_variation_skips_context_and_render() {
        let events = Events::default();
        let root = ComponentData::new("home")
            .with_field("feed", "<rss>")
            .with_child("main", ComponentData::new("text").with_field("feed", "<item>1</item>"))
            .with_child("main", ComponentData::new("fail-fetch").with_field("feed", "lost"))
            .with_child("main", ComponentData::new("text").with_field("feed", "<item>2</item>"));
        let page = page_of(root, &registry_with(&events));

        let rendered = render(&page, &RenderOptions::default().with_extension("rss")).await;

        assert_eq!(rendered.output, "<rss><item>1</item><item>2</item>");
        assert_eq!(events.count("ctx "), 0);
        assert_eq!(events.count("render "), 0);
        assert_eq!(events.count("variation "), 3);
        assert!(events.position("variation /main/1 rss").is_none());
        assert!(page.root().render_ctx().is_none());
    }

    #[tokio::test]
    async fn test_head_content_reaches_root_render() {
        let events = Events::default();
        let mut registry = registry_with(&events);
        registry.register_component(
            "gallery",
            Stub::new("div", &events).with_resources(
                Resources::new()
                    .stylesheet("/css/gallery.css")
                    .script("/js/gallery.js"),
            ),
        );
        let root = ComponentData::new("home")
            .with_child("main", ComponentData::new("gallery"))
            .with_child("main", ComponentData::new("gallery"));
        let page = page_of(root, &registry);

        let rendered = render(&page, &RenderOptions::default()).await;

        assert_eq!(
            rendered.output,
            "<page><link rel=\"stylesheet\" href=\"/css/gallery.css\">\
             <script src=\"/js/gallery.js\" defer></script>\
             <div></div><div></div></page>"
        );
    }

    #[tokio::test]
    async fn test_context_waits_for_every_fetch() {
        let events = Events::default();
        let mut registry = registry_with(&events);
        registry.register_component(
            "slow",
            Stub::new("p", &events).with_gate(Gate::FetchDelay(Duration::from_millis(30))),
        );
        let root = ComponentData::new("home")
            .with_child("main", ComponentData::new("text"))
            .with_child(
                "main",
                ComponentData::new("section").with_child("body", ComponentData::new("slow")),
            );
        let page = page_of(root, &registry);

        render(&page, &RenderOptions::default()).await;

        let all = events.all();
        let last_fetch = all.iter().rposition(|e| e.starts_with("fetch ")).unwrap();
        let first_ctx = all.iter().position(|e| e.starts_with("ctx ")).unwrap();
        assert_eq!(all[last_fetch], "fetch /main/1/body/0");
        assert!(last_fetch < first_ctx);
        assert_eq!(events.count("ctx "), 4);
    }

    /// Renders the root context value `site_name`.
    struct SiteName;

    #[async_trait]
    impl crate::template::Template for SiteName {
        fn render(&self, scope: &Scope, _children: &AreaOutputs) -> Result<String> {
            let ctx = scope.render_ctx();
            let name = ctx
                .as_deref()
                .and_then(|ctx| ctx.value("site_name"))
                .and_then(Value::as_str)
                .unwrap_or("none");
            Ok(format!("<p>{name}</p>"))
        }
    }

    #[tokio::test]
    async fn test_seeded_values_reach_every_node() {
        let mut registry = registry();
        registry.register_component("site-name", SiteName);
        let root = ComponentData::new("home").with_child(
            "main",
            ComponentData::new("section").with_child("body", ComponentData::new("site-name")),
        );
        let page = page_of(root, &registry);
        let mut values = Map::new();
        values.insert("site_name".into(), json!("Folio"));

        let rendered = render(&page, &RenderOptions::default().with_values(values)).await;

        assert_eq!(
            rendered.output,
            "<page><section><p>Folio</p></section></page>"
        );
    }
}
