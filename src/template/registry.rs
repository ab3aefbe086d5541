//! Key → implementation lookup used by the hydrator.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use std::{fmt, sync::Arc};

use super::Template;

/// Registered templates, split into page (root) and component tables.
///
/// Populated once at startup and only read afterwards; clone it cheaply to
/// hand the same set to several engines.
#[derive(Clone, Default)]
pub struct TemplateRegistry {
    pages: FxHashMap<CompactString, Arc<dyn Template>>,
    components: FxHashMap<CompactString, Arc<dyn Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template usable as the root of a page.
    pub fn register_page(
        &mut self,
        key: impl Into<CompactString>,
        template: impl Template,
    ) -> &mut Self {
        self.pages.insert(key.into(), Arc::new(template));
        self
    }

    /// Register a template usable inside an area.
    pub fn register_component(
        &mut self,
        key: impl Into<CompactString>,
        template: impl Template,
    ) -> &mut Self {
        self.components.insert(key.into(), Arc::new(template));
        self
    }

    pub fn page(&self, key: &str) -> Option<&Arc<dyn Template>> {
        self.pages.get(key)
    }

    pub fn component(&self, key: &str) -> Option<&Arc<dyn Template>> {
        self.components.get(key)
    }

    /// Page template keys, sorted.
    pub fn page_keys(&self) -> Vec<&str> {
        sorted_keys(&self.pages)
    }

    /// Component template keys, sorted.
    pub fn component_keys(&self) -> Vec<&str> {
        sorted_keys(&self.components)
    }

    /// One template per distinct key, sorted by key.
    ///
    /// A key registered in both tables yields its page template.
    pub fn by_key(&self) -> Vec<(&str, &Arc<dyn Template>)> {
        let mut entries: Vec<_> = self
            .pages
            .iter()
            .chain(
                self.components
                    .iter()
                    .filter(|(key, _)| !self.pages.contains_key(*key)),
            )
            .map(|(key, template)| (key.as_str(), template))
            .collect();
        entries.sort_unstable_by_key(|(key, _)| *key);
        entries
    }
}

fn sorted_keys(map: &FxHashMap<CompactString, Arc<dyn Template>>) -> Vec<&str> {
    let mut keys: Vec<_> = map.keys().map(CompactString::as_str).collect();
    keys.sort_unstable();
    keys
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("pages", &self.page_keys())
            .field("components", &self.component_keys())
            .finish()
    }
}
