//! Head content assembled from the resources of every reached node.

use anyhow::anyhow;
use compact_str::CompactString;
use quick_xml::escape::escape;
use rustc_hash::FxHashSet;
use std::fmt::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};

use super::tasks;
use crate::tree::Page;

/// Stylesheet and script tags for every node that received a render context.
///
/// Resources are deduplicated across nodes; the first declaration decides the
/// position. Stylesheets come before scripts. A node whose `resources`
/// panics is flagged and contributes nothing.
pub(super) fn assemble(page: &Page) -> String {
    let mut stylesheets = Unique::default();
    let mut scripts = Unique::default();

    for id in page.preorder() {
        let node = page.node(id);
        if node.had_error() || node.render_ctx().is_none() {
            continue;
        }
        let resources = match catch_unwind(AssertUnwindSafe(|| node.template().resources())) {
            Ok(resources) => resources,
            Err(payload) => {
                let reason = tasks::panic_message(payload);
                page.log_error(id, anyhow!("resources panicked: {reason}"));
                continue;
            }
        };
        stylesheets.extend(resources.stylesheets);
        scripts.extend(resources.scripts);
    }

    let mut head = String::new();
    for href in &stylesheets.items {
        let _ = write!(head, r#"<link rel="stylesheet" href="{}">"#, escape(href.as_str()));
    }
    for src in &scripts.items {
        let _ = write!(head, r#"<script src="{}" defer></script>"#, escape(src.as_str()));
    }
    head
}

/// Insertion-ordered set.
#[derive(Default)]
struct Unique {
    seen: FxHashSet<CompactString>,
    items: Vec<CompactString>,
}

impl Unique {
    fn extend(&mut self, values: impl IntoIterator<Item = CompactString>) {
        for value in values {
            if self.seen.insert(value.clone()) {
                self.items.push(value);
            }
        }
    }
}
