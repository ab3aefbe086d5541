//! Serialized record → live tree.

use compact_str::CompactString;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{
    Area, ComponentError, HydrateError, Node, NodeId, NodeState, Page, PageInfo,
    report::ErrorSink,
};
use crate::data::{ComponentData, PageRecord};
use crate::template::{Template, TemplateRegistry};

/// Build the live tree for `record`.
///
/// The root template must exist; otherwise nothing can be rendered and
/// [`HydrateError::MissingTemplate`] is returned. A child whose template is
/// unknown is left out of its area (siblings keep their order) and reported
/// to the page as a contained error.
///
/// Hydration is synchronous: it only allocates and links nodes.
pub fn hydrate(
    record: &PageRecord,
    templates: &TemplateRegistry,
    edit_mode: bool,
) -> Result<Arc<Page>, HydrateError> {
    let root_data = &record.data.root;
    let root_template = templates
        .page(&root_data.template_key)
        .ok_or_else(|| HydrateError::MissingTemplate(root_data.template_key.clone()))?;

    let mut builder = Builder {
        templates,
        edit_mode,
        nodes: Vec::with_capacity(root_data.count()),
        skipped: Vec::new(),
    };
    builder.attach(root_data, Arc::clone(root_template), None, String::new());
    builder.link_pages()?;

    let Builder { nodes, skipped, .. } = builder;
    let page = Page {
        nodes,
        info: PageInfo {
            id: record.id.clone(),
            link_id: record.link_id.clone(),
            path: record.path.clone(),
            site: record.site.clone(),
            saved_at_version: record.data.saved_at_version,
            ancestors: record.ancestors.clone(),
        },
        errors: ErrorSink::default(),
        head_content: Mutex::new(String::new()),
    };

    for skip in skipped {
        page.pass_error(skip.parent, skip.error);
    }

    Ok(Arc::new(page))
}

/// A child left out because its template is not registered.
struct Skipped {
    parent: NodeId,
    error: ComponentError,
}

struct Builder<'a> {
    templates: &'a TemplateRegistry,
    edit_mode: bool,
    nodes: Vec<Node>,
    skipped: Vec<Skipped>,
}

impl Builder<'_> {
    /// Push `data` and, depth-first, its children. Returns the new node id.
    fn attach(
        &mut self,
        data: &ComponentData,
        template: Arc<dyn Template>,
        parent: Option<NodeId>,
        path: String,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            template_key: CompactString::from(data.template_key.as_str()),
            template,
            data: data.fields.clone(),
            areas: Vec::new(),
            path: path.clone(),
            parent,
            // Resolved in `link_pages` once the whole tree exists
            page: NodeId::ROOT,
            edit_mode: self.edit_mode,
            state: Mutex::new(NodeState::default()),
        });

        let mut areas = Vec::with_capacity(data.areas.len());
        for (name, children) in &data.areas {
            let mut ids = Vec::with_capacity(children.len());
            for (index, child) in children.iter().enumerate() {
                let child_path = format!("{path}/{name}/{index}");
                match self.templates.component(&child.template_key) {
                    Some(template) => {
                        ids.push(self.attach(child, Arc::clone(template), Some(id), child_path));
                    }
                    None => self.skipped.push(Skipped {
                        parent: id,
                        error: ComponentError {
                            path: child_path,
                            template_key: child.template_key.clone(),
                            message: format!(
                                "missing template implementation for `{}`",
                                child.template_key
                            ),
                        },
                    }),
                }
            }
            areas.push(Area {
                name: CompactString::from(name.as_str()),
                children: ids,
            });
        }

        self.nodes[id.0].areas = areas;
        id
    }

    /// Resolve each node's page by walking parent links to the root.
    fn link_pages(&mut self) -> Result<(), HydrateError> {
        for index in 0..self.nodes.len() {
            let page = self.resolve_page(NodeId(index))?;
            self.nodes[index].page = page;
        }
        Ok(())
    }

    fn resolve_page(&self, id: NodeId) -> Result<NodeId, HydrateError> {
        let orphan = || HydrateError::Orphan {
            path: self.nodes[id.0].path.clone(),
        };

        let mut current = id;
        // A walk longer than the arena means a cycle
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(current.0).ok_or_else(orphan)?;
            match node.parent {
                Some(parent) => current = parent,
                None if current == NodeId::ROOT => return Ok(current),
                None => return Err(orphan()),
            }
        }
        Err(orphan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PageData, SchemaVersion};
    use crate::tree::fixtures::{page_of, registry};

    fn record(root: ComponentData) -> PageRecord {
        PageRecord::new("p1", PageData::new(root, SchemaVersion::default()))
    }

    #[test]
    fn test_missing_root_template_is_fatal() {
        let err = hydrate(&record(ComponentData::new("nowhere")), &registry(), false).unwrap_err();
        assert!(matches!(err, HydrateError::MissingTemplate(key) if key == "nowhere"));
    }

    #[test]
    fn test_component_key_is_not_a_page_key() {
        // `text` is only registered as a component
        let err = hydrate(&record(ComponentData::new("text")), &registry(), false).unwrap_err();
        assert!(matches!(err, HydrateError::MissingTemplate(_)));
    }

    #[test]
    fn test_paths_and_links() {
        let root = ComponentData::new("home")
            .with_child("main", ComponentData::new("text").with_field("body", "a"))
            .with_child(
                "main",
                ComponentData::new("section").with_child("body", ComponentData::new("text")),
            );
        let page = page_of(root, &registry());

        let paths: Vec<_> = page.nodes().iter().map(Node::path).collect();
        assert_eq!(paths, vec!["", "/main/0", "/main/1", "/main/1/body/0"]);

        let nested = page.find("/main/1/body/0").unwrap();
        assert_eq!(nested.parent(), Some(page.find("/main/1").unwrap().id()));
        assert_eq!(nested.page(), NodeId::ROOT);
        assert!(page.root().is_root());
        assert!(page.root().parent().is_none());
        assert_eq!(page.find("/main/0").unwrap().data()["body"], "a");
    }

    #[test]
    fn test_node_data_excludes_areas_and_key() {
        let root = ComponentData::new("home")
            .with_field("title", "T")
            .with_child("main", ComponentData::new("text"));
        let page = page_of(root, &registry());

        let data = page.root().data();
        assert!(data.contains_key("title"));
        assert!(!data.contains_key("areas"));
        assert!(!data.contains_key("templateKey"));
    }

    #[test]
    fn test_unknown_child_is_skipped_and_reported() {
        let root = ComponentData::new("home").with_child(
            "main",
            ComponentData::new("section")
                .with_child("body", ComponentData::new("text").with_field("body", "one"))
                .with_child("body", ComponentData::new("widget-v9"))
                .with_child("body", ComponentData::new("text").with_field("body", "three")),
        );
        let page = page_of(root, &registry());

        let section = page.find("/main/0").unwrap();
        let kept: Vec<_> = section
            .area("body")
            .iter()
            .map(|&id| page.node(id).path())
            .collect();
        // Original indices are kept so paths still address stored data
        assert_eq!(kept, vec!["/main/0/body/0", "/main/0/body/2"]);

        let errors = page.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/main/0/body/1");
        assert_eq!(errors[0].template_key, "widget-v9");

        // The parent still renders
        assert!(!section.had_error());
    }

    #[test]
    fn test_unknown_subtree_is_dropped_entirely() {
        let root = ComponentData::new("home").with_child(
            "main",
            ComponentData::new("widget-v9").with_child("inner", ComponentData::new("text")),
        );
        let page = page_of(root, &registry());

        assert_eq!(page.len(), 1);
        assert_eq!(page.errors().len(), 1);
    }

    #[test]
    fn test_edit_mode_reaches_every_node() {
        let root = ComponentData::new("home").with_child("main", ComponentData::new("text"));
        let page = hydrate(&record(root), &registry(), true).unwrap();
        assert!(page.nodes().iter().all(Node::edit_mode));
    }

    #[test]
    fn test_preorder_matches_arena_order() {
        let root = ComponentData::new("home")
            .with_child(
                "aside",
                ComponentData::new("section").with_child("body", ComponentData::new("text")),
            )
            .with_child("main", ComponentData::new("text"));
        let page = page_of(root, &registry());

        let arena: Vec<_> = page.nodes().iter().map(Node::id).collect();
        assert_eq!(page.preorder(), arena);
    }
}
