//! Serialized component records.
//!
//! These are the persisted shapes of a page: what the store hands us before
//! hydration and what the migration engine rewrites.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::SchemaVersion;

/// Named areas of a serialized component, each an ordered list of children.
pub type Areas = BTreeMap<String, Vec<ComponentData>>;

/// One serialized component and, recursively, its children.
///
/// ```json
/// { "templateKey": "text", "body": "hi", "areas": { "main": [ ... ] } }
/// ```
///
/// Every key other than `templateKey` and `areas` is domain data owned by the
/// component and lands in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentData {
    /// Selects the implementation in the template registry.
    pub template_key: String,

    /// Child components per area name. Absent in JSON means no children.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub areas: Areas,

    /// Arbitrary component fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ComponentData {
    pub fn new(template_key: impl Into<String>) -> Self {
        Self {
            template_key: template_key.into(),
            areas: Areas::new(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, area: impl Into<String>, child: ComponentData) -> Self {
        self.areas.entry(area.into()).or_default().push(child);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Every distinct template key in this subtree, root included.
    pub fn template_keys(&self) -> BTreeSet<&str> {
        let mut keys = BTreeSet::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, keys: &mut BTreeSet<&'a str>) {
        keys.insert(self.template_key.as_str());
        for child in self.areas.values().flatten() {
            child.collect_keys(keys);
        }
    }

    /// Number of components in this subtree, root included.
    pub fn count(&self) -> usize {
        1 + self.areas.values().flatten().map(Self::count).sum::<usize>()
    }
}

/// Root component of a page plus the schema version it was saved at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Migrations created at or before this version are already applied.
    #[serde(default)]
    pub saved_at_version: SchemaVersion,

    #[serde(flatten)]
    pub root: ComponentData,
}

impl PageData {
    pub fn new(root: ComponentData, saved_at_version: SchemaVersion) -> Self {
        Self {
            saved_at_version,
            root,
        }
    }
}

/// Envelope the store returns for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub id: String,

    #[serde(default)]
    pub link_id: String,

    /// URL path of the page (e.g., "/blog/hello").
    #[serde(default)]
    pub path: String,

    /// Site-level metadata the store attaches to every page.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub site: Map<String, Value>,

    pub data: PageData,

    /// Parent pages, nearest first, used for inherited field lookups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<PageRecord>,
}

impl PageRecord {
    pub fn new(id: impl Into<String>, data: PageData) -> Self {
        Self {
            id: id.into(),
            link_id: String::new(),
            path: String::new(),
            site: Map::new(),
            data,
            ancestors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_data_from_json() {
        let data: ComponentData = serde_json::from_value(json!({
            "templateKey": "home",
            "title": "Welcome",
            "areas": {
                "main": [
                    { "templateKey": "text", "body": "hi" },
                    { "templateKey": "text", "body": "there" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(data.template_key, "home");
        assert_eq!(data.field("title"), Some(&json!("Welcome")));
        assert!(data.field("areas").is_none());
        assert_eq!(data.areas["main"].len(), 2);
        assert_eq!(data.areas["main"][1].field("body"), Some(&json!("there")));
    }

    #[test]
    fn test_missing_areas_means_no_children() {
        let data: ComponentData =
            serde_json::from_value(json!({ "templateKey": "text", "body": "hi" })).unwrap();
        assert!(data.areas.is_empty());

        // And no empty `areas` key is written back
        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back, json!({ "templateKey": "text", "body": "hi" }));
    }

    #[test]
    fn test_template_keys_are_collected_from_whole_tree() {
        let tree = ComponentData::new("home")
            .with_child(
                "main",
                ComponentData::new("section").with_child("body", ComponentData::new("text")),
            )
            .with_child("aside", ComponentData::new("text"));

        let keys: Vec<_> = tree.template_keys().into_iter().collect();
        assert_eq!(keys, vec!["home", "section", "text"]);
        assert_eq!(tree.count(), 4);
    }

    #[test]
    fn test_page_data_keeps_version_out_of_fields() {
        let page: PageData = serde_json::from_value(json!({
            "templateKey": "home",
            "savedAtVersion": 1700000000000_i64,
            "title": "Home"
        }))
        .unwrap();

        assert_eq!(page.saved_at_version, SchemaVersion::from_millis(1_700_000_000_000));
        assert!(page.root.field("savedAtVersion").is_none());
        assert_eq!(page.root.field("title"), Some(&json!("Home")));
    }

    #[test]
    fn test_page_record_with_ancestors() {
        let record: PageRecord = serde_json::from_value(json!({
            "id": "p2",
            "linkId": "l2",
            "path": "/blog/post",
            "data": { "templateKey": "post", "savedAtVersion": 0 },
            "ancestors": [
                { "id": "p1", "path": "/blog", "data": { "templateKey": "blog", "theme": "dark" } }
            ]
        }))
        .unwrap();

        assert_eq!(record.link_id, "l2");
        assert_eq!(record.ancestors.len(), 1);
        assert_eq!(record.ancestors[0].data.root.field("theme"), Some(&json!("dark")));
    }
}
