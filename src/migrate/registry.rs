//! Per-template migration lists, planning and application.

use compact_str::CompactString;
use std::collections::BTreeMap;

use super::{Migration, MigrateError, apply};
use crate::data::{PageData, SchemaVersion};
use crate::log;
use crate::template::TemplateRegistry;

/// Which way a page moves through schema history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// One migration scheduled by a plan.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub template_key: &'a str,
    pub migration: &'a Migration,
    pub direction: Direction,
}

/// Every registered migration, grouped by template key.
///
/// Collected once at startup from the registered templates and read-only
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    by_key: BTreeMap<CompactString, Vec<Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template_key: impl Into<CompactString>, migration: Migration) -> &mut Self {
        self.by_key
            .entry(template_key.into())
            .or_default()
            .push(migration);
        self
    }

    /// Collect the migrations every registered template declares, under the
    /// key it is registered with.
    pub fn from_templates(templates: &TemplateRegistry) -> Self {
        let mut registry = Self::new();
        for (key, template) in templates.by_key() {
            for migration in template.migrations() {
                registry.register(key, migration);
            }
        }
        registry
    }

    pub fn migrations_for(&self, template_key: &str) -> &[Migration] {
        self.by_key
            .get(template_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Registered keys with their migration counts.
    pub fn summary(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_key.iter().map(|(key, list)| (key.as_str(), list.len()))
    }

    /// Latest creation time across every migration, if any.
    pub fn latest(&self) -> Option<SchemaVersion> {
        self.by_key
            .values()
            .flatten()
            .map(Migration::created_at)
            .max()
    }

    /// The ordered steps that [`migrate`](Self::migrate) would apply.
    ///
    /// Only keys present somewhere in the page are considered, and only
    /// migrations strictly between the page's version and `to`. Ties on
    /// `created_at` are ordered by template key, then registration order;
    /// a backward plan is the exact reverse of the forward one.
    ///
    /// # Errors
    ///
    /// [`MigrateError::Breaking`] if a backward plan crosses a migration
    /// without `down`.
    pub fn plan(&self, page: &PageData, to: SchemaVersion) -> Result<Vec<Step<'_>>, MigrateError> {
        let from = page.saved_at_version;
        let direction = if from > to {
            Direction::Backward
        } else {
            Direction::Forward
        };
        let (low, high) = match direction {
            Direction::Forward => (from, to),
            Direction::Backward => (to, from),
        };

        let in_use = page.root.template_keys();
        let mut steps: Vec<_> = self
            .by_key
            .iter()
            .filter(|(key, _)| in_use.contains(key.as_str()))
            .flat_map(|(key, list)| {
                list.iter()
                    .enumerate()
                    .map(move |(index, migration)| (key.as_str(), index, migration))
            })
            .filter(|(_, _, m)| low < m.created_at() && m.created_at() < high)
            .collect();

        steps.sort_by(|a, b| {
            (a.2.created_at(), a.0, a.1).cmp(&(b.2.created_at(), b.0, b.1))
        });
        if direction == Direction::Backward {
            steps.reverse();
        }

        steps
            .into_iter()
            .map(|(template_key, _, migration)| {
                if direction == Direction::Backward && migration.is_breaking() {
                    return Err(MigrateError::Breaking {
                        template_key: template_key.to_string(),
                        created_at: migration.created_at(),
                    });
                }
                Ok(Step {
                    template_key,
                    migration,
                    direction,
                })
            })
            .collect()
    }

    /// Move `page` from its `savedAtVersion` to `to`.
    ///
    /// Steps run one at a time over the whole tree. On success the result is
    /// stamped with `to`; migrating to the version a page is already at is a
    /// no-op.
    pub fn migrate(&self, page: PageData, to: SchemaVersion) -> Result<PageData, MigrateError> {
        let from = page.saved_at_version;
        let steps = self.plan(&page, to)?;
        if !steps.is_empty() {
            log!("migrate"; "page {} → {}: {} step(s)", from, to, steps.len());
        }

        let mut root = page.root;
        for step in steps {
            let Some(transform) = step.migration.transform(step.direction) else {
                // plan() already rejected backward steps without `down`
                return Err(MigrateError::Breaking {
                    template_key: step.template_key.to_string(),
                    created_at: step.migration.created_at(),
                });
            };
            root = apply(root, step.template_key, transform).map_err(|err| {
                MigrateError::Transform {
                    template_key: step.template_key.to_string(),
                    created_at: step.migration.created_at(),
                    reason: format!("{err:#}"),
                }
            })?;
        }

        Ok(PageData {
            saved_at_version: to,
            root,
        })
    }
}
