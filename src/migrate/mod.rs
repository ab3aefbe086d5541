//! Schema migrations over serialized component trees.
//!
//! Each template key owns a list of [`Migration`]s, each stamped with the
//! [`SchemaVersion`] it was created at. Moving a page from its
//! `savedAtVersion` to a target version applies every migration in between,
//! forward (`up`) or backward (`down`).
//!
//! # Algorithm
//!
//! ```text
//! in-use keys ──► registered migrations of those keys
//!                      │
//!                      ▼
//!      window: from < created_at < to        (forward)
//!              to   < created_at < from      (backward)
//!                      │
//!                      ▼
//!      sort: ascending (forward) / exact reverse (backward)
//!                      │
//!                      ▼
//!      for each step: rewrite the whole tree bottom-up,
//!                     replacing every node of the step's key
//! ```
//!
//! A migration without `down` is breaking: a backward plan that crosses it is
//! rejected before any node is touched.

mod registry;

pub use registry::{Direction, MigrationRegistry, Step};

use anyhow::Result;
use std::{fmt, sync::Arc};
use thiserror::Error;

use crate::data::{ComponentData, SchemaVersion};

/// A transform over one serialized component (with its children already
/// migrated).
pub type Transform = Arc<dyn Fn(ComponentData) -> Result<ComponentData> + Send + Sync>;

/// One timestamped schema change of a template.
#[derive(Clone)]
pub struct Migration {
    created_at: SchemaVersion,
    up: Transform,
    down: Option<Transform>,
}

impl Migration {
    /// A breaking migration: it can be applied forward but never undone.
    pub fn new<F>(created_at: SchemaVersion, up: F) -> Self
    where
        F: Fn(ComponentData) -> Result<ComponentData> + Send + Sync + 'static,
    {
        Self {
            created_at,
            up: Arc::new(up),
            down: None,
        }
    }

    /// A migration that can be applied in both directions.
    pub fn reversible<U, D>(created_at: SchemaVersion, up: U, down: D) -> Self
    where
        U: Fn(ComponentData) -> Result<ComponentData> + Send + Sync + 'static,
        D: Fn(ComponentData) -> Result<ComponentData> + Send + Sync + 'static,
    {
        Self::new(created_at, up).with_down(down)
    }

    pub fn with_down<D>(mut self, down: D) -> Self
    where
        D: Fn(ComponentData) -> Result<ComponentData> + Send + Sync + 'static,
    {
        self.down = Some(Arc::new(down));
        self
    }

    pub fn created_at(&self) -> SchemaVersion {
        self.created_at
    }

    pub fn is_breaking(&self) -> bool {
        self.down.is_none()
    }

    fn transform(&self, direction: Direction) -> Option<&Transform> {
        match direction {
            Direction::Forward => Some(&self.up),
            Direction::Backward => self.down.as_ref(),
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("created_at", &self.created_at)
            .field("breaking", &self.is_breaking())
            .finish()
    }
}

/// Migration failures.
///
/// [`MigrationRegistry::migrate`] consumes the page it is given, so on error
/// nothing is returned; callers that need the original keep their own copy.
/// A `Breaking` error is raised while planning, before any node is rewritten.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(
        "cannot migrate `{template_key}` back across breaking change created at {created_at}"
    )]
    Breaking {
        template_key: String,
        created_at: SchemaVersion,
    },

    #[error("migration of `{template_key}` created at {created_at} failed: {reason}")]
    Transform {
        template_key: String,
        created_at: SchemaVersion,
        reason: String,
    },
}

/// Rewrite `node` bottom-up: every child subtree first, then the node itself
/// if its key is `key`.
fn apply(node: ComponentData, key: &str, transform: &Transform) -> Result<ComponentData> {
    let ComponentData {
        template_key,
        areas,
        fields,
    } = node;

    let areas = areas
        .into_iter()
        .map(|(name, children)| {
            let children = children
                .into_iter()
                .map(|child| apply(child, key, transform))
                .collect::<Result<Vec<_>>>()?;
            Ok((name, children))
        })
        .collect::<Result<_>>()?;

    let node = ComponentData {
        template_key,
        areas,
        fields,
    };
    if node.template_key == key {
        transform(node)
    } else {
        Ok(node)
    }
}
