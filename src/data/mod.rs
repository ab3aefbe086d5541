//! Persisted page and component records.
//!
//! A page is stored as a tree of [`ComponentData`] rooted in [`PageData`] and
//! wrapped in a [`PageRecord`] envelope:
//!
//! ```text
//! PageRecord { id, linkId, path, site, ancestors[] }
//!     └── PageData { savedAtVersion }
//!             └── ComponentData { templateKey, fields.., areas }
//!                     └── areas["main"] = [ComponentData, ComponentData, ..]
//! ```
//!
//! The hydrator turns these into a live tree; the migration engine rewrites
//! them between schema versions.

mod types;
mod version;

pub use types::{Areas, ComponentData, PageData, PageRecord};
pub use version::{ParseVersionError, SchemaVersion};
