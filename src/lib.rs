//! Folio - component tree renderer and schema migration engine.
//!
//! A page is stored as a tree of serialized components. Folio turns that tree
//! into HTML (or a variation such as plain text) and moves stored trees
//! between schema versions.
//!
//! ```text
//! PageRecord ──► migrate ──► hydrate ──► render ──► Rendered { output, errors }
//!                  │            │           │
//!            MigrationRegistry  │     fetch / set_context / render
//!                         TemplateRegistry
//! ```
//!
//! Most callers go through [`Engine`]; the individual stages are public for
//! hosts that need finer control.

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod logger;
pub mod migrate;
pub mod render;
pub mod template;
pub mod tree;
mod utils;

pub use config::SiteConfig;
pub use data::{ComponentData, PageData, PageRecord, SchemaVersion};
pub use engine::{Engine, RenderError, RenderRequest};
pub use migrate::{MigrateError, Migration, MigrationRegistry};
pub use render::{AreaOutputs, RenderCtx, RenderOptions, Rendered, RequestMeta, render};
pub use template::{Resources, Template, TemplateRegistry};
pub use tree::{ComponentError, HydrateError, Page, Scope, hydrate};
