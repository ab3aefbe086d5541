//! Fatal hydration errors.

use thiserror::Error;

/// Conditions under which no page can be produced at all.
///
/// A missing *child* template is not in this list: it is contained and
/// reported through the page (see [`ComponentError`](super::ComponentError)).
#[derive(Debug, Error)]
pub enum HydrateError {
    #[error("missing template implementation for page template `{0}`")]
    MissingTemplate(String),

    #[error("component at `{path}` cannot reach its page root")]
    Orphan { path: String },
}
