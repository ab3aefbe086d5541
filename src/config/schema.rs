//! `[schema]` section configuration.

use super::defaults;
use crate::data::SchemaVersion;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[schema]` section in folio.toml - the schema version this instance serves.
///
/// # Example
/// ```toml
/// [schema]
/// version = "2024-06-01T00:00:00Z"   # or unix milliseconds
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Records saved at another version are migrated to this one before
    /// rendering. Unset means records render as stored.
    #[serde(default = "defaults::schema::version")]
    #[educe(Default = defaults::schema::version())]
    pub version: Option<SchemaVersion>,
}
