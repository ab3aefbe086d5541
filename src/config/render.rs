//! `[render]` section configuration.

use super::defaults;
use compact_str::CompactString;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[render]` section in folio.toml - render pipeline settings.
///
/// # Example
/// ```toml
/// [render]
/// minify = true              # Minify HTML output
/// timeout_ms = 5000          # Abort a render after 5s
/// default_extension = "html"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Minify HTML output (variations are left untouched).
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Deadline for a whole render, in milliseconds. Unset means none.
    #[serde(default = "defaults::render::timeout_ms")]
    #[educe(Default = defaults::render::timeout_ms())]
    pub timeout_ms: Option<u64>,

    /// Extension used when a request names none.
    #[serde(default = "defaults::render::default_extension")]
    #[educe(Default = defaults::render::default_extension())]
    pub default_extension: CompactString,
}

impl RenderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
