//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                         |
//! |-------------|-------------------------------------------------|
//! | `[schema]`  | Schema version this instance serves             |
//! | `[render]`  | Minification, deadline, default extension       |
//! | `[extra]`   | Values seeded into every page's root context    |
//!
//! # Example
//!
//! ```toml
//! [schema]
//! version = "2024-06-01T00:00:00Z"
//!
//! [render]
//! minify = true
//! timeout_ms = 5000
//!
//! [extra]
//! site_name = "Docs"
//! ```

pub mod defaults;
mod error;
mod render;
mod schema;

pub use error::ConfigError;
pub use render::RenderConfig;
pub use schema::SchemaConfig;

use crate::cli::{Cli, Commands};
use crate::render::normalize_extension;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Schema version settings
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Render pipeline settings
    #[serde(default)]
    pub render: RenderConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Render { ext, minify, .. } => {
                Self::update_option(&mut self.render.minify, minify.as_ref());
                if let Some(ext) = ext {
                    self.render.default_extension = normalize_extension(ext);
                }
            }
            Commands::Migrate { to, .. } => {
                if let Some(to) = to {
                    self.schema.version = Some(*to);
                }
            }
            Commands::Templates => {}
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.render.timeout_ms == Some(0) {
            bail!(ConfigError::Validation(
                "[render.timeout_ms] must be greater than zero".into()
            ));
        }

        let ext = &self.render.default_extension;
        if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!(ConfigError::Validation(format!(
                "[render.default_extension] `{ext}` must be alphanumeric"
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
