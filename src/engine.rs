//! Request-level facade over migration, hydration and rendering.
//!
//! ```text
//! PageRecord ──► migrate to [schema] version (if it differs)
//!            ──► hydrate
//!            ──► render (within [render] timeout_ms)
//!            ──► minify (html only, if enabled)
//! ```
//!
//! The registries are built once at startup and shared read-only by every
//! request, so an `Engine` is typically wrapped in an `Arc`.

use serde_json::{Map, Value};
use std::{borrow::Cow, time::Duration};
use thiserror::Error;

use crate::config::SiteConfig;
use crate::data::PageRecord;
use crate::log;
use crate::migrate::{MigrateError, MigrationRegistry};
use crate::render::{self, RenderOptions, Rendered, RequestMeta, normalize_extension};
use crate::template::TemplateRegistry;
use crate::tree::{HydrateError, hydrate};
use crate::utils::minify::minify;

/// Failures that abort a whole request.
///
/// Component-level failures never show up here; they are contained and
/// reported through [`Rendered::errors`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Hydrate(#[from] HydrateError),

    #[error(transparent)]
    Migrate(#[from] MigrateError),

    #[error("render exceeded {0:?}")]
    Timeout(Duration),
}

impl RenderError {
    /// HTTP status a server should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Hydrate(HydrateError::MissingTemplate(_)) => 404,
            Self::Hydrate(_) => 500,
            Self::Migrate(MigrateError::Breaking { .. }) => 409,
            Self::Migrate(_) => 500,
            Self::Timeout(_) => 504,
        }
    }
}

/// What one request asks for.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Output extension; `None` uses `[render] default_extension`.
    pub extension: Option<String>,
    pub edit_mode: bool,
    pub meta: RequestMeta,
}

impl RenderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn edit_mode(mut self, edit_mode: bool) -> Self {
        self.edit_mode = edit_mode;
        self
    }

    pub fn meta(mut self, meta: RequestMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Templates, migrations and config of one running instance.
#[derive(Debug)]
pub struct Engine {
    templates: TemplateRegistry,
    migrations: MigrationRegistry,
    config: SiteConfig,
    extra: Map<String, Value>,
}

impl Engine {
    pub fn new(templates: TemplateRegistry, migrations: MigrationRegistry, config: SiteConfig) -> Self {
        let extra = match serde_json::to_value(&config.extra) {
            Ok(Value::Object(extra)) => extra,
            _ => Map::new(),
        };
        Self {
            templates,
            migrations,
            config,
            extra,
        }
    }

    /// Engine whose migrations are the ones the templates declare.
    pub fn with_templates(templates: TemplateRegistry, config: SiteConfig) -> Self {
        let migrations = MigrationRegistry::from_templates(&templates);
        Self::new(templates, migrations, config)
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn migrations(&self) -> &MigrationRegistry {
        &self.migrations
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Bring `record` (and its ancestors) to the configured schema version.
    ///
    /// Borrowed back unchanged when no version is configured or every record
    /// is already there.
    pub fn prepare<'a>(&self, record: &'a PageRecord) -> Result<Cow<'a, PageRecord>, MigrateError> {
        let Some(target) = self.config.schema.version else {
            return Ok(Cow::Borrowed(record));
        };
        let current = |r: &PageRecord| r.data.saved_at_version == target;
        if current(record) && record.ancestors.iter().all(current) {
            return Ok(Cow::Borrowed(record));
        }
        self.migrate_record(record.clone()).map(Cow::Owned)
    }

    fn migrate_record(&self, record: PageRecord) -> Result<PageRecord, MigrateError> {
        let Some(target) = self.config.schema.version else {
            return Ok(record);
        };
        let PageRecord {
            id,
            link_id,
            path,
            site,
            data,
            ancestors,
        } = record;
        let data = self.migrations.migrate(data, target)?;
        let ancestors = ancestors
            .into_iter()
            .map(|ancestor| self.migrate_record(ancestor))
            .collect::<Result<_, _>>()?;
        Ok(PageRecord {
            id,
            link_id,
            path,
            site,
            data,
            ancestors,
        })
    }

    /// Serve one record.
    ///
    /// # Errors
    ///
    /// Only the request-fatal conditions of [`RenderError`]; everything a
    /// component does wrong lands in [`Rendered::errors`].
    pub async fn render_record(
        &self,
        record: &PageRecord,
        request: RenderRequest,
    ) -> Result<Rendered, RenderError> {
        let record = self.prepare(record)?;
        let page = hydrate(&record, &self.templates, request.edit_mode)?;

        let extension = request
            .extension
            .as_deref()
            .map_or_else(|| normalize_extension(&self.config.render.default_extension), normalize_extension);
        let options = RenderOptions::default()
            .with_extension(&extension)
            .with_request(request.meta)
            .with_values(self.extra.clone());

        let rendered = match self.config.render.timeout() {
            Some(limit) => tokio::time::timeout(limit, render::render(&page, &options))
                .await
                .map_err(|_| RenderError::Timeout(limit))?,
            None => render::render(&page, &options).await,
        };

        if !rendered.errors.is_empty() {
            log!(
                "render";
                "page {} ({}): {} component error(s)",
                record.id,
                extension,
                rendered.errors.len()
            );
        }

        if options.is_variation() {
            return Ok(rendered);
        }
        let output = match minify(&rendered.output, &self.config.render) {
            Cow::Borrowed(_) => rendered.output,
            Cow::Owned(minified) => minified,
        };
        Ok(Rendered {
            output,
            errors: rendered.errors,
        })
    }
}
