//! Folio - render and migrate component page records.

use anyhow::{Context, Result};
use clap::Parser;
use folio::{
    Engine, PageRecord, RenderRequest, SchemaVersion, SiteConfig,
    TemplateRegistry,
    cli::{Cli, Commands},
    log, logger,
    template::builtin,
};
use std::{fs, path::Path};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::set_quiet(cli.quiet);
    let engine = Engine::with_templates(templates(), load_config(&cli)?);

    match &cli.command {
        Commands::Render {
            record,
            edit,
            output,
            ..
        } => {
            let page = read_record(record)?;
            let request = RenderRequest::new()
                .extension(engine.config().render.default_extension.as_str())
                .edit_mode(*edit);
            let rendered = engine
                .render_record(&page, request)
                .await
                .with_context(|| format!("failed to render `{}`", record.display()))?;
            write_output(output.as_deref(), &rendered.output)
        }
        Commands::Migrate { record, output, .. } => {
            let page = read_record(record)?;
            // Without a configured target, apply everything authored so far
            let target = engine.config().schema.version.unwrap_or_else(SchemaVersion::now);
            let data = engine
                .migrations()
                .migrate(page.data, target)
                .with_context(|| format!("failed to migrate `{}`", record.display()))?;
            let migrated = PageRecord { data, ..page };
            let json = serde_json::to_string_pretty(&migrated)?;
            write_output(output.as_deref(), &json)
        }
        Commands::Templates => {
            list_templates(&engine);
            Ok(())
        }
    }
}

/// Built-in templates; embedding hosts register their own.
fn templates() -> TemplateRegistry {
    let mut templates = TemplateRegistry::new();
    builtin::register(&mut templates);
    templates
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let mut config = SiteConfig::load_or_default(&cli.config)?;
    config.update_with_cli(cli);
    config.validate()?;
    Ok(config)
}

fn read_record(path: &Path) -> Result<PageRecord> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("`{}` is not a valid page record", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("failed to write `{}`", path.display()))?;
            log!("render"; "wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn list_templates(engine: &Engine) {
    let templates = engine.templates();
    for key in templates.page_keys() {
        println!("page       {key}");
    }
    for key in templates.component_keys() {
        println!("component  {key}");
    }
    for (key, count) in engine.migrations().summary() {
        println!("migrations {key}: {count}");
    }
}
