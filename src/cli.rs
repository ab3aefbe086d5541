//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::data::SchemaVersion;

/// Folio component renderer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file path (default: folio.toml)
    #[arg(short = 'C', long, default_value = "folio.toml")]
    pub config: PathBuf,

    /// Suppress log output
    #[arg(short, long)]
    pub quiet: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render a page record (JSON) to stdout or a file
    Render {
        /// Path to the page record
        record: PathBuf,

        /// Output extension; anything but `html` renders a variation
        #[arg(short, long)]
        ext: Option<String>,

        /// Render in edit mode
        #[arg(long)]
        edit: bool,

        /// Minify the html output
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,

        /// Write output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Migrate a page record to another schema version
    Migrate {
        /// Path to the page record
        record: PathBuf,

        /// Target version: unix milliseconds or RFC 3339
        /// (default: `[schema] version`, else now)
        #[arg(long)]
        to: Option<SchemaVersion>,

        /// Write the migrated record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered templates and migrations
    Templates,
}
