//! `tablex`: find the tables in an HTML page and export them as CSV, Excel or
//! JSON files.

mod commands;
mod source;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tablex_core::logging;
use tablex_core::{ConfigStore, ExportError, ExportFormat};
use tracing::{error, info};

use crate::source::PageSource;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Detect and export HTML tables
#[derive(Parser, Debug)]
#[command(name = "tablex")]
#[command(about = "Detect HTML tables and export them as CSV, Excel or JSON", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file (default: ~/.tablex/config.json)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Where to read the page from.
#[derive(clap::Args, Debug)]
struct PageArgs {
    /// HTML file to read, or '-' for stdin
    #[arg(value_name = "PAGE")]
    input: Option<String>,

    /// Fetch the page over HTTP(S) instead
    #[arg(long, value_name = "URL", conflicts_with = "input")]
    url: Option<String>,
}

impl PageArgs {
    fn source(&self) -> Result<PageSource> {
        PageSource::from_args(self.input.as_deref(), self.url.as_deref())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tables found on a page
    Detect {
        #[command(flatten)]
        page: PageArgs,

        /// Print summaries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export one table
    Export {
        #[command(flatten)]
        page: PageArgs,

        /// Index of the table, as shown by `detect`
        #[arg(short, long, value_name = "N")]
        table: usize,

        /// Output format (csv, excel, json); defaults to the configured one
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Directory to save into
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Export every table on the page
    ExportAll {
        #[command(flatten)]
        page: PageArgs,

        #[arg(short, long)]
        format: Option<ExportFormat>,

        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Show or change the inline export buttons preference
    Inline {
        #[arg(value_enum, default_value_t = InlineAction::Status)]
        action: InlineAction,
    },

    /// Answer JSON requests, one per line, on stdin
    Serve {
        #[command(flatten)]
        page: PageArgs,

        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Write a sample CSV to check the save directory
    Selftest {
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InlineAction {
    On,
    Off,
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => ConfigStore::open_at(path),
        None => ConfigStore::open(),
    }
    .context("Failed to load configuration")?;

    let filter = logging::filter_for_verbosity(&store.get().log_level, cli.verbose);
    let _log_guard = match logging::init_logging(&filter) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        }
    };
    info!("tablex v{VERSION}");
    // The subscriber was not up yet while the config loaded.
    if store.was_created() {
        info!("Created default config at {}", store.path().display());
    } else {
        info!("Loaded config from {}", store.path().display());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime
        .block_on(run(cli.command, store))
        .inspect_err(|e| match e.downcast_ref::<ExportError>() {
            Some(export) => error!(category = ?export.category(), "{e:#}"),
            None => error!("{e:#}"),
        })
}

async fn run(command: Command, mut store: ConfigStore) -> Result<()> {
    let config = store.get().clone();
    let mut stdout = std::io::stdout();

    match command {
        Command::Detect { page, json } => {
            commands::detect(&page.source()?, config.inline_buttons, json, &mut stdout).await
        }
        Command::Export {
            page,
            table,
            format,
            out,
        } => {
            let format = format.unwrap_or(config.default_format);
            commands::export(
                &page.source()?,
                store,
                &config,
                table,
                format,
                out.as_deref(),
                &mut stdout,
            )
            .await
        }
        Command::ExportAll { page, format, out } => {
            let format = format.unwrap_or(config.default_format);
            commands::export_all(
                &page.source()?,
                store,
                &config,
                format,
                out.as_deref(),
                &mut stdout,
            )
            .await
        }
        Command::Inline { action } => {
            let enabled = match action {
                InlineAction::On => Some(true),
                InlineAction::Off => Some(false),
                InlineAction::Status => None,
            };
            commands::inline(&mut store, enabled, &mut stdout)
        }
        Command::Serve { page, out } => {
            commands::serve(&page.source()?, store, &config, out.as_deref()).await
        }
        Command::Selftest { out } => commands::selftest(&config, out.as_deref(), &mut stdout)
            .await
            .map(|_| ()),
    }
}
