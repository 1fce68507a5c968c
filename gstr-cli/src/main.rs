use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gstr_core::StateResolver;

mod config;
mod prepare;
mod state;

use prepare::{PrepareRequest, print_report, run_prepare};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GSTR_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "gstr", version = VERSION, about = "Prepare GST sales registers for filing")]
struct Cli {
    /// Verbose logging. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read sales exports and write b2b / b2cs / b2cl CSVs per supplier GSTIN
    Prepare {
        /// Source mapping name (see `gstr sources`)
        #[arg(long)]
        source: String,

        /// Sales export(s): .csv, .xlsx, .xls or .ods
        #[arg(long = "input", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Return reports; their taxable values are negated
        #[arg(long = "reverse", num_args = 1..)]
        reverse: Vec<PathBuf>,

        /// Workbook sheet to read (default: every sheet with the source's header)
        #[arg(long)]
        sheet: Option<String>,

        /// Supplier GSTIN for batches that carry none
        #[arg(long)]
        supplier_id: Option<String>,

        /// Output directory (default: [output] dir from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Extra source mappings (TOML)
        #[arg(long)]
        mappings: Option<PathBuf>,
    },

    /// List known source mappings
    Sources {
        #[arg(long)]
        mappings: Option<PathBuf>,
    },

    /// Show how a place-of-supply value resolves
    Resolve {
        value: String,

        #[arg(long)]
        recipient_id: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default ~/.gstr/config.toml
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(version = VERSION, "gstr starting");

    match cli.command {
        Command::Prepare {
            source,
            inputs,
            reverse,
            sheet,
            supplier_id,
            out_dir,
            mappings,
        } => {
            let cfg = config::load_config()?;
            let registry = cfg.mapping_registry(mappings.as_deref())?;
            let table = cfg.jurisdiction_table()?;
            let out_dir = out_dir.unwrap_or_else(|| cfg.output.dir.clone());
            let supplier_id = supplier_id.or_else(|| cfg.supplier.default_id.clone());

            let req = PrepareRequest {
                source: &source,
                inputs: &inputs,
                reverse: &reverse,
                sheet: sheet.as_deref(),
                supplier_id: supplier_id.as_deref(),
                out_dir: &out_dir,
            };
            let report = run_prepare(&req, &registry, &table)
                .with_context(|| format!("preparing {source:?} exports"))?;
            print_report(&report);
        }

        Command::Sources { mappings } => {
            let cfg = config::load_config()?;
            let registry = cfg.mapping_registry(mappings.as_deref())?;
            for name in registry.names() {
                println!("{name}");
            }
        }

        Command::Resolve {
            value,
            recipient_id,
        } => {
            let cfg = config::load_config()?;
            let table = cfg.jurisdiction_table()?;
            let resolver = StateResolver::new(&table);
            match resolver.resolve_place(Some(&value), recipient_id.as_deref()) {
                Some((place, by)) => println!("{} ({by:?})", place.as_str()),
                None => println!("(blank)"),
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },
    }

    Ok(())
}
