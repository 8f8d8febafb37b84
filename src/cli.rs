mod format;

use clap::{Parser, Subcommand};
pub use format::OutputFormat;
use std::path::PathBuf;

/// Classify, record and search captured application errors
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Application config (TOML)
    #[arg(short, long, global = true, env = "FAULT_SIEVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a rule document and list the filters it defines
    Check {
        /// Rule document (JSON5)
        rules: PathBuf,
    },
    /// Evaluate a captured error against the rules without storing it
    Evaluate {
        /// Rule document; defaults to the configured one
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Captured error document (JSON)
        error: PathBuf,
    },
    /// Route a captured error through the configured rules, store and notifiers
    Capture {
        /// Captured error document (JSON)
        error: PathBuf,
    },
    /// List a page of stored errors
    List {
        /// JSON-lines store file; defaults to the configured store
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Query filter line, e.g. "message ~ timeout" (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Case-insensitive free-text search
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Number of matching records to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Records per page; defaults to the configured page size
        #[arg(short = 'n', long)]
        page_size: Option<usize>,
    },
    /// Show one stored error
    Show {
        /// JSON-lines store file; defaults to the configured store
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Record id
        id: String,
    },
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
