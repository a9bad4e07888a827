//! CLI argument definitions using clap
//!
//! Commands:
//! - recordforge validate --model <path> --data <path>
//! - recordforge export --model <path> --data <path> [--output <path>]
//! - recordforge search --model <path> --data <path> --term <text>
//! - recordforge session --model <path> --data <path> [--output <path>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// recordforge - schema-validated JSON record editor
#[derive(Parser, Debug)]
#[command(name = "recordforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Model, data and config paths shared by every command
#[derive(Args, Debug, Clone)]
pub struct Documents {
    /// Path to the model document (JSON with a `__meta__` block)
    #[arg(long)]
    pub model: PathBuf,

    /// Path to the data document (JSON array of records)
    #[arg(long)]
    pub data: PathBuf,

    /// Path to an engine configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the data and report every violation
    Validate {
        #[command(flatten)]
        docs: Documents,
    },

    /// Write the data back with keys in model order
    Export {
        #[command(flatten)]
        docs: Documents,

        /// Save to this file instead of printing
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print every field value containing a term
    Search {
        #[command(flatten)]
        docs: Documents,

        /// Text to look for
        #[arg(long)]
        term: String,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Edit interactively: JSON requests on stdin, one response per line
    Session {
        #[command(flatten)]
        docs: Documents,

        /// Save target; defaults to the data file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
