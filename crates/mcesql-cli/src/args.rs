//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "mcesql")]
#[command(author, version, about = "Lint Marketing Cloud Engagement query activity SQL")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Lint query files
    Check {
        /// SQL files to check (supports glob patterns)
        files: Vec<PathBuf>,

        /// Data extension metadata (JSON array)
        #[arg(short, long, value_name = "FILE")]
        schema: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Byte offset of the editor cursor, for in-progress text
        #[arg(long, value_name = "OFFSET")]
        cursor: Option<usize>,

        /// Also run the deep parse on a worker thread
        #[arg(long)]
        deep: bool,

        /// Rule ids to skip
        #[arg(long, value_name = "RULE")]
        disable: Vec<String>,

        /// Configuration file (defaults to the nearest mcesql.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// List the available rules
    Rules,

    /// Display data extensions from a schema file
    Schema {
        /// Data extension metadata (JSON array)
        file: PathBuf,
    },

    /// Parse SQL and display the T-SQL AST (for debugging)
    Parse {
        /// SQL file to parse
        file: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
    /// SARIF output (for GitHub Code Scanning)
    Sarif,
}
