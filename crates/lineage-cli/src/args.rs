//! Command-line argument definitions for the Lineage CLI.
//!
//! [`Args`] holds the global options (configuration file and log level) and
//! the [`Command`] to run on a genealogy file.

use clap::{Parser, Subcommand};

/// Inspect and tidy genealogy files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print item counts, canvas size and load diagnostics
    Info {
        /// Path to the genealogy file
        file: String,
    },

    /// List persons whose display name contains the text
    Find {
        /// Path to the genealogy file
        file: String,

        /// Case-sensitive text to look for
        text: String,
    },

    /// Arrange persons in generation rows and save the result
    Layout {
        /// Path to the genealogy file
        file: String,

        /// Where to write the arranged file (defaults to the input file)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print dated births, deaths and marriages, oldest first
    Timeline {
        /// Path to the genealogy file
        file: String,
    },

    /// Print one tab-separated row per person, in document order
    Report {
        /// Path to the genealogy file
        file: String,
    },

    /// Report every load problem; fails if any element was dropped
    Check {
        /// Path to the genealogy file
        file: String,
    },
}

impl Command {
    /// The genealogy file the command reads.
    pub fn file(&self) -> &str {
        match self {
            Command::Info { file }
            | Command::Find { file, .. }
            | Command::Layout { file, .. }
            | Command::Timeline { file }
            | Command::Report { file }
            | Command::Check { file } => file,
        }
    }
}
