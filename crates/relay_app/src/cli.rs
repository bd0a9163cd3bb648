use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::logging::LogDestination;

/// Relay: submit a queue of CSV queries to a reporting site and collect the results.
#[derive(Debug, Parser)]
#[command(name = "relay")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "relay.ron", global = true)]
    pub config: PathBuf,

    /// Directory holding the persisted session state
    #[arg(long, default_value = ".", global = true)]
    pub state_dir: PathBuf,

    /// Directory the final CSV is written to
    #[arg(short, long, default_value = "output", global = true)]
    pub output_dir: PathBuf,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal, global = true)]
    pub log: LogDestination,

    /// Log debug details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a query file as a new session and run it
    Upload {
        /// CSV file whose first line is a header
        file: PathBuf,

        /// Reduce rows to the id and status columns, dropping excluded rows
        #[arg(long)]
        project: bool,

        /// Id column name (implies --project)
        #[arg(long)]
        id_column: Option<String>,

        /// Status column name (implies --project)
        #[arg(long)]
        status_column: Option<String>,

        /// Status value whose rows are dropped (implies --project)
        #[arg(long)]
        excluded_status: Option<String>,

        /// Ask before each next query instead of continuing automatically
        #[arg(long)]
        confirm_each: bool,
    },

    /// Continue the persisted session from the start page
    Resume,

    /// Show the persisted session
    Status,

    /// Delete the persisted session
    Reset,

    /// Turn automatic continuation between queries on or off
    Autoclick {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}
