//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use memoria_core::MediaView;
use std::path::PathBuf;

/// Memoria - memorial gallery, restyling and guestbook backend
#[derive(Parser, Debug)]
#[command(name = "memoria")]
#[command(about = "Memorial gallery, restyling and guestbook backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address, overriding `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },

    /// Gallery commands
    #[command(subcommand)]
    Media(MediaCommands),

    /// Restyle one Original
    Restyle {
        /// Key of the Original
        key: String,

        /// Ignore any cached result
        #[arg(long)]
        force: bool,
    },

    /// Restyle every Original (Ctrl-C stops after the current item)
    RestyleAll,

    /// Guestbook commands
    #[command(subcommand)]
    Guestbook(GuestbookCommands),

    /// Memorial record commands
    #[command(subcommand)]
    Memorial(MemorialCommands),
}

/// Gallery subcommands
#[derive(Subcommand, Debug)]
pub enum MediaCommands {
    /// Upload a file
    Put {
        /// File to upload
        file: PathBuf,

        /// Display name, defaults to the file name
        #[arg(long)]
        name: Option<String>,
    },

    /// List keys in display order
    List {
        /// Which items to list
        #[arg(long, default_value = "originals")]
        view: MediaView,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Write stored bytes to a file or stdout
    Get {
        /// Key to read
        key: String,

        /// Destination file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete an item (and its restyled version)
    Delete {
        /// Key to delete
        key: String,
    },
}

/// Guestbook subcommands
#[derive(Subcommand, Debug)]
pub enum GuestbookCommands {
    /// Sign the guestbook
    Sign {
        /// Who is signing
        #[arg(long)]
        author: String,

        /// Message to leave
        #[arg(long)]
        message: String,
    },

    /// Show entries newest first
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Delete the entry at a displayed position (0 = newest)
    Delete {
        /// Displayed position
        index: usize,
    },
}

/// Memorial record subcommands
#[derive(Subcommand, Debug)]
pub enum MemorialCommands {
    /// Save the memorial record
    Set {
        /// Name of the one remembered
        #[arg(long)]
        name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        born: chrono::NaiveDate,

        /// Date of passing (YYYY-MM-DD)
        #[arg(long)]
        passed: chrono::NaiveDate,
    },

    /// Show the memorial record
    Show,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
