//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "retro-art")]
#[command(about = "Download box art, wheels and screenshots for a ROM library", long_about = None)]
pub(crate) struct Cli {
    /// Library root containing one folder per system (defaults to settings, then current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Fetch artwork for every ROM in the library
    Scrape {
        /// Maximum concurrent workers (capped by the server allowance)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Artwork categories to fetch (box, wheel, screenshot)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// Only process these system folders or aliases (e.g., nes,snes,gg)
        #[arg(short, long, value_delimiter = ',')]
        systems: Option<Vec<String>>,

        /// Don't write a log file to the library root
        #[arg(long)]
        no_log: bool,
    },

    /// List known system folder names
    Systems,

    /// Manage API credentials and settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect the record of ROMs the catalog has no match for
    Memo {
        #[command(subcommand)]
        action: MemoAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show current configuration (passwords masked)
    Show,

    /// Print config file paths
    Path,
}

#[derive(Subcommand)]
pub(crate) enum MemoAction {
    /// List remembered not-found ROMs
    List,

    /// Forget every remembered ROM so the next scrape retries them
    Clear,
}
