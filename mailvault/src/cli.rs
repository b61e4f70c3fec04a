use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mailvault", version, about = "Archive a Gmail label locally and enforce a retention window")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Archive every message carrying the backup label, then print stats
    Backup,

    /// Trash remote messages older than the retention window, then print stats
    Cleanup {
        /// Report what would be deleted without touching Gmail or the archive
        #[arg(long)]
        dry_run: bool,
    },

    /// Full-text search over the local archive
    Search {
        /// Search terms (FTS5 syntax), joined with spaces
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Print archive statistics and recent cleanup runs
    Stats,
}
