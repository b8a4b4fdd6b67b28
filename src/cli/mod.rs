use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod handlers;

pub use handlers::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Data directory. Defaults to $MIXNOTE_BASE_PATH or ~/.local/share/mixnote
    #[clap(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add or replace a note
    Add {
        /// Note id
        id: String,

        /// Note text
        #[clap(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read note text from a file
        #[clap(short, long)]
        file: Option<PathBuf>,
    },
    /// Search notes by meaning
    Search {
        /// Query text, may mix Latin and native script
        query: String,

        /// Number of results. Defaults to `default_top_k` from config
        #[clap(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// List note ids
    List {},
    /// Remove a note
    Remove {
        /// Note id
        id: String,
    },
    /// Replay all stored notes and refresh the embedding cache
    Rebuild {},
    /// Print index statistics
    Stats {},
}
