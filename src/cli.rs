use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::Direction;

#[derive(Parser)]
#[command(name = "pokedex-neighbors")]
#[command(about = "Predecessor/successor lookup over the national Pokédex", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Load the catalog and serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Request handler threads
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Catalog snapshot (overrides POKEDEX_CACHE_FILE)
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Directory served under / and /static
        #[arg(long, default_value = "static")]
        static_dir: PathBuf,
    },

    /// Resolve one name and print the result as JSON.
    Lookup {
        name: String,
        /// antecedente | successore. Both when omitted.
        #[arg(short, long, value_enum)]
        direction: Option<Direction>,
        #[arg(long)]
        cache: Option<PathBuf>,
    },

    /// Re-download the species list and rewrite the snapshot.
    Refresh {
        #[arg(long)]
        cache: Option<PathBuf>,
    },
}
