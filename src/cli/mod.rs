//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tradesearch",
    version,
    about = "Retrieval pipeline for trade-document Q&A",
    long_about = "Tradesearch answers questions over a trade-document corpus: it rewrites (and, for \
                  compound questions, decomposes) the query, runs concurrent vector searches, and \
                  allocates a shared result budget through an optional reranking service."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/tradesearch/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the document corpus and print ranked excerpts
    Search {
        /// Question to search for
        question: String,

        /// Candidates fetched from the index per query
        #[arg(short, long)]
        limit: Option<usize>,

        /// Total number of passages to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Budget strategy: "unified" or "balanced"
        #[arg(short, long)]
        strategy: Option<String>,

        /// Skip the reranking service and use raw similarity order
        #[arg(long)]
        no_rerank: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the active config path)
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
