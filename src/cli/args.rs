//! Command-line argument parsing for citeline
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// citeline - Ground LLM answers in a local knowledge base with citations
#[derive(Parser, Debug)]
#[command(name = "citeline")]
#[command(version = "0.3.0")]
#[command(about = "Retrieve, rank and cite knowledge-base evidence", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (normal), -v (verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk and embed the knowledge base into the vector store
    Index {
        /// Knowledge-base folder (overrides config)
        #[arg(long)]
        kb_folder: Option<PathBuf>,
    },

    /// Retrieve evidence for a question and print the cited context
    Ask {
        /// The question to ground
        question: String,

        /// Raw matches to fetch (overrides config)
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum similarity score to keep (overrides config)
        #[arg(long)]
        min_score: Option<f32>,

        /// Maximum evidence items to keep (overrides config)
        #[arg(long)]
        final_top_k: Option<usize>,
    },

    /// Check that the embedding service and vector store are reachable
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose == 0 {
            Verbosity::Normal
        } else {
            Verbosity::Verbose
        }
    }
}

impl Verbosity {
    /// Check if progress bars should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if detailed output should be shown
    pub fn show_details(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}
