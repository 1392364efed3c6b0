//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Multi-resolution structural models of codebases
#[derive(Parser, Debug)]
#[command(name = "stratamap")]
#[command(about = "Multi-resolution structural models of codebases")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a codebase and print the layered model as JSON
    Analyze {
        /// Path to the codebase to analyze
        path: PathBuf,

        /// Zoom level (top, middle, detail)
        #[arg(short, long, default_value = "top")]
        layer: String,

        /// Restrict detail analysis to a subtree
        #[arg(long)]
        focus: Option<String>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Max dependency-traversal depth
        #[arg(long)]
        depth: Option<usize>,

        /// Include test files in the analysis
        #[arg(long)]
        include_tests: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}
