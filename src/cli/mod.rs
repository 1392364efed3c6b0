//! CLI module for stratamap

mod args;

pub use args::{Args, Command};

use crate::analysis::{AnalysisRequest, Layer, LayeredAnalyzer};
use crate::config::Config;
use crate::error::Result;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Analyze {
            path,
            layer,
            focus,
            exclude,
            config,
            depth,
            include_tests,
            verbose,
        } => {
            // Load config file if it exists
            let mut cfg = if let Some(config_path) = &config {
                Config::load_or_default(config_path)
            } else {
                Config::load_or_default(Path::new("stratamap.toml"))
            };

            // Merge CLI arguments (CLI takes precedence)
            cfg.merge_cli(exclude, depth, include_tests);

            // Invalid layer strings are rejected before any work happens
            let layer = Layer::from_str(&layer)?;

            if verbose {
                eprintln!("Analyzing: {}", path.display());
                eprintln!("Layer: {}", layer);
                if let Some(focus) = &focus {
                    eprintln!("Focus: {}", focus);
                }
                eprintln!("Depth: {}", cfg.analysis.max_depth);
                eprintln!("Include tests: {}", cfg.analysis.include_tests);
                eprintln!("Exclude: {:?}", cfg.analysis.exclude);
            }

            if !path.exists() {
                return Err(crate::error::Error::PathNotFound(path));
            }

            let request = AnalysisRequest {
                layer,
                focus_path: focus,
                max_depth: depth,
                include_tests,
            };

            let analyzer = LayeredAnalyzer::new(&path, cfg).with_verbose(verbose);
            let analysis = analyzer.analyze(&request)?;

            if verbose && !analysis.parse_errors.is_empty() {
                eprintln!("\nParse errors ({}):", analysis.parse_errors.len());
                for (path, err) in analysis.parse_errors.iter().take(5) {
                    eprintln!("  {}: {}", path, err);
                }
                if analysis.parse_errors.len() > 5 {
                    eprintln!("  ... and {} more", analysis.parse_errors.len() - 5);
                }
            }

            let json = serde_json::to_string_pretty(&*analysis)?;
            println!("{}", json);

            Ok(())
        }

        Command::Version => {
            println!("stratamap {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
