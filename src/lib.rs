//! Stratamap - Multi-resolution structural models of codebases
//!
//! Analyzes TypeScript/JavaScript codebases into components, weighted
//! relations, and quality metrics at three zoom levels (top, middle,
//! detail).

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod ignore;
pub mod parser;

// Re-export main types
pub use analysis::{Analysis, AnalysisRequest, Layer, LayeredAnalyzer};
pub use config::Config;
pub use error::{Error, Result};
