// Analysis module: the layered pipeline and its orchestrator

pub mod cache;
pub mod components;
pub mod imports;
pub mod metrics;
pub mod relations;

pub use cache::{Clock, FixedClock, LayeredCache, SystemClock};
pub use components::{
    ApiDefinition, ApiEndpoint, ApiParameter, ApiTypeDefinition, Component, ComponentBuilder,
    ComponentKind, FileFacts, Granularity, SCHEMA_VERSION,
};
pub use imports::ImportResolver;
pub use metrics::{Metrics, MetricsEngine};
pub use relations::{Relation, RelationGraphBuilder, RelationKind};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::files::{collect_files, SourceFile};
use crate::ignore::IgnoreResolver;
use crate::parser::StructuralExtractor;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Requested zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    #[default]
    Top,
    Middle,
    Detail,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Layer::Top => "top",
            Layer::Middle => "middle",
            Layer::Detail => "detail",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Layer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "top" => Ok(Layer::Top),
            "middle" => Ok(Layer::Middle),
            "detail" => Ok(Layer::Detail),
            other => Err(Error::InvalidLayer(other.to_string())),
        }
    }
}

/// Parameters of one analysis request
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub layer: Layer,
    /// Restrict detail analysis to a subtree
    pub focus_path: Option<String>,
    /// Cap on the reported dependency-traversal depth
    pub max_depth: Option<usize>,
    pub include_tests: bool,
}

/// Result of one layered analysis.
///
/// Immutable once produced: it is either returned fresh or served verbatim
/// from the cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    pub layer: Layer,
    pub components: Vec<Component>,
    pub relations: Vec<Relation>,
    pub metrics: Metrics,
    /// Files that failed to parse (path -> error message)
    pub parse_errors: BTreeMap<String, String>,
    /// Non-fatal resolution warnings
    pub warnings: Vec<String>,
    pub timestamp_ms: u64,
    pub version: String,
}

/// Top-level entry point running the layered pipeline.
///
/// Bound to one analysis root; its cache is keyed by request parameters
/// within that root.
pub struct LayeredAnalyzer {
    root: PathBuf,
    config: Config,
    cache: LayeredCache,
    clock: Arc<dyn Clock>,
    verbose: bool,
}

impl LayeredAnalyzer {
    /// Create an analyzer for the tree at `root`
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self::with_clock(root, config, Arc::new(SystemClock))
    }

    /// Create an analyzer with an injected time source (used by the cache
    /// and for result timestamps)
    pub fn with_clock(root: impl Into<PathBuf>, config: Config, clock: Arc<dyn Clock>) -> Self {
        let cache = LayeredCache::with_clock(
            Duration::from_secs(config.cache.max_age_secs),
            Arc::clone(&clock),
        );
        Self {
            root: root.into(),
            config,
            cache,
            clock,
            verbose: false,
        }
    }

    /// Enable progress output during extraction
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Explicitly drop a cached result
    pub fn invalidate(&self, layer: Layer, focus_path: Option<&str>) {
        self.cache.invalidate(&LayeredCache::key(layer, focus_path));
    }

    /// Analyze the bound tree, consulting the cache first
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<Arc<Analysis>> {
        let key = LayeredCache::key(request.layer, request.focus_path.as_deref());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        if !self.root.exists() {
            return Err(Error::PathNotFound(self.root.clone()));
        }
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());

        let mut rules = IgnoreResolver::resolve(&root);
        rules.add_excludes(&self.config.analysis.exclude, &root);

        let mut file_config = self.config.analysis.clone();
        file_config.include_tests = file_config.include_tests || request.include_tests;

        let files = collect_files(&root, &rules, &file_config)?;
        let analysis = Arc::new(self.analyze_files(&files, request, rules.warnings.clone())?);

        self.cache.set(key, Arc::clone(&analysis));
        Ok(analysis)
    }

    /// Run the pipeline over an already-discovered file set.
    ///
    /// This is the pure core: no filesystem access happens past this point.
    pub fn analyze_files(
        &self,
        files: &[SourceFile],
        request: &AnalysisRequest,
        warnings: Vec<String>,
    ) -> Result<Analysis> {
        let (file_facts, parse_errors) = self.extract_facts(files);

        let (components, relations) = match request.layer {
            Layer::Top => {
                let components =
                    ComponentBuilder::build(&file_facts, Granularity::Module, false);
                let relations = RelationGraphBuilder::build(&components);
                (components, relations)
            }
            Layer::Middle => {
                let components = ComponentBuilder::build(&file_facts, Granularity::Module, true);
                let relations = RelationGraphBuilder::build_with_api_descriptions(&components);
                (components, relations)
            }
            Layer::Detail => {
                let focused: Vec<FileFacts> = match &request.focus_path {
                    Some(focus) => file_facts
                        .into_iter()
                        .filter(|f| in_subtree(&f.fact.path, focus))
                        .collect(),
                    None => file_facts,
                };
                let components = ComponentBuilder::build(&focused, Granularity::File, true);
                let relations = RelationGraphBuilder::build_detailed(&components);
                (components, relations)
            }
        };

        let mut metrics = MetricsEngine::calculate(&components, &relations);
        let max_depth = request.max_depth.unwrap_or(self.config.analysis.max_depth);
        metrics.dependency_depth = metrics.dependency_depth.min(max_depth);

        Ok(Analysis {
            layer: request.layer,
            components,
            relations,
            metrics,
            parse_errors,
            warnings,
            timestamp_ms: self.clock.now_millis(),
            version: SCHEMA_VERSION.to_string(),
        })
    }

    /// Parse files in parallel. A file that fails to parse contributes no
    /// facts; its diagnostic is recorded and the batch continues.
    fn extract_facts(&self, files: &[SourceFile]) -> (Vec<FileFacts>, BTreeMap<String, String>) {
        let parseable: Vec<&SourceFile> = files.iter().filter(|f| f.content.is_some()).collect();

        let progress = if self.verbose {
            let pb = ProgressBar::new(parseable.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let results: Vec<(String, std::result::Result<crate::parser::SourceFact, String>, String)> =
            parseable
                .par_iter()
                .map_init(
                    || StructuralExtractor::new().ok(),
                    |extractor, file| {
                        let content = file.content.clone().unwrap_or_default();
                        let outcome = match extractor.as_mut() {
                            Some(ext) => {
                                ext.extract(&file.path, &content).map_err(|e| e.to_string())
                            }
                            None => Err("structural extractor unavailable".to_string()),
                        };
                        if let Some(pb) = &progress {
                            pb.inc(1);
                        }
                        (file.path.clone(), outcome, content)
                    },
                )
                .collect();

        if let Some(pb) = progress {
            pb.finish_with_message("Extraction complete");
        }

        let mut parse_errors = BTreeMap::new();
        let mut file_facts = Vec::new();
        for (path, outcome, content) in results {
            match outcome {
                Ok(fact) => file_facts.push(FileFacts { fact, content }),
                Err(message) => {
                    parse_errors.insert(path, message);
                }
            }
        }
        file_facts.sort_by(|a, b| a.fact.path.cmp(&b.fact.path));

        // Rewrite raw specifiers to root-relative paths where they resolve
        let resolver = ImportResolver::new(files.iter().map(|f| f.path.clone()));
        for file in &mut file_facts {
            file.fact.imports = resolver.resolve_all(&file.fact.imports, &file.fact.path);
        }

        (file_facts, parse_errors)
    }
}

/// Subtree membership with a path-segment boundary
fn in_subtree(path: &str, focus: &str) -> bool {
    path == focus || path.starts_with(&format!("{}/", focus.trim_end_matches('/')))
}
