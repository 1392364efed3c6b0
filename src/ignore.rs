// Ignore-rule resolution
//
// Merges default exclusions with every rule file discovered from the
// filesystem root down to the analysis root and below it. Rules are ordered
// shallow to deep, so deeper rule files override shallower ones; the last
// matching rule decides whether a path is ignored.

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the per-directory rule file
pub const RULE_FILE_NAME: &str = ".gitignore";

/// Module-isolation directories refused outright, before any rule is consulted
const ISOLATED_DIRS: [&str; 2] = ["venv", ".venv"];

/// Ecosystem-convention exclusions pre-seeded into every rule set
const DEFAULT_EXCLUDES: [&str; 21] = [
    "node_modules",
    "package-lock.json",
    "yarn.lock",
    ".npm",
    ".git",
    ".svn",
    ".hg",
    "dist",
    "build",
    "out",
    "__pycache__",
    ".tox",
    ".cache",
    ".pytest_cache",
    "coverage",
    ".idea",
    ".vscode",
    ".DS_Store",
    "Thumbs.db",
    ".tmp",
    "tmp",
];

/// Whether a rule excludes or re-includes matching paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Exclude,
    Include,
}

/// Pattern shape decided once at resolution time
#[derive(Debug, Clone)]
enum Matcher {
    /// No glob metacharacters; matches the path, anything beneath it, and
    /// (for single-segment patterns) any path segment of that name
    Literal(String),
    /// `prefix/**`: the directory and everything under it
    DirPrefix(String),
    /// Full glob, dotfiles matched
    Glob(Pattern),
}

/// One resolved ignore rule
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub pattern: String,
    pub scope: PathBuf,
    pub polarity: Polarity,
    matcher: Matcher,
}

impl IgnoreRule {
    fn new(pattern: String, scope: PathBuf, polarity: Polarity) -> Option<Self> {
        let matcher = if !pattern.contains(['*', '?', '[']) {
            Matcher::Literal(pattern.clone())
        } else if let Some(prefix) = pattern.strip_suffix("/**") {
            Matcher::DirPrefix(prefix.to_string())
        } else {
            Matcher::Glob(Pattern::new(&pattern).ok()?)
        };

        Some(Self {
            pattern,
            scope,
            polarity,
            matcher,
        })
    }

    /// Check this rule against a root-relative, forward-slash path
    fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(lit) => {
                if path == lit || path.starts_with(&format!("{}/", lit)) {
                    return true;
                }
                // Bare names match as a segment anywhere in the tree
                !lit.contains('/') && path.split('/').any(|seg| seg == lit)
            }
            Matcher::DirPrefix(prefix) => {
                path == prefix || path.starts_with(&format!("{}/", prefix))
            }
            Matcher::Glob(pattern) => {
                let options = MatchOptions {
                    case_sensitive: true,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                };
                pattern.matches_with(path, options)
            }
        }
    }
}

/// The ordered rule set for one analysis root
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<IgnoreRule>,
    /// Rule files that could not be read (path -> diagnostic)
    pub warnings: Vec<String>,
}

impl RuleSet {
    /// Number of resolved rules, defaults included
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append caller-supplied exclude globs; they extend, never replace
    pub fn add_excludes(&mut self, patterns: &[String], scope: &Path) {
        for raw in patterns {
            let pattern = normalize_pattern(raw, "");
            if pattern.is_empty() {
                continue;
            }
            if let Some(rule) = IgnoreRule::new(pattern, scope.to_path_buf(), Polarity::Exclude) {
                self.rules.push(rule);
            }
        }
    }

    /// Decide whether a root-relative path is excluded from analysis.
    ///
    /// The last matching rule wins, so an Include rule declared in a deeper
    /// rule file un-ignores a path excluded further up.
    pub fn is_ignored(&self, path: &str, _is_dir: bool) -> bool {
        let path = path.trim_start_matches("./").replace('\\', "/");

        // Safety rule: module-isolation directories never participate
        if path
            .split('/')
            .any(|seg| ISOLATED_DIRS.contains(&seg))
        {
            return true;
        }

        let mut verdict = false;
        for rule in &self.rules {
            if rule.matches(&path) {
                verdict = rule.polarity == Polarity::Exclude;
            }
        }
        verdict
    }

    /// Whether an Include rule names a path below `dir`. Walkers must not
    /// prune an excluded directory while one of its descendants is
    /// re-included.
    pub fn has_reinclusions_below(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.rules
            .iter()
            .any(|r| r.polarity == Polarity::Include && r.pattern.starts_with(&prefix))
    }
}

/// Resolves ignore rules for an analysis root
pub struct IgnoreResolver;

impl IgnoreResolver {
    /// Build the rule set for `root`.
    ///
    /// Rule files are collected from every ancestor directory (filesystem
    /// root first) and then from every directory below the analysis root,
    /// shallow to deep. A rule file that cannot be read is skipped with a
    /// recorded warning; it never aborts resolution.
    pub fn resolve(root: &Path) -> RuleSet {
        let mut set = RuleSet::default();

        for pattern in DEFAULT_EXCLUDES {
            if let Some(rule) =
                IgnoreRule::new(pattern.to_string(), root.to_path_buf(), Polarity::Exclude)
            {
                set.rules.push(rule);
            }
        }

        // Ancestors, filesystem root down to the analysis root
        let mut ancestors: Vec<&Path> = root.ancestors().skip(1).collect();
        ancestors.reverse();
        for dir in ancestors {
            collect_rule_file(&mut set, dir, "");
        }
        collect_rule_file(&mut set, root, "");

        // Nested rule files, shallow to deep
        let mut nested: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == RULE_FILE_NAME)
            .map(|e| e.into_path())
            .collect();
        nested.sort();

        for file in nested {
            let dir = match file.parent() {
                Some(d) => d.to_path_buf(),
                None => continue,
            };
            let offset = dir
                .strip_prefix(root)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            collect_rule_file(&mut set, &dir, &offset);
        }

        set
    }
}

/// Parse one rule file into the set, if present
fn collect_rule_file(set: &mut RuleSet, dir: &Path, offset: &str) {
    let file = dir.join(RULE_FILE_NAME);
    if !file.is_file() {
        return;
    }

    let contents = match std::fs::read_to_string(&file) {
        Ok(c) => c,
        Err(e) => {
            set.warnings
                .push(format!("skipped unreadable rule file {}: {}", file.display(), e));
            return;
        }
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (raw, polarity) = match line.strip_prefix('!') {
            // Negations refer back to root-anchored exclusions, so they are
            // normalized without the directory offset
            Some(rest) => (rest, Polarity::Include),
            None => (line, Polarity::Exclude),
        };

        let pattern = match polarity {
            Polarity::Include => normalize_pattern(raw, ""),
            Polarity::Exclude => normalize_pattern(raw, offset),
        };
        if pattern.is_empty() {
            continue;
        }

        if let Some(rule) = IgnoreRule::new(pattern, dir.to_path_buf(), polarity) {
            set.rules.push(rule);
        }
    }
}

/// Strip one leading separator, re-anchor at the analysis root via the rule
/// file's directory offset, and normalize separators to forward slashes
fn normalize_pattern(raw: &str, offset: &str) -> String {
    let mut pattern = raw.trim().replace('\\', "/");
    if let Some(stripped) = pattern.strip_prefix('/') {
        pattern = stripped.to_string();
    }
    if let Some(stripped) = pattern.strip_suffix('/') {
        pattern = stripped.to_string();
    }
    if pattern.is_empty() {
        return pattern;
    }
    if offset.is_empty() {
        pattern
    } else {
        format!("{}/{}", offset, pattern)
    }
}
