// File discovery and reading
//
// The analysis core operates on `SourceFile` records; this module is the
// default provider, walking the tree gated by the resolved ignore rules.

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::ignore::RuleSet;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// Hard limits on a single discovery pass
pub const MAX_FILES: usize = 10_000;
pub const MAX_TOTAL_SIZE: u64 = 500 * 1024 * 1024;

/// One discovered file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceFile {
    /// Analysis-root-relative path, forward slashes
    pub path: String,
    /// Text content; None for binary, oversized, or unreadable files
    pub content: Option<String>,
    /// Size in bytes
    pub size: u64,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let size = content.len() as u64;
        Self {
            path: path.into(),
            content: Some(content),
            size,
        }
    }
}

/// Check a path against test-file conventions
pub fn is_test_path(path: &str) -> bool {
    path.contains(".test.")
        || path.contains(".spec.")
        || path
            .split('/')
            .any(|seg| seg == "__tests__" || seg == "tests" || seg == "test")
}

/// Discover the files participating in analysis.
///
/// Paths are reported relative to `root` with forward slashes, sorted for
/// deterministic downstream processing.
pub fn collect_files(
    root: &Path,
    rules: &RuleSet,
    config: &AnalysisConfig,
) -> Result<Vec<SourceFile>> {
    // A `**/` prefix also admits root-level files, so each such pattern is
    // compiled with and without it
    let mut includes: Vec<Pattern> = Vec::new();
    for raw in &config.include {
        if let Ok(pattern) = Pattern::new(raw) {
            includes.push(pattern);
        }
        if let Some(rest) = raw.strip_prefix("**/") {
            if let Ok(pattern) = Pattern::new(rest) {
                includes.push(pattern);
            }
        }
    }

    let mut files = Vec::new();
    let mut total_size: u64 = 0;

    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        let rel = relative_path(root, e.path());
        if rel.is_empty() {
            return true;
        }
        let is_dir = e.file_type().is_dir();
        if !rules.is_ignored(&rel, is_dir) {
            return true;
        }
        // Keep walking into excluded directories that shelter re-included
        // descendants; files below are still checked individually
        is_dir && rules.has_reinclusions_below(&rel)
    }) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = relative_path(root, entry.path());
        if !matches_include(&rel, &includes) {
            continue;
        }
        if !config.include_tests && is_test_path(&rel) {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let content = if size <= config.max_file_size {
            std::fs::read(entry.path())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        } else {
            None
        };

        total_size += size;
        files.push(SourceFile {
            path: rel,
            content,
            size,
        });

        if files.len() >= MAX_FILES || total_size >= MAX_TOTAL_SIZE {
            break;
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn matches_include(path: &str, includes: &[Pattern]) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    includes.iter().any(|p| p.matches_with(path, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::IgnoreResolver;
    use std::fs;
    use tempfile::TempDir;

    fn collect(dir: &TempDir) -> Vec<SourceFile> {
        let rules = IgnoreResolver::resolve(dir.path());
        collect_files(dir.path(), &rules, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_collects_sorted_source_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.ts"), "export const B_VAL = 2;").unwrap();
        fs::write(dir.path().join("a.ts"), "export const A_VAL = 1;").unwrap();
        fs::write(dir.path().join("readme.md"), "# docs").unwrap();

        let files = collect(&dir);
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_ignored_directories_are_pruned() {
        let dir = TempDir::new().unwrap();
        let nm = dir.path().join("node_modules").join("pkg");
        fs::create_dir_all(&nm).unwrap();
        fs::write(nm.join("index.js"), "module.exports = {};").unwrap();
        fs::write(dir.path().join("app.ts"), "const x = 1;").unwrap();

        let files = collect(&dir);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "app.ts");
    }

    #[test]
    fn test_test_files_excluded_by_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.ts"), "const x = 1;").unwrap();
        fs::write(dir.path().join("app.test.ts"), "const y = 2;").unwrap();

        let files = collect(&dir);
        assert_eq!(files.len(), 1);

        let rules = IgnoreResolver::resolve(dir.path());
        let mut config = AnalysisConfig::default();
        config.include_tests = true;
        let files = collect_files(dir.path(), &rules, &config).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_oversized_file_keeps_no_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("big.ts"), "const x = 1;").unwrap();

        let rules = IgnoreResolver::resolve(dir.path());
        let mut config = AnalysisConfig::default();
        config.max_file_size = 4;
        let files = collect_files(dir.path(), &rules, &config).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].content.is_none());
        assert!(files[0].size > 4);
    }

    #[test]
    fn test_binary_file_keeps_no_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blob.ts"), [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let files = collect(&dir);
        assert_eq!(files.len(), 1);
        assert!(files[0].content.is_none());
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("src/app.test.ts"));
        assert!(is_test_path("src/app.spec.ts"));
        assert!(is_test_path("src/__tests__/app.ts"));
        assert!(is_test_path("tests/app.ts"));
        assert!(!is_test_path("src/app.ts"));
    }

    #[test]
    fn test_nested_paths_use_forward_slashes() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("src").join("api");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("routes.ts"), "const x = 1;").unwrap();

        let files = collect(&dir);
        assert_eq!(files[0].path, "src/api/routes.ts");
    }
}
