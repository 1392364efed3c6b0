// Import resolution for module specifiers
//
// Maps relative specifiers like `./util` onto the files they name, so that
// component dependencies reference real analysis paths. Bare specifiers
// (packages, node builtins) are left as written.

use std::collections::HashSet;

/// File extensions tried when a specifier omits one
const RESOLVE_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// Resolves import specifiers against the discovered file set
#[derive(Debug, Clone)]
pub struct ImportResolver {
    files: HashSet<String>,
}

impl ImportResolver {
    /// Create a resolver over the known root-relative file paths
    pub fn new(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            files: paths.into_iter().collect(),
        }
    }

    /// Resolve a single specifier from the importing file's location.
    ///
    /// Returns the root-relative path of the target file, or None when the
    /// specifier is not relative or names no known file.
    pub fn resolve(&self, specifier: &str, from: &str) -> Option<String> {
        if !specifier.starts_with('.') {
            return None;
        }

        let base = match from.rfind('/') {
            Some(idx) => &from[..idx],
            None => "",
        };
        let joined = normalize_path(&format!("{}/{}", base, specifier));

        if self.files.contains(&joined) {
            return Some(joined);
        }
        for ext in RESOLVE_EXTENSIONS {
            let candidate = format!("{}.{}", joined, ext);
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }
        for ext in RESOLVE_EXTENSIONS {
            let candidate = format!("{}/index.{}", joined, ext);
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }

        None
    }

    /// Resolve every specifier, keeping unresolvable ones as written
    pub fn resolve_all(&self, specifiers: &[String], from: &str) -> Vec<String> {
        let mut out = Vec::with_capacity(specifiers.len());
        for spec in specifiers {
            let resolved = self.resolve(spec, from).unwrap_or_else(|| spec.clone());
            if !out.contains(&resolved) {
                out.push(resolved);
            }
        }
        out
    }
}

/// Collapse `.` and `..` segments in a forward-slash path
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(seg),
        }
    }
    segments.join("/")
}
