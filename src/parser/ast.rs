// Structural facts extracted from source files
//
// These types represent what the extractor keeps from a file's syntax tree:
// declarations, import targets, and branch-point counts. They are designed
// to be serializable for caching and debugging.

use serde::{Deserialize, Serialize};

/// One file's extracted structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceFact {
    /// File path relative to the analysis root, forward slashes
    pub path: String,
    /// File-level description (first `/**` block comment)
    pub doc: Option<String>,
    /// Declarations in source order
    pub declarations: Vec<Declaration>,
    /// Import targets: resolved root-relative paths where resolvable,
    /// raw module specifiers otherwise
    pub imports: Vec<String>,
    /// Cyclomatic complexity (base 1 plus one per branch point)
    pub branch_points: u32,
    /// Total lines in file
    pub total_lines: usize,
    /// Lines of code (excluding blanks and comments)
    pub code_lines: usize,
    /// Comment lines
    pub comment_lines: usize,
}

impl SourceFact {
    /// Create an empty fact for a path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            doc: None,
            declarations: Vec::new(),
            imports: Vec::new(),
            branch_points: 1,
            total_lines: 0,
            code_lines: 0,
            comment_lines: 0,
        }
    }

    /// Check if the file produced any declarations
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Iterate over class-like declarations
    pub fn classes(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind == DeclKind::Class)
    }

    /// Iterate over interface-like declarations
    pub fn interfaces(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind == DeclKind::Interface)
    }
}

/// Kind of declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Class,
    Function,
    Interface,
    Constant,
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Parse an accessibility modifier keyword
    pub fn from_keyword(word: &str) -> Self {
        match word {
            "private" => Visibility::Private,
            "protected" => Visibility::Protected,
            _ => Visibility::Public,
        }
    }
}

/// A single extracted declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Declaration {
    pub kind: DeclKind,
    pub name: String,
    /// Description from the immediately preceding `/**` block comment
    pub doc: Option<String>,
    /// Parameters (function-like kinds and methods)
    pub params: Vec<Parameter>,
    /// Return type, `"any"` when unannotated
    pub return_type: String,
    /// Superclass or extended interface
    pub extends: Option<String>,
    /// Implemented capability names (class-like kinds)
    pub implements: Vec<String>,
    /// Methods for class-like kinds
    pub methods: Vec<Declaration>,
    /// Properties for class-like and interface-like kinds
    pub properties: Vec<Property>,
    /// Literal initializer text (constants)
    pub value: Option<String>,
    pub is_async: bool,
    pub is_static: bool,
    pub visibility: Visibility,
}

impl Declaration {
    pub fn new(kind: DeclKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            doc: None,
            params: Vec::new(),
            return_type: "any".to_string(),
            extends: None,
            implements: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            value: None,
            is_async: false,
            is_static: false,
            visibility: Visibility::Public,
        }
    }

    /// Get public methods (Public visibility, not underscore-prefixed)
    pub fn public_methods(&self) -> impl Iterator<Item = &Declaration> {
        self.methods
            .iter()
            .filter(|m| m.visibility == Visibility::Public && !m.name.starts_with('_'))
    }

    /// Check if a constant name follows the UPPER_SNAKE_CASE convention
    pub fn is_conventional_constant(&self) -> bool {
        self.kind == DeclKind::Constant
            && !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit())
    }

    /// Render the declaration signature as a string
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        let prefix = if self.is_async { "async " } else { "" };
        format!(
            "{}{}({}): {}",
            prefix,
            self.name,
            params.join(", "),
            self.return_type
        )
    }
}

/// A declaration parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Canonical type name, `"any"` when unannotated
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: "any".to_string(),
        }
    }

    pub fn with_type(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)
    }
}

/// A class or interface property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub name: String,
    pub type_name: String,
    pub visibility: Visibility,
    /// Default value as written, if present
    pub default: Option<String>,
}

impl Property {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            visibility: Visibility::Public,
            default: None,
        }
    }
}
