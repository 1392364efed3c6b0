// Component construction and grouping
//
// Groups extracted files into logical components at the requested
// granularity and synthesizes a description and composite metric set
// for each one.

use crate::parser::{DeclKind, Declaration, SourceFact};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version stamped on analyses and API definitions
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Component grouping granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Files grouped by parent directory
    Module,
    /// Each file is its own component
    File,
}

/// Kind of component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    File,
    Module,
}

/// A logical analysis unit carrying derived metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    /// File path or module-boundary directory, root-relative
    pub path: String,
    pub kind: ComponentKind,
    pub name: String,
    /// Concatenated documentation fragments from the member files
    pub description: String,
    /// Mean cyclomatic complexity of the member files
    pub complexity: f64,
    /// Import targets: resolved paths or raw specifiers
    pub dependencies: Vec<String>,
    /// API surface, attached at middle/detail granularity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apis: Option<Vec<ApiDefinition>>,
    /// Maintainability index, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainability: Option<f64>,
    /// Change-frequency estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_frequency: Option<f64>,
}

/// API surface of one class-like declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiDefinition {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<ApiEndpoint>,
    pub types: Vec<ApiTypeDefinition>,
}

/// A named operation.
///
/// The GET verb and `/<method>` path are placeholders when the source
/// carries no richer protocol annotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEndpoint {
    pub name: String,
    pub path: String,
    pub method: String,
    pub parameters: Vec<ApiParameter>,
    pub return_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
}

/// A named type participating in an API surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiTypeDefinition {
    pub name: String,
    pub kind: String,
    /// Property name -> type name
    pub properties: BTreeMap<String, String>,
}

/// A parsed file paired with its source text
#[derive(Debug, Clone)]
pub struct FileFacts {
    pub fact: SourceFact,
    pub content: String,
}

/// Builds components from extracted facts
pub struct ComponentBuilder;

impl ComponentBuilder {
    /// Group facts into components at the requested granularity.
    ///
    /// Components come out sorted by path; empty groups are never emitted.
    pub fn build(files: &[FileFacts], granularity: Granularity, with_apis: bool) -> Vec<Component> {
        match granularity {
            Granularity::Module => Self::build_modules(files, with_apis),
            Granularity::File => Self::build_files(files, with_apis),
        }
    }

    fn build_modules(files: &[FileFacts], with_apis: bool) -> Vec<Component> {
        let mut groups: BTreeMap<String, Vec<&FileFacts>> = BTreeMap::new();
        for file in files {
            groups
                .entry(module_path(&file.fact.path))
                .or_default()
                .push(file);
        }

        groups
            .into_iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(path, members)| {
                let name = base_name(&path);
                Self::component(path, name, ComponentKind::Module, &members, with_apis)
            })
            .collect()
    }

    fn build_files(files: &[FileFacts], with_apis: bool) -> Vec<Component> {
        let mut components: Vec<Component> = files
            .iter()
            .map(|file| {
                let path = file.fact.path.clone();
                let name = base_name(&path);
                Self::component(path, name, ComponentKind::File, &[file], with_apis)
            })
            .collect();
        components.sort_by(|a, b| a.path.cmp(&b.path));
        components
    }

    fn component(
        path: String,
        name: String,
        kind: ComponentKind,
        members: &[&FileFacts],
        with_apis: bool,
    ) -> Component {
        let complexity = members
            .iter()
            .map(|f| f.fact.branch_points as f64)
            .sum::<f64>()
            / members.len() as f64;

        let description = members
            .iter()
            .filter_map(|f| f.fact.doc.as_deref())
            .collect::<Vec<_>>()
            .join(". ");

        let mut dependencies: Vec<String> = Vec::new();
        for file in members {
            for dep in &file.fact.imports {
                if !dependencies.contains(dep) {
                    dependencies.push(dep.clone());
                }
            }
        }

        let maintainability = members
            .iter()
            .map(|f| maintainability_index(&f.content, f.fact.branch_points as f64))
            .sum::<f64>()
            / members.len() as f64;

        let apis = if with_apis {
            let defs: Vec<ApiDefinition> = members
                .iter()
                .flat_map(|f| extract_apis(&f.fact))
                .collect();
            if defs.is_empty() {
                None
            } else {
                Some(defs)
            }
        } else {
            None
        };

        Component {
            path,
            kind,
            name,
            description,
            complexity,
            dependencies,
            apis,
            maintainability: Some(maintainability),
            change_frequency: Some(change_frequency(members.len())),
        }
    }
}

/// Parent directory acting as the module boundary; root files group under "."
fn module_path(file_path: &str) -> String {
    match file_path.rfind('/') {
        Some(idx) => file_path[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Last path segment
fn base_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Change-frequency estimate.
///
/// Placeholder pending git-history analysis; non-empty groups report 0.5.
fn change_frequency(file_count: usize) -> f64 {
    if file_count > 0 {
        0.5
    } else {
        0.0
    }
}

/// Build API definitions from a file's class-like declarations.
///
/// Interfaces declared in the same file are attached as named types, along
/// with the class's own property set.
fn extract_apis(fact: &SourceFact) -> Vec<ApiDefinition> {
    let interface_types: Vec<ApiTypeDefinition> = fact
        .interfaces()
        .map(|iface| ApiTypeDefinition {
            name: iface.name.clone(),
            kind: "interface".to_string(),
            properties: iface
                .properties
                .iter()
                .map(|p| (p.name.clone(), p.type_name.clone()))
                .collect(),
        })
        .collect();

    fact.classes()
        .map(|class| {
            let mut types = interface_types.clone();
            if !class.properties.is_empty() {
                types.push(ApiTypeDefinition {
                    name: class.name.clone(),
                    kind: "class".to_string(),
                    properties: class
                        .properties
                        .iter()
                        .map(|p| (p.name.clone(), p.type_name.clone()))
                        .collect(),
                });
            }

            ApiDefinition {
                name: class.name.clone(),
                version: SCHEMA_VERSION.to_string(),
                endpoints: class.public_methods().map(endpoint_from_method).collect(),
                types,
            }
        })
        .collect()
}

fn endpoint_from_method(method: &Declaration) -> ApiEndpoint {
    debug_assert_eq!(method.kind, DeclKind::Function);
    ApiEndpoint {
        name: method.name.clone(),
        path: format!("/{}", method.name),
        method: "GET".to_string(),
        parameters: method
            .params
            .iter()
            .map(|p| ApiParameter {
                name: p.name.clone(),
                type_name: p.type_name.clone(),
                required: true,
            })
            .collect(),
        return_type: method.return_type.clone(),
        description: method.doc.clone().unwrap_or_default(),
    }
}

/// Approximate Halstead volume over a simple operator/operand token split
fn halstead_volume(content: &str) -> f64 {
    let mut operators: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut operands: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut operator_count: usize = 0;
    let mut operand_count: usize = 0;

    let mut chars = content.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphabetic() || c == '_' {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    token.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            operands.insert(token);
            operand_count += 1;
        } else if is_operator_char(c) {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if is_operator_char(c) {
                    token.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            operators.insert(token);
            operator_count += 1;
        } else {
            chars.next();
        }
    }

    let vocabulary = operators.len() + operands.len();
    if vocabulary == 0 {
        return 0.0;
    }
    (operator_count + operand_count) as f64 * (vocabulary as f64).log2()
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '=' | '<' | '>' | '!' | '&' | '|')
}

/// Maintainability index on the 0-100 scale.
///
/// Volume and line count are floored at 1 so empty files stay finite.
fn maintainability_index(content: &str, complexity: f64) -> f64 {
    let volume = halstead_volume(content).max(1.0);
    let loc = content.lines().count().max(1) as f64;

    let mi = (171.0 - 5.2 * volume.ln() - 0.23 * complexity - 16.2 * loc.ln()) * 100.0 / 171.0;
    mi.max(0.0)
}
