// TypeScript/JavaScript structural extractor using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::*;
use tree_sitter::{Node, Parser};

/// Supported JavaScript variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsVariant {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

impl JsVariant {
    /// Detect variant from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "mjs" => Some(Self::JavaScript),
            "cjs" => Some(Self::JavaScript),
            "mts" => Some(Self::TypeScript),
            "cts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    /// Detect variant from a file path
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?;
        Self::from_extension(ext)
    }

    /// Check if this is a TypeScript variant
    pub fn is_typescript(&self) -> bool {
        matches!(self, Self::TypeScript | Self::Tsx)
    }
}

/// Closed classification of the node kinds the extractor understands.
///
/// Every extraction site matches on this enum exhaustively, so a newly
/// supported kind fails to compile until each site handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyntaxKind {
    Import,
    Export,
    Class,
    Function,
    Binding,
    Interface,
    Comment,
    Other,
}

impl SyntaxKind {
    fn classify(kind: &str) -> Self {
        match kind {
            "import_statement" => SyntaxKind::Import,
            "export_statement" => SyntaxKind::Export,
            "class_declaration" | "class" => SyntaxKind::Class,
            "function_declaration" | "function" => SyntaxKind::Function,
            "lexical_declaration" | "variable_declaration" => SyntaxKind::Binding,
            "interface_declaration" => SyntaxKind::Interface,
            "comment" => SyntaxKind::Comment,
            _ => SyntaxKind::Other,
        }
    }
}

/// Extracts structural facts from TypeScript/JavaScript sources
pub struct StructuralExtractor {
    js_parser: Parser,
    ts_parser: Parser,
}

impl StructuralExtractor {
    /// Create a new extractor with both grammars loaded
    pub fn new() -> Result<Self> {
        let mut js_parser = Parser::new();
        let js_language = tree_sitter_javascript::language();
        js_parser
            .set_language(&js_language)
            .map_err(|e| Error::Parser(format!("Failed to set JavaScript language: {}", e)))?;

        let mut ts_parser = Parser::new();
        let ts_language = tree_sitter_typescript::language_typescript();
        ts_parser
            .set_language(&ts_language)
            .map_err(|e| Error::Parser(format!("Failed to set TypeScript language: {}", e)))?;

        Ok(Self {
            js_parser,
            ts_parser,
        })
    }

    /// Extract one file's structure, picking the grammar from its extension
    pub fn extract(&mut self, path: &str, source: &str) -> Result<SourceFact> {
        let variant = JsVariant::from_path(path)
            .ok_or_else(|| Error::parser(format!("Unknown source extension: {}", path)))?;
        self.extract_source(path, source, variant)
    }

    /// Extract structure from source text with an explicit variant
    pub fn extract_source(
        &mut self,
        path: &str,
        source: &str,
        variant: JsVariant,
    ) -> Result<SourceFact> {
        let parser = if variant.is_typescript() {
            &mut self.ts_parser
        } else {
            &mut self.js_parser
        };

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse source"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(Error::parse(path, "syntax error"));
        }

        let mut fact = SourceFact::new(path);

        let (total, code, comment) = count_lines(source);
        fact.total_lines = total;
        fact.code_lines = code;
        fact.comment_lines = comment;

        self.extract_constructs(&root, source.as_bytes(), &mut fact);
        fact.branch_points = 1 + count_branches(&root, source.as_bytes());

        Ok(fact)
    }

    /// Walk top-level constructs, threading doc comments to the declaration
    /// that immediately follows them
    fn extract_constructs(&self, root: &Node, source: &[u8], fact: &mut SourceFact) {
        let mut pending_doc: Option<String> = None;
        let mut cursor = root.walk();

        for child in root.children(&mut cursor) {
            let doc = pending_doc.take();
            self.visit_node(&child, source, fact, doc, &mut pending_doc);
        }
    }

    fn visit_node(
        &self,
        node: &Node,
        source: &[u8],
        fact: &mut SourceFact,
        doc: Option<String>,
        pending_doc: &mut Option<String>,
    ) {
        match SyntaxKind::classify(node.kind()) {
            SyntaxKind::Import => {
                if let Some(target) = parse_import(node, source) {
                    if !fact.imports.contains(&target) {
                        fact.imports.push(target);
                    }
                }
            }
            SyntaxKind::Export => {
                // Recurse into the wrapped declaration, carrying the doc
                // past the `export` keyword token
                let mut inner_doc = doc;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if SyntaxKind::classify(child.kind()) == SyntaxKind::Other {
                        continue;
                    }
                    let d = inner_doc.take();
                    self.visit_node(&child, source, fact, d, pending_doc);
                }
            }
            SyntaxKind::Class => {
                if let Some(mut class) = parse_class(node, source) {
                    class.doc = doc;
                    fact.declarations.push(class);
                }
            }
            SyntaxKind::Function => {
                if let Some(mut func) = parse_function(node, source) {
                    func.doc = doc;
                    fact.declarations.push(func);
                }
            }
            SyntaxKind::Binding => {
                if let Some(mut decl) = parse_binding(node, source) {
                    decl.doc = doc;
                    fact.declarations.push(decl);
                }
            }
            SyntaxKind::Interface => {
                if let Some(mut iface) = parse_interface(node, source) {
                    iface.doc = doc;
                    fact.declarations.push(iface);
                }
            }
            SyntaxKind::Comment => {
                let text = get_text(node, source);
                if text.starts_with("/**") {
                    let cleaned = clean_jsdoc(text);
                    if fact.doc.is_none() && fact.declarations.is_empty() {
                        fact.doc = Some(cleaned.clone());
                    }
                    *pending_doc = Some(cleaned);
                }
            }
            SyntaxKind::Other => {}
        }
    }
}

/// Count total, code, and comment lines
fn count_lines(source: &str) -> (usize, usize, usize) {
    let mut total = 0;
    let mut code = 0;
    let mut comment = 0;
    let mut in_block_comment = false;

    for line in source.lines() {
        total += 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if in_block_comment {
            comment += 1;
            if trimmed.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }

        if trimmed.starts_with("//") {
            comment += 1;
        } else if trimmed.starts_with("/*") {
            comment += 1;
            if !trimmed.contains("*/") {
                in_block_comment = true;
            }
        } else {
            code += 1;
        }
    }

    (total, code, comment)
}

/// Count branch points below a node: conditionals, loops, ternaries,
/// non-default switch cases, and short-circuit logical operators
fn count_branches(node: &Node, source: &[u8]) -> u32 {
    let mut count = match node.kind() {
        "if_statement" | "while_statement" | "do_statement" | "for_statement"
        | "for_in_statement" | "ternary_expression" => 1,
        // switch_default is a distinct node kind, so every switch_case counts
        "switch_case" => 1,
        "binary_expression" => {
            let op = node
                .child_by_field_name("operator")
                .map(|n| get_text(&n, source))
                .unwrap_or("");
            if op == "&&" || op == "||" {
                1
            } else {
                0
            }
        }
        _ => 0,
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        count += count_branches(&child, source);
    }
    count
}

/// Parse an import statement down to its module specifier
fn parse_import(node: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string" {
            let target = get_text(&child, source)
                .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                .to_string();
            if !target.is_empty() {
                return Some(target);
            }
        }
    }
    None
}

/// Parse a class declaration with heritage, methods, and properties
fn parse_class(node: &Node, source: &[u8]) -> Option<Declaration> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;

    let mut class = Declaration::new(DeclKind::Class, &name);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "class_heritage" {
            let mut heritage_cursor = child.walk();
            for heritage_child in child.children(&mut heritage_cursor) {
                match heritage_child.kind() {
                    "extends_clause" => {
                        if let Some(base) = heritage_child.named_child(0) {
                            class.extends = Some(get_text(&base, source).to_string());
                        }
                    }
                    "implements_clause" => {
                        let mut impl_cursor = heritage_child.walk();
                        for impl_child in heritage_child.named_children(&mut impl_cursor) {
                            class
                                .implements
                                .push(get_text(&impl_child, source).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut pending_doc: Option<String> = None;
        let mut body_cursor = body.walk();
        for child in body.children(&mut body_cursor) {
            match child.kind() {
                "method_definition" => {
                    let doc = pending_doc.take();
                    if let Some(mut method) = parse_method(&child, source) {
                        method.doc = doc;
                        class.methods.push(method);
                    }
                }
                "public_field_definition" | "field_definition" => {
                    pending_doc = None;
                    if let Some(prop) = parse_property(&child, source) {
                        class.properties.push(prop);
                    }
                }
                "comment" => {
                    let text = get_text(&child, source);
                    if text.starts_with("/**") {
                        pending_doc = Some(clean_jsdoc(text));
                    }
                }
                _ => {
                    pending_doc = None;
                }
            }
        }
    }

    Some(class)
}

/// Parse a method definition; underscore-prefixed names are skipped
fn parse_method(node: &Node, source: &[u8]) -> Option<Declaration> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;
    if name.starts_with('_') {
        return None;
    }

    let mut method = Declaration::new(DeclKind::Function, &name);
    method.params = parse_parameters(node, source);
    method.return_type = parse_return_type(node, source);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "accessibility_modifier" => {
                method.visibility = Visibility::from_keyword(get_text(&child, source));
            }
            "static" => method.is_static = true,
            "async" => method.is_async = true,
            _ => {}
        }
    }

    Some(method)
}

/// Parse a class field; underscore-prefixed names are skipped
fn parse_property(node: &Node, source: &[u8]) -> Option<Property> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;
    if name.starts_with('_') {
        return None;
    }

    let type_name = node
        .child_by_field_name("type")
        .map(|t| annotation_to_string(&t, source))
        .unwrap_or_else(|| "any".to_string());

    let mut prop = Property::new(&name, &type_name);
    prop.default = node
        .child_by_field_name("value")
        .map(|v| get_text(&v, source).to_string());

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "accessibility_modifier" {
            prop.visibility = Visibility::from_keyword(get_text(&child, source));
        }
    }

    Some(prop)
}

/// Parse a function declaration
fn parse_function(node: &Node, source: &[u8]) -> Option<Declaration> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;

    let mut func = Declaration::new(DeclKind::Function, &name);
    func.params = parse_parameters(node, source);
    func.return_type = parse_return_type(node, source);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "async" {
            func.is_async = true;
        }
    }

    Some(func)
}

/// Parse a const/let binding into either an arrow-function declaration or
/// an upper-snake-case constant
fn parse_binding(node: &Node, source: &[u8]) -> Option<Declaration> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }

        let name = child
            .child_by_field_name("name")
            .map(|n| get_text(&n, source).to_string())?;
        let value = child.child_by_field_name("value");

        if let Some(value) = value {
            if value.kind() == "arrow_function" || value.kind() == "function" {
                let mut func = Declaration::new(DeclKind::Function, &name);
                func.params = parse_parameters(&value, source);
                func.return_type = parse_return_type(&value, source);

                let mut value_cursor = value.walk();
                for value_child in value.children(&mut value_cursor) {
                    if value_child.kind() == "async" {
                        func.is_async = true;
                    }
                }
                return Some(func);
            }

            if is_upper_snake(&name) {
                let mut constant = Declaration::new(DeclKind::Constant, &name);
                constant.value = Some(get_text(&value, source).to_string());
                return Some(constant);
            }
        }
    }
    None
}

/// Parse an interface declaration with its ordered property list
fn parse_interface(node: &Node, source: &[u8]) -> Option<Declaration> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;

    let mut iface = Declaration::new(DeclKind::Interface, &name);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            // Grammar versions differ on the clause kind name
            "extends_clause" | "extends_type_clause" => {
                if let Some(base) = child.named_child(0) {
                    iface.extends = Some(get_text(&base, source).to_string());
                }
            }
            "object_type" | "interface_body" => {
                let mut body_cursor = child.walk();
                for member in child.named_children(&mut body_cursor) {
                    if member.kind() == "property_signature" {
                        if let Some(prop_name) = member.child_by_field_name("name") {
                            let type_name = member
                                .child_by_field_name("type")
                                .map(|t| annotation_to_string(&t, source))
                                .unwrap_or_else(|| "any".to_string());
                            iface
                                .properties
                                .push(Property::new(get_text(&prop_name, source), &type_name));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Some(iface)
}

/// Parse a parameters list into typed parameters
fn parse_parameters(node: &Node, source: &[u8]) -> Vec<Parameter> {
    let mut params = Vec::new();

    if let Some(params_node) = node.child_by_field_name("parameters") {
        let mut cursor = params_node.walk();
        for child in params_node.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    params.push(Parameter::new(get_text(&child, source)));
                }
                "required_parameter" | "optional_parameter" => {
                    let name = child
                        .child_by_field_name("pattern")
                        .map(|n| get_text(&n, source).to_string())
                        .unwrap_or_default();
                    if name.is_empty() {
                        continue;
                    }
                    let type_name = child
                        .child_by_field_name("type")
                        .map(|t| annotation_to_string(&t, source))
                        .unwrap_or_else(|| "any".to_string());
                    params.push(Parameter::with_type(&name, &type_name));
                }
                _ => {}
            }
        }
    }

    params
}

/// Extract the return type of a function-like node
fn parse_return_type(node: &Node, source: &[u8]) -> String {
    node.child_by_field_name("return_type")
        .map(|t| annotation_to_string(&t, source))
        .unwrap_or_else(|| "any".to_string())
}

/// Translate a type annotation to a canonical type name.
///
/// Primitives map to themselves, arrays append `[]`, anything else is "any".
fn annotation_to_string(annotation: &Node, source: &[u8]) -> String {
    let inner = match annotation.kind() {
        "type_annotation" => match annotation.named_child(0) {
            Some(n) => n,
            None => return "any".to_string(),
        },
        _ => *annotation,
    };
    type_to_string(&inner, source)
}

fn type_to_string(node: &Node, source: &[u8]) -> String {
    match node.kind() {
        "predefined_type" => {
            let text = get_text(node, source);
            match text {
                "string" | "number" | "boolean" | "object" | "void" => text.to_string(),
                _ => "any".to_string(),
            }
        }
        "array_type" => match node.named_child(0) {
            Some(elem) => format!("{}[]", type_to_string(&elem, source)),
            None => "any".to_string(),
        },
        _ => "any".to_string(),
    }
}

/// Check for the UPPER_SNAKE_CASE constant convention
fn is_upper_snake(name: &str) -> bool {
    !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit())
}

/// Get text content of a node
fn get_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// Clean a JSDoc comment: strip markers, drop @tags and blank lines
fn clean_jsdoc(comment: &str) -> String {
    comment
        .trim_start_matches("/**")
        .trim_end_matches("*/")
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
