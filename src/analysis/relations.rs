// Relation graph construction
//
// Computes directed, weighted relationships between components from import
// facts, descriptive-term overlap, and co-change approximation.

use crate::analysis::components::{ApiDefinition, ApiEndpoint, Component, ComponentKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of relationship between two components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Imports,
    Extends,
    Implements,
    Uses,
}

/// A directed, weighted edge between two components
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    /// Strength of the relationship, clamped to [0, 1]
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Builds the relation graph over a component set
pub struct RelationGraphBuilder;

impl RelationGraphBuilder {
    /// Emit one Imports relation per ordered pair where the source's
    /// dependency list references the target.
    ///
    /// Components are walked in path order and a (source, target, kind)
    /// pair is never emitted twice, so output is deterministic.
    pub fn build(components: &[Component]) -> Vec<Relation> {
        let ordered = sorted(components);
        let mut seen: HashSet<(String, String, RelationKind)> = HashSet::new();
        let mut relations = Vec::new();

        for source in &ordered {
            for target in &ordered {
                if source.path == target.path {
                    continue;
                }
                if import_count(source, target) == 0 {
                    continue;
                }
                let key = (
                    source.path.clone(),
                    target.path.clone(),
                    RelationKind::Imports,
                );
                if !seen.insert(key) {
                    continue;
                }
                relations.push(Relation {
                    source: source.path.clone(),
                    target: target.path.clone(),
                    kind: RelationKind::Imports,
                    weight: relation_weight(source, target),
                    description: None,
                });
            }
        }

        relations
    }

    /// Build relations and describe endpoint-level usage where both sides
    /// expose an API surface (middle layer).
    pub fn build_with_api_descriptions(components: &[Component]) -> Vec<Relation> {
        let mut relations = Self::build(components);

        for relation in &mut relations {
            let source = components.iter().find(|c| c.path == relation.source);
            let target = components.iter().find(|c| c.path == relation.target);

            if let (Some(source), Some(target)) = (source, target) {
                if let (Some(source_apis), Some(target_apis)) = (&source.apis, &target.apis) {
                    let usage = analyze_api_usage(source_apis, target_apis);
                    if !usage.is_empty() {
                        relation.description = Some(usage);
                    }
                }
            }
        }

        relations
    }

    /// Build the richer detail-layer graph.
    ///
    /// A pair is related when the source imports the target or an
    /// endpoint-level dependency signal exists; the relation is emitted
    /// only when its combined weight exceeds 0.
    pub fn build_detailed(components: &[Component]) -> Vec<Relation> {
        let ordered = sorted(components);
        let mut relations = Vec::new();

        for source in &ordered {
            for target in &ordered {
                if source.path == target.path {
                    continue;
                }

                let imports = import_count(source, target) > 0;
                let endpoint_signal = match (&source.apis, &target.apis) {
                    (Some(s), Some(t)) => has_endpoint_dependency(s, t),
                    _ => false,
                };
                if !imports && !endpoint_signal {
                    continue;
                }

                let weight = relation_weight(source, target);
                if weight <= 0.0 {
                    continue;
                }

                relations.push(Relation {
                    source: source.path.clone(),
                    target: target.path.clone(),
                    kind: RelationKind::Imports,
                    weight,
                    description: Some(format!(
                        "Relationship strength: {:.1}%",
                        weight * 100.0
                    )),
                });
            }
        }

        relations
    }
}

fn sorted(components: &[Component]) -> Vec<Component> {
    let mut ordered = components.to_vec();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));
    ordered
}

/// Count dependency entries of `source` that reference `target`
fn import_count(source: &Component, target: &Component) -> usize {
    source
        .dependencies
        .iter()
        .filter(|dep| references(dep, target))
        .count()
}

/// A dependency references a component when it names the component's path
/// directly, or lives immediately under a module boundary
fn references(dep: &str, target: &Component) -> bool {
    if dep == target.path {
        return true;
    }
    match target.kind {
        ComponentKind::Module => match dep.rfind('/') {
            Some(idx) => &dep[..idx] == target.path,
            None => target.path == ".",
        },
        ComponentKind::File => false,
    }
}

/// Convex combination of import, responsibility, and change weights
fn relation_weight(source: &Component, target: &Component) -> f64 {
    let import = import_weight(source, target);
    let responsibility = responsibility_weight(source, target);
    let change = change_weight(source, target);

    (import * 0.4 + responsibility * 0.3 + change * 0.3).clamp(0.0, 1.0)
}

/// Saturating normalization: reference count over 10, never above 1
fn import_weight(source: &Component, target: &Component) -> f64 {
    (import_count(source, target) as f64 / 10.0).min(1.0)
}

/// Term overlap between the two descriptions: shared tokens over the larger
/// token-set size
fn responsibility_weight(source: &Component, target: &Component) -> f64 {
    let source_terms = description_terms(&source.description);
    let target_terms = description_terms(&target.description);

    let larger = source_terms.len().max(target_terms.len());
    if larger == 0 {
        return 0.0;
    }

    let shared = source_terms.intersection(&target_terms).count();
    shared as f64 / larger as f64
}

fn description_terms(description: &str) -> HashSet<String> {
    description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Smaller-over-larger ratio of change frequencies; 0 when either side has
/// no estimate
fn change_weight(source: &Component, target: &Component) -> f64 {
    match (source.change_frequency, target.change_frequency) {
        (Some(a), Some(b)) if a > 0.0 && b > 0.0 => (a / b).min(b / a),
        _ => 0.0,
    }
}

/// Describe which endpoints of `source_apis` depend on endpoints of
/// `target_apis`
fn analyze_api_usage(source_apis: &[ApiDefinition], target_apis: &[ApiDefinition]) -> String {
    let mut usages = Vec::new();

    for source_api in source_apis {
        for target_api in target_apis {
            let mut dependencies = Vec::new();
            for source_endpoint in &source_api.endpoints {
                for target_endpoint in &target_api.endpoints {
                    if endpoints_depend_on(source_endpoint, target_endpoint) {
                        dependencies
                            .push(format!("{} -> {}", source_endpoint.name, target_endpoint.name));
                    }
                }
            }
            if !dependencies.is_empty() {
                usages.push(format!(
                    "{} uses {} for: {}",
                    source_api.name,
                    target_api.name,
                    dependencies.join(", ")
                ));
            }
        }
    }

    usages.join(". ")
}

fn has_endpoint_dependency(source_apis: &[ApiDefinition], target_apis: &[ApiDefinition]) -> bool {
    source_apis.iter().any(|s| {
        target_apis.iter().any(|t| {
            s.endpoints.iter().any(|se| {
                t.endpoints.iter().any(|te| endpoints_depend_on(se, te))
            })
        })
    })
}

/// Any one of shared parameter types, return-type containment, or
/// path-substring containment marks a dependency
fn endpoints_depend_on(source: &ApiEndpoint, target: &ApiEndpoint) -> bool {
    let parameter_dependency = source.parameters.iter().any(|p| {
        target
            .parameters
            .iter()
            .any(|tp| p.type_name == tp.type_name)
    });

    let return_type_dependency = source.return_type.contains(&target.return_type);

    let path_dependency =
        source.path.contains(&target.path) || target.path.contains(&source.path);

    parameter_dependency || return_type_dependency || path_dependency
}
