// Metrics calculation for component graphs
//
// Aggregates component- and graph-level scores into complexity,
// maintainability, cohesion, coupling, and dependency-depth figures.
// Every division is guarded: an empty component set reports zeros,
// never NaN.

use crate::analysis::components::Component;
use crate::analysis::relations::Relation;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Aggregated quality metrics for one analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metrics {
    pub total_components: usize,
    /// Mean of component complexities
    pub average_complexity: f64,
    /// Longest acyclic path length in the relation graph
    pub dependency_depth: usize,
    /// 0-1, how related each component's internal elements are
    pub cohesion: f64,
    /// 0-1, mean instability across components
    pub coupling: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_coverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_code: Option<f64>,
}

/// Computes metrics over components and their relation graph
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn calculate(components: &[Component], relations: &[Relation]) -> Metrics {
        Metrics {
            total_components: components.len(),
            average_complexity: average_complexity(components),
            dependency_depth: dependency_depth(relations),
            cohesion: cohesion(components),
            coupling: coupling(components, relations),
            test_coverage: None,
            duplicate_code: None,
        }
    }
}

fn average_complexity(components: &[Component]) -> f64 {
    if components.is_empty() {
        return 0.0;
    }
    components.iter().map(|c| c.complexity).sum::<f64>() / components.len() as f64
}

/// Longest simple path length in the directed relation graph.
///
/// DFS from every node with a per-path visited set released on backtrack:
/// a node already on the current path is not revisited, so cycles cannot
/// cause non-termination, at the cost of the reported depth being a lower
/// bound in pathological graphs.
fn dependency_depth(relations: &[Relation]) -> usize {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for relation in relations {
        graph.add_edge(relation.source.as_str(), relation.target.as_str(), ());
    }

    let mut nodes: Vec<&str> = graph.nodes().collect();
    nodes.sort_unstable();

    let mut max_depth = 0;
    for node in nodes {
        let mut on_path = HashSet::new();
        max_depth = max_depth.max(longest_from(&graph, node, &mut on_path));
    }
    max_depth
}

fn longest_from<'a>(
    graph: &DiGraphMap<&'a str, ()>,
    node: &'a str,
    on_path: &mut HashSet<&'a str>,
) -> usize {
    if !on_path.insert(node) {
        return 0;
    }

    let mut neighbors: Vec<&str> = graph.neighbors(node).collect();
    neighbors.sort_unstable();

    let mut depth = 0;
    for next in neighbors {
        if !on_path.contains(next) {
            depth = depth.max(1 + longest_from(graph, next, on_path));
        }
    }

    on_path.remove(node);
    depth
}

/// Mean internal cohesion across components
fn cohesion(components: &[Component]) -> f64 {
    if components.is_empty() {
        return 0.0;
    }
    let total: f64 = components.iter().map(component_cohesion).sum();
    (total / components.len() as f64).clamp(0.0, 1.0)
}

/// Weighted sum of method, property, and semantic cohesion for one component
pub fn component_cohesion(component: &Component) -> f64 {
    let method = method_cohesion(component);
    let property = property_cohesion(component);
    let semantic = semantic_cohesion(component);

    (method * 0.4 + property * 0.3 + semantic * 0.3).clamp(0.0, 1.0)
}

/// Fraction of pairwise endpoint comparisons sharing a parameter type,
/// normalized by twice the comparison count
fn method_cohesion(component: &Component) -> f64 {
    let apis = match &component.apis {
        Some(apis) => apis,
        None => return 0.0,
    };

    let mut shared_parameters = 0usize;
    let mut comparisons = 0usize;

    for api in apis {
        for (i, first) in api.endpoints.iter().enumerate() {
            for (j, second) in api.endpoints.iter().enumerate() {
                if i == j {
                    continue;
                }
                shared_parameters += first
                    .parameters
                    .iter()
                    .map(|p| {
                        second
                            .parameters
                            .iter()
                            .filter(|q| q.type_name == p.type_name)
                            .count()
                    })
                    .sum::<usize>();
                comparisons += 1;
            }
        }
    }

    if comparisons == 0 {
        return 0.0;
    }
    (shared_parameters as f64 / (comparisons * 2) as f64).clamp(0.0, 1.0)
}

/// Fraction of declared type properties referenced by more than one
/// endpoint's parameters or return type
fn property_cohesion(component: &Component) -> f64 {
    let apis = match &component.apis {
        Some(apis) => apis,
        None => return 0.0,
    };

    let mut shared = 0usize;
    let mut total = 0usize;

    for api in apis {
        for type_def in &api.types {
            total += type_def.properties.len();
            for type_name in type_def.properties.values() {
                let usage_count = api
                    .endpoints
                    .iter()
                    .filter(|e| {
                        e.parameters.iter().any(|p| &p.type_name == type_name)
                            || e.return_type.contains(type_name)
                    })
                    .count();
                if usage_count > 1 {
                    shared += 1;
                }
            }
        }
    }

    if total == 0 {
        return 0.0;
    }
    shared as f64 / total as f64
}

/// Mean pairwise term similarity over the component's descriptive terms.
///
/// A component with fewer than two terms is perfectly cohesive by
/// definition.
fn semantic_cohesion(component: &Component) -> f64 {
    let terms = semantic_terms(component);
    if terms.len() < 2 {
        return 1.0;
    }

    let mut total = 0.0;
    let mut comparisons = 0usize;
    for i in 0..terms.len() {
        for j in (i + 1)..terms.len() {
            total += term_similarity(&terms[i], &terms[j]);
            comparisons += 1;
        }
    }

    if comparisons == 0 {
        return 0.0;
    }
    total / comparisons as f64
}

/// Distinct lower-cased terms from the component name, description, and API
/// surface; short terms are dropped
fn semantic_terms(component: &Component) -> Vec<String> {
    let mut raw: Vec<&str> = Vec::new();
    raw.extend(split_terms(&component.name));
    raw.extend(split_terms(&component.description));

    if let Some(apis) = &component.apis {
        for api in apis {
            raw.extend(split_terms(&api.name));
            for endpoint in &api.endpoints {
                raw.extend(split_terms(&endpoint.name));
                raw.extend(split_terms(&endpoint.description));
            }
        }
    }

    let mut terms: Vec<String> = Vec::new();
    for term in raw {
        let term = term.to_lowercase();
        if term.len() > 2 && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

fn split_terms(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Normalized Levenshtein similarity: 1 − distance / max length
fn term_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let substitution = prev[j - 1] + usize::from(a[i - 1] != b[j - 1]);
            current[j] = substitution.min(prev[j] + 1).min(current[j - 1] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

/// Mean instability across components: efferent over total coupling, 0 for
/// components with no relations at all
fn coupling(components: &[Component], relations: &[Relation]) -> f64 {
    if components.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    for component in components {
        let afferent = relations
            .iter()
            .filter(|r| r.target == component.path)
            .count();
        let efferent = relations
            .iter()
            .filter(|r| r.source == component.path)
            .count();

        if afferent + efferent > 0 {
            total += efferent as f64 / (afferent + efferent) as f64;
        }
    }

    (total / components.len() as f64).clamp(0.0, 1.0)
}
