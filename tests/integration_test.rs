// Integration tests for stratamap

use std::fs;
use std::path::Path;
use std::sync::Arc;
use stratamap::analysis::{
    AnalysisRequest, Clock, FixedClock, Layer, LayeredAnalyzer, RelationKind,
};
use stratamap::Config;
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(path, content).expect("Failed to write file");
}

fn create_analyzer(root: &Path) -> LayeredAnalyzer {
    LayeredAnalyzer::with_clock(root, Config::default(), Arc::new(FixedClock::new(1_000)))
}

fn request(layer: Layer) -> AnalysisRequest {
    AnalysisRequest {
        layer,
        ..Default::default()
    }
}

// ============================================================================
// Layered Analysis Tests
// ============================================================================

#[test]
fn test_empty_directory_top_layer() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let analyzer = create_analyzer(dir.path());

    let analysis = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");

    assert_eq!(analysis.layer, Layer::Top);
    assert!(analysis.components.is_empty());
    assert!(analysis.relations.is_empty());
    assert_eq!(analysis.metrics.total_components, 0);
    assert_eq!(analysis.metrics.average_complexity, 0.0);
    assert_eq!(analysis.metrics.dependency_depth, 0);
    assert_eq!(analysis.metrics.cohesion, 0.0);
    assert_eq!(analysis.metrics.coupling, 0.0);
}

#[test]
fn test_top_layer_groups_by_module() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        dir.path(),
        "src/api/routes.ts",
        "/** Route table */\nexport const ROUTE_COUNT = 3;",
    );
    write_file(
        dir.path(),
        "src/api/client.ts",
        "import { pool } from '../core/db';\nexport const RETRY_LIMIT = 2;",
    );
    write_file(
        dir.path(),
        "src/core/db.ts",
        "/** Connection pooling */\nexport const pool = {};",
    );

    let analyzer = create_analyzer(dir.path());
    let analysis = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");

    let paths: Vec<&str> = analysis.components.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["src/api", "src/core"]);

    // src/api imports src/core/db.ts, so one module-level relation
    assert_eq!(analysis.relations.len(), 1);
    assert_eq!(analysis.relations[0].source, "src/api");
    assert_eq!(analysis.relations[0].target, "src/core");
    assert!(analysis.relations[0].weight > 0.0);
}

#[test]
fn test_same_module_import_not_a_self_relation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        dir.path(),
        "a.ts",
        "import { helper } from './b';\nexport const A_ONE = 1;",
    );
    write_file(dir.path(), "b.ts", "export const helper = 2;");

    let analyzer = create_analyzer(dir.path());

    // Top layer: both files fold into one module, no self-relation
    let top = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");
    assert_eq!(top.components.len(), 1);
    assert!(top.relations.is_empty());

    // Detail layer: exactly one imports relation a.ts -> b.ts
    let detail = analyzer
        .analyze(&request(Layer::Detail))
        .expect("Analysis failed");
    assert_eq!(detail.components.len(), 2);
    assert_eq!(detail.relations.len(), 1);
    let relation = &detail.relations[0];
    assert_eq!(relation.source, "a.ts");
    assert_eq!(relation.target, "b.ts");
    assert_eq!(relation.kind, RelationKind::Imports);
    assert!(relation.weight > 0.0);
}

#[test]
fn test_middle_layer_api_surface_and_descriptions() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        dir.path(),
        "src/users/service.ts",
        r#"
import { save } from '../store/records';

export class UserService {
    find(id: string): object {
        return {};
    }
}
"#,
    );
    write_file(
        dir.path(),
        "src/store/records.ts",
        r#"
export class RecordStore {
    save(id: string): object {
        return {};
    }
}
"#,
    );

    let analyzer = create_analyzer(dir.path());
    let analysis = analyzer
        .analyze(&request(Layer::Middle))
        .expect("Analysis failed");

    assert_eq!(analysis.layer, Layer::Middle);
    for component in &analysis.components {
        let apis = component.apis.as_ref().expect("middle layer carries APIs");
        assert!(!apis.is_empty());
        for api in apis {
            for endpoint in &api.endpoints {
                assert_eq!(endpoint.method, "GET");
                assert!(endpoint.path.starts_with('/'));
            }
        }
    }

    // The relation between users and store describes endpoint usage
    assert_eq!(analysis.relations.len(), 1);
    let description = analysis.relations[0]
        .description
        .as_ref()
        .expect("middle relations carry usage descriptions");
    assert!(description.contains("UserService uses RecordStore"));
}

#[test]
fn test_detail_layer_focus_path() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "src/api/routes.ts", "export const R_ONE = 1;");
    write_file(dir.path(), "src/core/db.ts", "export const D_ONE = 1;");

    let analyzer = create_analyzer(dir.path());
    let mut req = request(Layer::Detail);
    req.focus_path = Some("src/api".to_string());

    let analysis = analyzer.analyze(&req).expect("Analysis failed");
    let paths: Vec<&str> = analysis.components.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["src/api/routes.ts"]);
}

#[test]
fn test_relations_reference_known_components() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        dir.path(),
        "src/a.ts",
        "import { b } from './b';\nexport const A_V = 1;",
    );
    write_file(
        dir.path(),
        "src/b.ts",
        "import { c } from '../lib/c';\nexport const B_V = 2;",
    );
    write_file(dir.path(), "lib/c.ts", "export const C_V = 3;");

    let analyzer = create_analyzer(dir.path());
    for layer in [Layer::Top, Layer::Middle, Layer::Detail] {
        let analysis = analyzer.analyze(&request(layer)).expect("Analysis failed");

        let paths: std::collections::HashSet<&str> = analysis
            .components
            .iter()
            .map(|c| c.path.as_str())
            .collect();
        for relation in &analysis.relations {
            assert!(paths.contains(relation.source.as_str()));
            assert!(paths.contains(relation.target.as_str()));
            assert!(relation.weight >= 0.0);
            assert!(relation.weight <= 1.0);
        }
    }
}

// ============================================================================
// Ignore Resolution Tests
// ============================================================================

#[test]
fn test_ignored_build_output_with_negation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), ".gitignore", "generated/\n");
    write_file(dir.path(), "a/b/c/.gitignore", "!generated/keep.ts\n");
    write_file(dir.path(), "generated/keep.ts", "export const KEPT = 1;");
    write_file(dir.path(), "generated/skip.ts", "export const SKIPPED = 1;");
    write_file(dir.path(), "main.ts", "export const MAIN_V = 1;");

    let analyzer = create_analyzer(dir.path());
    let analysis = analyzer
        .analyze(&request(Layer::Detail))
        .expect("Analysis failed");

    let paths: Vec<&str> = analysis.components.iter().map(|c| c.path.as_str()).collect();
    assert!(paths.contains(&"main.ts"));
    assert!(paths.contains(&"generated/keep.ts"));
    assert!(!paths.contains(&"generated/skip.ts"));
}

#[test]
fn test_dependency_directories_never_analyzed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        dir.path(),
        "node_modules/pkg/index.js",
        "module.exports = 1;",
    );
    write_file(dir.path(), "venv/script.js", "var x = 1;");
    write_file(dir.path(), "app.ts", "export const APP_V = 1;");

    let analyzer = create_analyzer(dir.path());
    let analysis = analyzer
        .analyze(&request(Layer::Detail))
        .expect("Analysis failed");

    assert_eq!(analysis.components.len(), 1);
    assert_eq!(analysis.components[0].path, "app.ts");
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_parse_error_does_not_abort_analysis() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "bad.ts", "class {{{{");
    write_file(dir.path(), "good.ts", "export const GOOD_V = 1;");

    let analyzer = create_analyzer(dir.path());
    let analysis = analyzer
        .analyze(&request(Layer::Detail))
        .expect("Analysis failed");

    assert_eq!(analysis.components.len(), 1);
    assert_eq!(analysis.components[0].path, "good.ts");
    assert!(analysis.parse_errors.contains_key("bad.ts"));
}

#[test]
fn test_nonexistent_path_is_rejected() {
    let analyzer = create_analyzer(Path::new("/nonexistent/stratamap/path"));
    let result = analyzer.analyze(&request(Layer::Top));
    assert!(result.is_err());
}

// ============================================================================
// Cache Tests
// ============================================================================

#[test]
fn test_repeated_analysis_served_from_cache() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "a.ts", "export const A_V = 1;");

    let analyzer = create_analyzer(dir.path());
    let first = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");
    let second = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");

    // Served verbatim: the very same allocation, so content is bit-for-bit
    // identical including the timestamp
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
}

#[test]
fn test_cache_expiry_produces_fresh_result() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "a.ts", "export const A_V = 1;");

    let clock = Arc::new(FixedClock::new(1_000));
    let mut config = Config::default();
    config.cache.max_age_secs = 1;
    let analyzer =
        LayeredAnalyzer::with_clock(dir.path(), config, Arc::clone(&clock) as Arc<dyn Clock>);

    let first = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");

    clock.advance(1_001);
    let second = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.timestamp_ms > first.timestamp_ms);
}

#[test]
fn test_layers_cached_independently() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "a.ts", "export const A_V = 1;");

    let analyzer = create_analyzer(dir.path());
    let top = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");
    let detail = analyzer
        .analyze(&request(Layer::Detail))
        .expect("Analysis failed");

    assert_eq!(top.layer, Layer::Top);
    assert_eq!(detail.layer, Layer::Detail);
}

#[test]
fn test_explicit_invalidation_forces_recompute() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "a.ts", "export const A_V = 1;");

    let analyzer = create_analyzer(dir.path());
    let first = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");

    analyzer.invalidate(Layer::Top, None);
    let second = analyzer
        .analyze(&request(Layer::Top))
        .expect("Analysis failed");

    assert!(!Arc::ptr_eq(&first, &second));
    // Same inputs and a fixed clock: the recomputed content matches
    assert_eq!(*first, *second);
}

// ============================================================================
// CLI Tests
// ============================================================================

#[test]
fn test_cli_analyze_prints_json() {
    use assert_cmd::Command;
    use predicates::prelude::*;

    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "a.ts", "export const A_V = 1;");

    Command::cargo_bin("stratamap")
        .expect("binary exists")
        .args(["analyze", dir.path().to_str().unwrap(), "--layer", "top"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"components\""))
        .stdout(predicate::str::contains("\"metrics\""));
}

#[test]
fn test_cli_rejects_invalid_layer() {
    use assert_cmd::Command;
    use predicates::prelude::*;

    let dir = TempDir::new().expect("Failed to create temp dir");

    Command::cargo_bin("stratamap")
        .expect("binary exists")
        .args(["analyze", dir.path().to_str().unwrap(), "--layer", "bottom"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid analysis layer"));
}
