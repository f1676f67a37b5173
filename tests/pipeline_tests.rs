//! End-to-end pipeline tests: partial failure, flows and on-disk projects.

use meridian::graph::NodeType;
use meridian::{collect_source_files, error_codes, CkgConfig, FileInput, Pipeline};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn pipeline() -> Pipeline {
    Pipeline::new(CkgConfig::default()).unwrap()
}

fn file_paths(nodes: &[meridian::Node]) -> Vec<&str> {
    let mut paths: Vec<&str> = nodes
        .iter()
        .filter(|n| n.node_type == NodeType::File)
        .map(|n| n.path.as_str())
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_failing_files_recorded_and_rest_extracted() {
    let files = vec![
        FileInput::with_content("src/one.py", "def one():\n    return 1\n"),
        FileInput::with_content("src/broken.js", "function (\n"),
        FileInput::with_content("src/two.rs", "pub fn two() -> u32 { 2 }\n"),
        FileInput::with_content("src/also_broken.ts", "class {{{\n"),
        FileInput::with_content("src/three.java", "class Three { int three() { return 3; } }\n"),
    ];

    let result = pipeline().build(files);

    assert_eq!(result.stats.files, 5);
    assert_eq!(result.stats.extracted, 3);
    assert_eq!(result.stats.failed, 2);
    assert_eq!(file_paths(&result.nodes), vec!["src/one.py", "src/three.java", "src/two.rs"]);

    let mut failed: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
    failed.sort();
    assert_eq!(failed, vec!["src/also_broken.ts", "src/broken.js"]);
    assert!(result
        .errors
        .iter()
        .all(|e| e.code == error_codes::CKG_PARSE_001_PARSE_FAILURE));
    assert_eq!(result.analysis.errors.len(), 2);
}

#[test]
fn test_login_flow_classified_authentication() {
    let files = vec![
        FileInput::with_content(
            "pages/Login.jsx",
            "import { login } from '../services/auth';\n\nexport function Login() {\n  const onSubmit = () => login('user', 'secret');\n  return onSubmit;\n}\n",
        ),
        FileInput::with_content(
            "services/auth.js",
            "import { post } from '../utils/api';\n\nexport async function login(user, password) {\n  return await post('/session', { user, password });\n}\n",
        ),
        FileInput::with_content(
            "utils/api.js",
            "export async function post(url, body) {\n  return fetch(url, { method: 'POST', body: JSON.stringify(body) });\n}\n",
        ),
    ];

    let result = pipeline().build(files);
    assert!(result.errors.is_empty());

    let flow = result
        .analysis
        .user_flows
        .iter()
        .find(|f| f.entry_point == "pages/Login.jsx")
        .expect("flow from the login page");
    assert!(flow.files.iter().any(|f| f == "pages/Login.jsx"));
    assert!(flow.files.iter().any(|f| f == "services/auth.js"));
    assert_eq!(flow.classification.category, "authentication");
    assert!(flow.classification.is_critical);
    assert_eq!(flow.steps.len(), flow.files.len());
}

#[test]
fn test_two_file_login_chain_is_below_flow_minimum() {
    let files = vec![
        FileInput::with_content(
            "pages/Login.jsx",
            "import { login } from '../services/auth';\n\nexport function Login() {\n  return login('user', 'secret');\n}\n",
        ),
        FileInput::with_content(
            "services/auth.js",
            "export function login(user, password) {\n  return user && password;\n}\n",
        ),
    ];

    let result = pipeline().build(files.clone());
    assert!(result.errors.is_empty());
    assert_eq!(result.analysis.dependencies.len(), 1);
    assert!(result.analysis.user_flows.is_empty());

    let mut config = CkgConfig::default();
    config.analysis.min_flow_files = 2;
    let result = Pipeline::new(config).unwrap().build(files);
    let flow = result
        .analysis
        .user_flows
        .iter()
        .find(|f| f.entry_point == "pages/Login.jsx")
        .expect("two-file flow once the minimum allows it");
    assert_eq!(flow.classification.category, "authentication");
}

#[test]
fn test_scanned_project_builds_with_relative_paths() {
    let dir = TempDir::new().unwrap();
    let write = |relative: &str, content: &str| {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    };
    write("src/main.py", "from app import util\n\ndef main():\n    return util.helper()\n");
    write("src/app/util.py", "def helper():\n    return 42\n");
    write("node_modules/pkg/index.js", "module.exports = {};\n");
    write("README.md", "# not scanned\n");

    let config = CkgConfig::default();
    let files = collect_source_files(dir.path(), &config.scan).unwrap();
    assert_eq!(files.len(), 2);

    let mut pipeline = Pipeline::new(config).unwrap();
    let result = pipeline.build(files);

    assert!(result.errors.is_empty());
    assert_eq!(file_paths(&result.nodes), vec!["src/app/util.py", "src/main.py"]);
    assert!(result.nodes.iter().all(|n| !Path::new(&n.path).is_absolute()));
    assert!(result.chunks.iter().any(|c| c.metadata.symbol_name == "helper"));
}

#[test]
fn test_progress_reaches_total() {
    let files: Vec<FileInput> = (0..5)
        .map(|i| FileInput::with_content(format!("src/m{}.js", i), format!("export const v{} = {};\n", i, i)))
        .collect();
    let mut last = None;
    pipeline().build_with_progress(files, |p| last = Some((p.processed, p.total)));
    assert_eq!(last, Some((5, 5)));
}

#[test]
fn test_result_serializes_camel_case() {
    let _ = meridian::logging::init();
    let result = pipeline().build(vec![FileInput::with_content("src/a.ts", "export function a() { return 1; }\n")]);
    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

    for key in ["generation", "createdAt", "nodes", "edges", "chunks", "analysis", "errors", "stats"] {
        assert!(json.get(key).is_some(), "missing key {}", key);
    }
    assert!(json["analysis"].get("userFlows").is_some());
    assert_eq!(json["nodes"][0]["type"], "File");
    assert!(json["chunks"][0].get("node_id").is_some());
    assert!(json["chunks"][0].get("chunk_type").is_some());
}

#[test]
fn test_chunk_type_values_per_strategy() {
    use meridian::chunking::{CONTEXTUAL_CHUNKS, DOCUMENTATION_CHUNKS, ONE_FUNCTION_PER_CHUNK, ONE_SYMBOL_PER_CHUNK};
    use meridian::{Chunker, SymbolExtractor};

    let source = "/**\n * Formats a user record for display in lists.\n * Returns an empty string for missing users.\n */\nfunction a() {}\nfunction b() {}\n";
    let config = CkgConfig::default();
    let extraction = SymbolExtractor::from_config(&config)
        .extract_from_file(&FileInput::with_content("src/format.js", source), "test", None)
        .unwrap();
    let chunker = Chunker::from_config(&config);

    for (strategy, expected) in [
        (ONE_SYMBOL_PER_CHUNK, "symbol"),
        (ONE_FUNCTION_PER_CHUNK, "function"),
        (CONTEXTUAL_CHUNKS, "context"),
        (DOCUMENTATION_CHUNKS, "documentation"),
    ] {
        let chunks = chunker.create_chunks(&extraction, strategy).unwrap();
        assert!(!chunks.is_empty(), "{} produced no chunks", strategy);
        for chunk in &chunks {
            let json = serde_json::to_value(chunk).unwrap();
            assert_eq!(json["chunk_type"], expected, "strategy {}", strategy);
            assert_eq!(chunk.chunk_type.as_str(), expected);
        }
    }
}
