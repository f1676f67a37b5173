//! Heuristic file-type and layer classification.
//!
//! Both classifiers consult directory segments first and fall back to
//! content keywords. Rules are plain tables so they can be tested and
//! extended without touching the traversal code. Nothing here fails: the
//! fallbacks are `FileType::File` and `Layer::Unknown`.

use serde::{Deserialize, Serialize};

use crate::common::{file_name, file_stem};

/// Role of a file inferred from its path and content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Component,
    Service,
    Model,
    Utility,
    Config,
    Test,
    Page,
    Hook,
    File,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Component => "component",
            FileType::Service => "service",
            FileType::Model => "model",
            FileType::Utility => "utility",
            FileType::Config => "config",
            FileType::Test => "test",
            FileType::Page => "page",
            FileType::Hook => "hook",
            FileType::File => "file",
        }
    }
}

/// Architectural layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Presentation,
    Business,
    Data,
    Infrastructure,
    Unknown,
}

impl Layer {
    /// The four concrete layers, top to bottom.
    pub const ORDERED: [Layer; 4] = [
        Layer::Presentation,
        Layer::Business,
        Layer::Data,
        Layer::Infrastructure,
    ];

    /// Position in the stack; presentation is 0. `Unknown` has none.
    pub fn depth(&self) -> Option<usize> {
        match self {
            Layer::Presentation => Some(0),
            Layer::Business => Some(1),
            Layer::Data => Some(2),
            Layer::Infrastructure => Some(3),
            Layer::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Presentation => "presentation",
            Layer::Business => "business",
            Layer::Data => "data",
            Layer::Infrastructure => "infrastructure",
            Layer::Unknown => "unknown",
        }
    }
}

/// Directory segments per file type, checked in order.
const TYPE_SEGMENTS: &[(FileType, &[&str])] = &[
    (FileType::Test, &["test", "tests", "__tests__", "spec", "specs", "__mocks__"]),
    (FileType::Config, &["config", "configs", "configuration", "settings"]),
    (FileType::Hook, &["hooks"]),
    (FileType::Page, &["pages", "views", "screens", "routes"]),
    (FileType::Component, &["components", "component", "widgets", "ui", "layouts"]),
    (FileType::Service, &["services", "service", "api", "clients", "controllers", "handlers"]),
    (FileType::Model, &["models", "model", "entities", "schemas", "types", "domain"]),
    (FileType::Utility, &["utils", "util", "helpers", "lib", "common", "shared"]),
];

/// Content keywords per file type, used when no directory segment matched.
const TYPE_KEYWORDS: &[(FileType, &[&str])] = &[
    (FileType::Test, &["describe(", "it('", "it(\"", "#[test]", "@Test", "def test_", "assert_eq!"]),
    (FileType::Hook, &["export function use", "export const use"]),
    (FileType::Component, &["React.Component", "useState(", "return (", "render()", "</"]),
    (FileType::Service, &["fetch(", "axios", "HttpClient", "requests.", "@Service"]),
    (FileType::Model, &["@Entity", "Schema(", "models.Model", "interface ", "#[derive("]),
    (FileType::Config, &["module.exports = {", "process.env", "os.environ"]),
];

/// Directory segments per layer, checked in order.
const LAYER_SEGMENTS: &[(Layer, &[&str])] = &[
    (
        Layer::Presentation,
        &["components", "pages", "views", "screens", "ui", "hooks", "layouts", "widgets", "routes"],
    ),
    (
        Layer::Business,
        &["services", "service", "controllers", "handlers", "domain", "usecases", "logic", "features"],
    ),
    (
        Layer::Data,
        &["models", "model", "repositories", "repository", "db", "database", "entities", "schemas", "store", "stores", "dao"],
    ),
    (
        Layer::Infrastructure,
        &["config", "utils", "util", "lib", "infra", "infrastructure", "adapters", "middleware", "helpers", "shared", "api"],
    ),
];

/// Content keywords per layer.
const LAYER_KEYWORDS: &[(Layer, &[&str])] = &[
    (Layer::Presentation, &["useState(", "render(", "</", "onClick", "document."]),
    (Layer::Data, &["SELECT ", "INSERT ", "query(", "findOne(", "@Entity", "Repository"]),
    (Layer::Business, &["Service", "validate", "calculate", "process"]),
    (Layer::Infrastructure, &["process.env", "logger", "axios.create", "new Pool("]),
];

/// Lowercased directory segments of `path` (the file name excluded).
fn dir_segments(path: &str) -> Vec<String> {
    let normalized = path.replace('\\', "/").to_ascii_lowercase();
    let mut parts: Vec<String> = normalized.split('/').map(|s| s.to_string()).collect();
    parts.pop();
    parts
}

fn is_test_name(path: &str) -> bool {
    let name = file_name(path).to_ascii_lowercase();
    name.contains(".test.")
        || name.contains(".spec.")
        || name.starts_with("test_")
        || file_stem(&name).ends_with("_test")
        || file_stem(&name).ends_with("test") && name.ends_with(".java")
}

fn is_config_name(path: &str) -> bool {
    let name = file_name(path).to_ascii_lowercase();
    name.contains(".config.")
        || name.starts_with(".env")
        || matches!(file_stem(&name), "config" | "settings" | "constants")
}

/// `useAuth.js`, `useSession.ts`
fn is_hook_name(path: &str) -> bool {
    let stem = file_stem(path);
    stem.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

/// File type from path segments, file name conventions and content.
pub fn classify_file_type(path: &str, content: &str) -> FileType {
    if is_test_name(path) {
        return FileType::Test;
    }
    if is_config_name(path) {
        return FileType::Config;
    }
    if is_hook_name(path) {
        return FileType::Hook;
    }

    let segments = dir_segments(path);
    for (file_type, keywords) in TYPE_SEGMENTS {
        if segments.iter().any(|s| keywords.contains(&s.as_str())) {
            return *file_type;
        }
    }

    for (file_type, keywords) in TYPE_KEYWORDS {
        if keywords.iter().any(|k| content.contains(k)) {
            return *file_type;
        }
    }
    FileType::File
}

/// Layer from path segments, then content keywords.
pub fn classify_layer(path: &str, content: &str) -> Layer {
    let segments = dir_segments(path);
    // Nearest directory wins: `features/auth/components/x.js` is presentation
    for segment in segments.iter().rev() {
        for (layer, keywords) in LAYER_SEGMENTS {
            if keywords.contains(&segment.as_str()) {
                return *layer;
            }
        }
    }

    for (layer, keywords) in LAYER_KEYWORDS {
        if keywords.iter().any(|k| content.contains(k)) {
            return *layer;
        }
    }
    Layer::Unknown
}

/// Branch-count complexity: 1 + decision points, counted on word tokens.
pub fn estimate_complexity(content: &str) -> usize {
    const DECISIONS: &[&str] = &["if", "for", "while", "case", "catch", "except", "elif", "match"];
    let mut score = 1;
    for token in content.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if DECISIONS.contains(&token) {
            score += 1;
        }
    }
    score += content.matches("&&").count() + content.matches("||").count();
    score += content.matches(" ? ").count();
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_segments() {
        assert_eq!(classify_file_type("src/pages/Login.jsx", ""), FileType::Page);
        assert_eq!(classify_file_type("src/services/auth.js", ""), FileType::Service);
        assert_eq!(classify_file_type("src/utils/api.js", ""), FileType::Utility);
        assert_eq!(classify_file_type("src/components/Button.tsx", ""), FileType::Component);
        assert_eq!(classify_file_type("app/models/user.py", ""), FileType::Model);
        assert_eq!(classify_file_type("src/hooks/session.ts", ""), FileType::Hook);
    }

    #[test]
    fn test_file_type_from_names() {
        assert_eq!(classify_file_type("src/auth.test.js", ""), FileType::Test);
        assert_eq!(classify_file_type("tests/test_auth.py", ""), FileType::Test);
        assert_eq!(classify_file_type("webpack.config.js", ""), FileType::Config);
        assert_eq!(classify_file_type("src/useAuth.js", ""), FileType::Hook);
        assert_eq!(classify_file_type("src/user.js", ""), FileType::File);
    }

    #[test]
    fn test_file_type_content_fallback() {
        assert_eq!(
            classify_file_type("src/client.js", "export async function get() { return fetch(url); }"),
            FileType::Service
        );
        assert_eq!(
            classify_file_type("src/Card.jsx", "function Card() { return (<div/>); }"),
            FileType::Component
        );
    }

    #[test]
    fn test_layer_segments_and_fallback() {
        assert_eq!(classify_layer("src/pages/Login.jsx", ""), Layer::Presentation);
        assert_eq!(classify_layer("src/services/auth.js", ""), Layer::Business);
        assert_eq!(classify_layer("src/models/user.js", ""), Layer::Data);
        assert_eq!(classify_layer("src/utils/api.js", ""), Layer::Infrastructure);
        assert_eq!(
            classify_layer("src/features/auth/components/Form.jsx", ""),
            Layer::Presentation
        );
        assert_eq!(classify_layer("src/x.js", "db.query(sql)"), Layer::Data);
        assert_eq!(classify_layer("src/x.js", "let a = 1;"), Layer::Unknown);
    }

    #[test]
    fn test_layer_depth_order() {
        let depths: Vec<_> = Layer::ORDERED.iter().map(|l| l.depth().unwrap()).collect();
        assert_eq!(depths, vec![0, 1, 2, 3]);
        assert_eq!(Layer::Unknown.depth(), None);
    }

    #[test]
    fn test_complexity_counts_decisions() {
        assert_eq!(estimate_complexity("let a = 1;"), 1);
        assert_eq!(
            estimate_complexity("if (a && b) { for (x of y) {} } else if (c) {}"),
            5
        );
        // identifiers containing keywords are not decisions
        assert_eq!(estimate_complexity("const verify = iffy + format;"), 1);
    }
}
