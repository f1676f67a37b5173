//! Rust symbol extraction using tree-sitter-rust.

use tree_sitter::Node;

use crate::ingest::visit::{self, Visit};
use crate::ingest::{
    child_of_kind, inside_any, node_text, ImportFact, ImportKind, Language, LanguageSupport,
    ScopeSeparator, ScopeStack, SymbolFact, SymbolKind, SymbolSet,
};

/// Rust (`.rs`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RustSupport;

impl LanguageSupport for RustSupport {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn extract_symbols(&self, root: Node<'_>, source: &str) -> SymbolSet {
        let mut set = SymbolSet::new(Language::Rust);

        visit::walk(root, |node, _| {
            let kind = match node.kind() {
                "function_item" | "function_signature_item" => {
                    if inside_any(node, &["impl_item", "trait_item"]) {
                        SymbolKind::Method
                    } else {
                        SymbolKind::Function
                    }
                }
                "struct_item" | "union_item" => SymbolKind::Class,
                "enum_item" => SymbolKind::Enum,
                "trait_item" => SymbolKind::Interface,
                "type_item" => SymbolKind::TypeAlias,
                "const_item" | "static_item" if !inside_any(node, &["function_item"]) => {
                    SymbolKind::Constant
                }
                "use_declaration" => {
                    use_declaration(node, source, &mut set);
                    return Visit::SkipChildren;
                }
                "mod_item" => {
                    mod_declaration(node, source, &mut set);
                    return Visit::Continue;
                }
                _ => return Visit::Continue,
            };

            if let Some(fact) = item(node, source, kind) {
                if fact.is_exported {
                    set.push_export(fact.name.clone());
                }
                set.symbols.push(fact);
            }
            Visit::Continue
        });

        set.finish(root)
    }

    fn call_target<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        if node.kind() != "call_expression" {
            return None;
        }
        callee_name(node.child_by_field_name("function")?)
    }

    fn is_identifier(&self, kind: &str) -> bool {
        matches!(kind, "identifier" | "field_identifier" | "type_identifier")
    }
}

fn callee_name(function: Node<'_>) -> Option<Node<'_>> {
    match function.kind() {
        "identifier" => Some(function),
        "field_expression" => function.child_by_field_name("field"),
        "scoped_identifier" => function.child_by_field_name("name"),
        "generic_function" => callee_name(function.child_by_field_name("function")?),
        _ => None,
    }
}

/// Scope names from enclosing `mod`, `impl` and `trait` items.
fn scope_of(node: &Node<'_>, source: &str) -> ScopeStack {
    ScopeStack::from_ancestors(node, ScopeSeparator::DoubleColon, |ancestor| match ancestor.kind() {
        "mod_item" | "trait_item" => ancestor
            .child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string()),
        "impl_item" => ancestor.child_by_field_name("type").map(|t| impl_target(&t, source)),
        _ => None,
    })
}

/// `Foo<T>` → `Foo`, `crate::net::Client` → `Client`.
fn impl_target(type_node: &Node<'_>, source: &str) -> String {
    let base = match type_node.kind() {
        "generic_type" => type_node
            .child_by_field_name("type")
            .map(|t| node_text(&t, source))
            .unwrap_or_else(|| node_text(type_node, source)),
        _ => node_text(type_node, source),
    };
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn item(node: &Node<'_>, source: &str, kind: SymbolKind) -> Option<SymbolFact> {
    let name_node = node.child_by_field_name("name")?;
    let mut fact = SymbolFact::at(node, &name_node, source, kind)?.with_scope(&scope_of(node, source));

    fact.is_async = child_of_kind(node, "function_modifiers")
        .map(|m| node_text(&m, source).split_whitespace().any(|w| w == "async"))
        .unwrap_or(false);
    fact.is_public = child_of_kind(node, "visibility_modifier")
        .map(|v| node_text(&v, source) == "pub")
        .unwrap_or(false);
    // Trait methods are as visible as the trait
    if node.kind() == "function_signature_item" || inside_any(node, &["trait_item"]) {
        fact.is_public = true;
    }
    let in_impl_or_trait = inside_any(node, &["impl_item", "trait_item", "function_item"]);
    fact.is_exported = fact.is_public && !in_impl_or_trait;
    Some(fact)
}

/// `use a::b::{c, d as e};` → specifier `a::b`, names `[c, e]`.
fn use_declaration(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let Some(argument) = node.child_by_field_name("argument") else {
        return;
    };
    let (specifier, names) = split_use_path(node_text(&argument, source));
    if specifier.is_empty() {
        return;
    }
    let reexport = child_of_kind(node, "visibility_modifier")
        .map(|v| node_text(&v, source) == "pub")
        .unwrap_or(false);
    if reexport {
        for name in &names {
            if name != "*" {
                set.push_export(name.clone());
            }
        }
    }
    let mut fact = ImportFact::new(specifier, ImportKind::Static, node);
    fact.imported_names = names;
    set.imports.push(fact);
}

/// `mod auth;` refers to a sibling file; inline `mod x { .. }` is only a scope.
fn mod_declaration(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    if node.child_by_field_name("body").is_some() {
        return;
    }
    let Some(name) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name, source);
    let mut fact = ImportFact::new(format!("self::{}", name), ImportKind::Static, node);
    fact.imported_names.push(name.to_string());
    set.imports.push(fact);
}

/// Split a `use` argument into the module path and the bound names.
///
/// - `crate::foo::bar` → (`crate::foo::bar`, [`bar`])
/// - `std::io::*` → (`std::io`, [`*`])
/// - `foo::{bar, baz as qux}` → (`foo`, [`bar`, `qux`])
/// - `serde::Deserialize as De` → (`serde::Deserialize`, [`De`])
pub(crate) fn split_use_path(path: &str) -> (String, Vec<String>) {
    let path: String = path.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(open) = path.find('{') {
        let base = path[..open].trim().trim_end_matches("::").to_string();
        let close = path.rfind('}').unwrap_or(path.len());
        let list = if open < close { &path[open + 1..close] } else { "" };
        let names = list
            .split(',')
            .filter_map(|entry| bound_name(entry.trim()))
            .collect();
        return (base, names);
    }

    if let Some(base) = path.strip_suffix("::*") {
        return (base.trim().to_string(), vec!["*".to_string()]);
    }

    let (module, alias) = match path.split_once(" as ") {
        Some((module, alias)) => (module.trim(), Some(alias.trim())),
        None => (path.trim(), None),
    };
    let leaf = module.rsplit("::").next().unwrap_or(module);
    let bound = alias.unwrap_or(leaf);
    (module.to_string(), vec![bound.to_string()])
}

/// Name bound by one entry of a braced use list.
fn bound_name(entry: &str) -> Option<String> {
    if entry.is_empty() {
        return None;
    }
    if let Some((_, alias)) = entry.split_once(" as ") {
        return Some(alias.trim().to_string());
    }
    if entry == "self" {
        return Some("self".to_string());
    }
    let leaf = entry.trim_end_matches("::*").rsplit("::").next().unwrap_or(entry);
    Some(leaf.trim_matches(|c| c == '{' || c == '}').trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::pool::with_parser;

    fn extract(source: &str) -> SymbolSet {
        let tree = with_parser(Language::Rust, |p| p.parse(source, None))
            .unwrap()
            .unwrap();
        RustSupport.extract_symbols(tree.root_node(), source)
    }

    #[test]
    fn test_items() {
        let set = extract(
            "pub struct Client { id: u32 }\nenum Mode { A }\npub trait Send2 { fn go(&self); }\ntype Id = u32;\npub const LIMIT: usize = 3;\npub async fn connect() {}\n",
        );
        let kinds: Vec<_> = set.symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("Client", SymbolKind::Class),
                ("Mode", SymbolKind::Enum),
                ("Send2", SymbolKind::Interface),
                ("go", SymbolKind::Method),
                ("Id", SymbolKind::TypeAlias),
                ("LIMIT", SymbolKind::Constant),
                ("connect", SymbolKind::Function),
            ]
        );
        let connect = set.symbols.iter().find(|s| s.name == "connect").unwrap();
        assert!(connect.is_async);
        assert!(connect.is_public);
        assert!(connect.is_exported);
        assert!(!set.symbols[1].is_public);
        assert_eq!(set.exports, vec!["Client", "Send2", "LIMIT", "connect"]);
    }

    #[test]
    fn test_impl_methods_scoped() {
        let set = extract(
            "mod net {\n    pub struct Client;\n    impl<T> Default for Client {\n        fn default() -> Self { Client }\n    }\n    impl Client {\n        pub(crate) fn send(&self) {}\n    }\n}\n",
        );
        let send = set.symbols.iter().find(|s| s.name == "send").unwrap();
        assert_eq!(send.kind, SymbolKind::Method);
        assert_eq!(send.fqn, "net::Client::send");
        assert_eq!(send.parent.as_deref(), Some("Client"));
        assert!(!send.is_public);
        let default = set.symbols.iter().find(|s| s.name == "default").unwrap();
        assert_eq!(default.fqn, "net::Client::default");
    }

    #[test]
    fn test_use_and_mod_imports() {
        let set = extract(
            "mod auth;\nuse crate::services::{login, logout as out};\nuse std::io::*;\npub use self::auth::Session;\n",
        );
        let imports: Vec<_> = set
            .imports
            .iter()
            .map(|i| (i.specifier.as_str(), i.imported_names.clone()))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("self::auth", vec!["auth".to_string()]),
                ("crate::services", vec!["login".to_string(), "out".to_string()]),
                ("std::io", vec!["*".to_string()]),
                ("self::auth::Session", vec!["Session".to_string()]),
            ]
        );
        assert_eq!(set.exports, vec!["Session"]);
    }

    #[test]
    fn test_split_use_path() {
        assert_eq!(
            split_use_path("serde::Deserialize as De"),
            ("serde::Deserialize".to_string(), vec!["De".to_string()])
        );
        assert_eq!(
            split_use_path("super::{self, model::Node}"),
            ("super".to_string(), vec!["self".to_string(), "Node".to_string()])
        );
    }

    #[test]
    fn test_call_targets() {
        let source = "fn f() { run(); self.client.send(); Vec::<u8>::new(); parse::<u32>(); }";
        let tree = with_parser(Language::Rust, |p| p.parse(source, None))
            .unwrap()
            .unwrap();
        let mut targets = Vec::new();
        visit::walk(tree.root_node(), |node, _| {
            if let Some(target) = RustSupport.call_target(node) {
                targets.push(node_text(&target, source).to_string());
            }
            Visit::Continue
        });
        assert_eq!(targets, vec!["run", "send", "new", "parse"]);
    }
}
