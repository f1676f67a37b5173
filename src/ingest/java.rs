//! Java symbol extraction using tree-sitter-java.
//!
//! FQNs are prefixed with the file's `package` declaration when present.

use tree_sitter::Node;

use crate::ingest::visit::{self, Visit};
use crate::ingest::{
    child_of_kind, has_child_kind, node_text, ImportFact, ImportKind, Language, LanguageSupport,
    ScopeSeparator, ScopeStack, SymbolFact, SymbolKind, SymbolSet,
};

const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

/// Java (`.java`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaSupport;

impl LanguageSupport for JavaSupport {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract_symbols(&self, root: Node<'_>, source: &str) -> SymbolSet {
        let mut set = SymbolSet::new(Language::Java);
        let package = package_name(&root, source);

        visit::walk(root, |node, _| {
            let kind = match node.kind() {
                "class_declaration" | "record_declaration" => SymbolKind::Class,
                "interface_declaration" | "annotation_type_declaration" => SymbolKind::Interface,
                "enum_declaration" => SymbolKind::Enum,
                "method_declaration" | "constructor_declaration" => SymbolKind::Method,
                "field_declaration" => {
                    fields(node, source, package.as_deref(), &mut set);
                    return Visit::Continue;
                }
                "import_declaration" => {
                    import(node, source, &mut set);
                    return Visit::SkipChildren;
                }
                _ => return Visit::Continue,
            };

            if let Some(fact) = declaration(node, source, kind, package.as_deref()) {
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
        match node.kind() {
            "method_invocation" => node.child_by_field_name("name"),
            "object_creation_expression" => {
                let ty = node.child_by_field_name("type")?;
                match ty.kind() {
                    "type_identifier" => Some(ty),
                    "generic_type" => child_of_kind(&ty, "type_identifier"),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn is_identifier(&self, kind: &str) -> bool {
        matches!(kind, "identifier" | "type_identifier")
    }
}

fn package_name(root: &Node<'_>, source: &str) -> Option<String> {
    let package = child_of_kind(root, "package_declaration")?;
    let mut cursor = package.walk();
    let name = package
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .map(|c| node_text(&c, source).to_string());
    name
}

fn scope_of(node: &Node<'_>, source: &str) -> ScopeStack {
    ScopeStack::from_ancestors(node, ScopeSeparator::Dot, |ancestor| {
        if TYPE_KINDS.contains(&ancestor.kind()) {
            ancestor
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string())
        } else {
            None
        }
    })
}

/// Modifier keywords (`public`, `static`, ...) on a declaration.
fn modifiers(node: &Node<'_>, source: &str) -> Vec<String> {
    child_of_kind(node, "modifiers")
        .map(|m| {
            let mut cursor = m.walk();
            let words: Vec<String> = m
                .children(&mut cursor)
                .filter(|c| !c.kind().contains("annotation"))
                .map(|c| node_text(&c, source).to_string())
                .collect();
            words
        })
        .unwrap_or_default()
}

fn qualify(fact: &mut SymbolFact, package: Option<&str>) {
    if let Some(package) = package {
        fact.fqn = format!("{}.{}", package, fact.fqn);
    }
}

fn declaration(node: &Node<'_>, source: &str, kind: SymbolKind, package: Option<&str>) -> Option<SymbolFact> {
    let name_node = node.child_by_field_name("name")?;
    let mut fact = SymbolFact::at(node, &name_node, source, kind)?.with_scope(&scope_of(node, source));
    let mods = modifiers(node, source);

    let in_interface = node
        .parent()
        .and_then(|body| body.parent())
        .map(|owner| owner.kind() == "interface_declaration")
        .unwrap_or(false);
    fact.is_public = mods.iter().any(|m| m == "public") || in_interface;
    fact.is_async = false;
    fact.is_exported = fact.is_public && fact.parent.is_none();
    qualify(&mut fact, package);
    Some(fact)
}

/// One symbol per declarator; `static final` fields are constants.
fn fields(node: &Node<'_>, source: &str, package: Option<&str>, set: &mut SymbolSet) {
    let mods = modifiers(node, source);
    let is_constant = mods.iter().any(|m| m == "static") && mods.iter().any(|m| m == "final");
    let kind = if is_constant {
        SymbolKind::Constant
    } else {
        SymbolKind::Variable
    };
    let scope = scope_of(node, source);

    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        if let Some(mut fact) = SymbolFact::at(node, &name_node, source, kind) {
            fact = fact.with_scope(&scope);
            fact.is_public = mods.iter().any(|m| m == "public");
            qualify(&mut fact, package);
            set.symbols.push(fact);
        }
    }
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.B.c;`
fn import(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let mut cursor = node.walk();
    let Some(path) = node
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
    else {
        return;
    };
    let path = node_text(&path, source);
    let wildcard = has_child_kind(node, "asterisk");

    let mut fact = ImportFact::new(path, ImportKind::Static, node);
    if wildcard {
        fact.imported_names.push("*".to_string());
    } else if let Some(leaf) = path.rsplit('.').next() {
        fact.imported_names.push(leaf.to_string());
    }
    set.imports.push(fact);
}
