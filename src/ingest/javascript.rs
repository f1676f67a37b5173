//! JavaScript symbol extraction using tree-sitter-javascript.
//!
//! The ECMAScript table here is shared with TypeScript and TSX; node kinds
//! that only exist in the typed grammars are handled in
//! [`super::typescript`].

use tree_sitter::Node;

use crate::ingest::visit::{self, Visit};
use crate::ingest::{
    child_of_kind, has_child_kind, inside_any, node_text, typescript, unquote, ImportFact,
    ImportKind, Language, LanguageSupport, ScopeSeparator, ScopeStack, SymbolFact, SymbolKind,
    SymbolSet,
};

/// Ancestors that make an import conditional.
pub(crate) const CONDITIONAL_KINDS: &[&str] = &[
    "if_statement",
    "try_statement",
    "catch_clause",
    "ternary_expression",
    "switch_case",
    "conditional_expression",
];

const CLASS_KINDS: &[&str] = &["class_declaration", "class", "abstract_class_declaration"];

/// JavaScript (`.js .jsx .mjs .cjs`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptSupport;

impl LanguageSupport for JavaScriptSupport {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn extract_symbols(&self, root: Node<'_>, source: &str) -> SymbolSet {
        extract_ecmascript(Language::JavaScript, root, source)
    }

    fn call_target<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        ecmascript_call_target(node)
    }

    fn is_identifier(&self, kind: &str) -> bool {
        matches!(kind, "identifier" | "property_identifier" | "shorthand_property_identifier")
    }
}

/// Walk an ECMAScript tree and collect symbols, imports and exports.
pub(crate) fn extract_ecmascript(language: Language, root: Node<'_>, source: &str) -> SymbolSet {
    let mut set = SymbolSet::new(language);

    visit::walk(root, |node, _| {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(fact) = named_symbol(node, source, SymbolKind::Function) {
                    set.symbols.push(fact);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(fact) = named_symbol(node, source, SymbolKind::Class) {
                    set.symbols.push(fact);
                }
            }
            "method_definition" => {
                if let Some(fact) = method(node, source) {
                    set.symbols.push(fact);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                if is_module_level(node) {
                    declarators(node, source, &mut set);
                }
            }
            "import_statement" => import_statement(node, source, &mut set),
            "export_statement" => export_statement(node, source, &mut set),
            "call_expression" => call_import(node, source, &mut set),
            _ => {
                if let Some(fact) = typescript::typed_declaration(node, source) {
                    set.symbols.push(fact);
                }
            }
        }
        Visit::Continue
    });

    set.finish(root)
}

/// Callee name node: `f()` → `f`, `a.b.f()` → `f`, `new F()` → `F`.
pub(crate) fn ecmascript_call_target<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let callee = match node.kind() {
        "call_expression" => node.child_by_field_name("function")?,
        "new_expression" => node.child_by_field_name("constructor")?,
        _ => return None,
    };
    match callee.kind() {
        "identifier" => Some(callee),
        "member_expression" => callee.child_by_field_name("property"),
        _ => None,
    }
}

fn scope_of(node: &Node<'_>, source: &str) -> ScopeStack {
    ScopeStack::from_ancestors(node, ScopeSeparator::Dot, |ancestor| {
        if CLASS_KINDS.contains(&ancestor.kind()) || ancestor.kind() == "interface_declaration" {
            ancestor
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string())
        } else {
            None
        }
    })
}

fn named_symbol(node: &Node<'_>, source: &str, kind: SymbolKind) -> Option<SymbolFact> {
    let name_node = node.child_by_field_name("name")?;
    let mut fact = SymbolFact::at(node, &name_node, source, kind)?.with_scope(&scope_of(node, source));
    fact.is_async = has_child_kind(node, "async");
    fact.is_exported = is_exported_declaration(node);
    fact.is_public = true;
    Some(fact)
}

fn method(node: &Node<'_>, source: &str) -> Option<SymbolFact> {
    let name_node = node.child_by_field_name("name")?;
    let mut fact =
        SymbolFact::at(node, &name_node, source, SymbolKind::Method)?.with_scope(&scope_of(node, source));
    fact.is_async = has_child_kind(node, "async");
    let private_name = name_node.kind() == "private_property_identifier";
    let restricted = child_of_kind(node, "accessibility_modifier")
        .map(|m| node_text(&m, source) != "public")
        .unwrap_or(false);
    fact.is_public = !private_name && !restricted;
    Some(fact)
}

/// `const f = () => {}` is a function; any other module-level binding a variable.
fn declarators(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let is_const = node
        .child(0)
        .map(|first| node_text(&first, source) == "const")
        .unwrap_or(false);
    let exported = is_exported_declaration(node);

    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() != "identifier" {
            // Destructuring patterns bind no single name
            continue;
        }
        let value = declarator.child_by_field_name("value");
        let is_function = value
            .map(|v| matches!(v.kind(), "arrow_function" | "function_expression" | "function"))
            .unwrap_or(false);
        let kind = if is_function {
            SymbolKind::Function
        } else if is_const {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };

        if let Some(mut fact) = SymbolFact::at(&declarator, &name_node, source, kind) {
            fact.is_async = value.map(|v| has_child_kind(&v, "async")).unwrap_or(false);
            fact.is_exported = exported;
            fact.is_public = true;
            if exported {
                set.push_export(fact.name.clone());
            }
            set.symbols.push(fact);
        }
    }
}

fn is_module_level(node: &Node<'_>) -> bool {
    match node.parent() {
        Some(parent) if parent.kind() == "program" => true,
        Some(parent) if parent.kind() == "export_statement" => {
            parent.parent().map(|p| p.kind() == "program").unwrap_or(false)
        }
        _ => false,
    }
}

fn is_exported_declaration(node: &Node<'_>) -> bool {
    node.parent()
        .map(|p| p.kind() == "export_statement")
        .unwrap_or(false)
}

fn import_statement(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let kind = if has_child_kind(node, "type") {
        ImportKind::TypeOnly
    } else {
        ImportKind::Static
    };
    let mut fact = ImportFact::new(unquote(node_text(&source_node, source)), kind, node);

    if let Some(clause) = child_of_kind(node, "import_clause") {
        visit::walk(clause, |child, _| {
            match child.kind() {
                // Default import is a direct identifier child of the clause
                "identifier" if child.parent().map(|p| p.kind()) == Some("import_clause") => {
                    fact.imported_names.push(node_text(child, source).to_string());
                }
                "namespace_import" => {
                    if let Some(ident) = child_of_kind(child, "identifier") {
                        fact.imported_names.push(node_text(&ident, source).to_string());
                    }
                    return Visit::SkipChildren;
                }
                "import_specifier" => {
                    let bound = child
                        .child_by_field_name("alias")
                        .or_else(|| child.child_by_field_name("name"));
                    if let Some(bound) = bound {
                        fact.imported_names.push(node_text(&bound, source).to_string());
                    }
                    return Visit::SkipChildren;
                }
                _ => {}
            }
            Visit::Continue
        });
    }

    set.imports.push(fact);
}

fn export_statement(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    if let Some(declaration) = node.child_by_field_name("declaration") {
        if let Some(name) = declaration.child_by_field_name("name") {
            set.push_export(node_text(&name, source));
        }
        // Declarator names are exported by `declarators`
    }

    if let Some(value) = node.child_by_field_name("value") {
        if value.kind() == "identifier" {
            set.push_export(node_text(&value, source));
        }
    }

    if let Some(clause) = child_of_kind(node, "export_clause") {
        let mut cursor = clause.walk();
        for specifier in clause.children(&mut cursor) {
            if specifier.kind() != "export_specifier" {
                continue;
            }
            let exported = specifier
                .child_by_field_name("alias")
                .or_else(|| specifier.child_by_field_name("name"));
            if let Some(name) = exported {
                set.push_export(node_text(&name, source));
            }
        }
    }

    // `export { x } from './y'` and `export * from './y'` also import
    if let Some(source_node) = node.child_by_field_name("source") {
        set.imports.push(ImportFact::new(
            unquote(node_text(&source_node, source)),
            ImportKind::Static,
            node,
        ));
    }
}

/// `require('x')` and `import('x')`.
fn call_import(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let Some(function) = node.child_by_field_name("function") else {
        return;
    };
    let kind = match function.kind() {
        "import" => ImportKind::Dynamic,
        "identifier" if node_text(&function, source) == "require" => ImportKind::Require,
        _ => return,
    };
    let Some(arguments) = node.child_by_field_name("arguments") else {
        return;
    };
    let Some(first) = arguments.named_child(0) else {
        return;
    };
    if !matches!(first.kind(), "string" | "template_string") {
        return;
    }

    let mut fact = ImportFact::new(unquote(node_text(&first, source)), kind, node);
    fact.is_conditional = inside_any(node, CONDITIONAL_KINDS);
    if kind == ImportKind::Require {
        // const { a, b } = require('x') / const x = require('x')
        if let Some(declarator) = node.parent().filter(|p| p.kind() == "variable_declarator") {
            fact.extend_span(&declarator);
            if let Some(name) = declarator.child_by_field_name("name") {
                visit::walk(name, |n, _| {
                    if matches!(n.kind(), "identifier" | "shorthand_property_identifier_pattern") {
                        fact.imported_names.push(node_text(n, source).to_string());
                    }
                    Visit::Continue
                });
            }
        }
    }
    set.imports.push(fact);
}
