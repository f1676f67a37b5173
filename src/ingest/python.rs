//! Python symbol extraction using tree-sitter-python.

use tree_sitter::Node;

use crate::ingest::visit::{self, Visit};
use crate::ingest::{
    has_child_kind, inside_any, node_text, unquote, CommentStyle, ImportFact, ImportKind, Language,
    LanguageSupport, ScopeSeparator, ScopeStack, SymbolFact, SymbolKind, SymbolSet,
};

const CONDITIONAL_KINDS: &[&str] = &[
    "if_statement",
    "try_statement",
    "except_clause",
    "conditional_expression",
    "function_definition",
];

/// Python (`.py .pyi`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonSupport;

impl LanguageSupport for PythonSupport {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract_symbols(&self, root: Node<'_>, source: &str) -> SymbolSet {
        let mut set = SymbolSet::new(Language::Python);

        visit::walk(root, |node, _| {
            match node.kind() {
                "function_definition" => {
                    if let Some(fact) = function(node, source) {
                        set.symbols.push(fact);
                    }
                }
                "class_definition" => {
                    if let Some(fact) = class(node, source) {
                        set.symbols.push(fact);
                    }
                }
                "assignment" => module_assignment(node, source, &mut set),
                "import_statement" => import_statement(node, source, &mut set),
                "import_from_statement" => import_from(node, source, &mut set),
                "call" => dynamic_import(node, source, &mut set),
                _ => {}
            }
            Visit::Continue
        });

        set.finish(root)
    }

    fn call_target<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        if node.kind() != "call" {
            return None;
        }
        let function = node.child_by_field_name("function")?;
        match function.kind() {
            "identifier" => Some(function),
            "attribute" => function.child_by_field_name("attribute"),
            _ => None,
        }
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::Hash
    }
}

fn scope_of(node: &Node<'_>, source: &str) -> ScopeStack {
    ScopeStack::from_ancestors(node, ScopeSeparator::Dot, |ancestor| {
        if matches!(ancestor.kind(), "class_definition" | "function_definition") {
            ancestor
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string())
        } else {
            None
        }
    })
}

/// Nearest enclosing definition is a class.
fn is_method(node: &Node<'_>) -> bool {
    visit::ancestors(node)
        .find(|a| matches!(a.kind(), "class_definition" | "function_definition"))
        .map(|a| a.kind() == "class_definition")
        .unwrap_or(false)
}

fn is_public_name(name: &str) -> bool {
    !name.starts_with('_') || (name.starts_with("__") && name.ends_with("__"))
}

fn function(node: &Node<'_>, source: &str) -> Option<SymbolFact> {
    let name_node = node.child_by_field_name("name")?;
    let kind = if is_method(node) {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };
    let mut fact = SymbolFact::at(node, &name_node, source, kind)?.with_scope(&scope_of(node, source));
    fact.is_async = has_child_kind(node, "async");
    fact.is_public = is_public_name(&fact.name);
    fact.is_exported = fact.parent.is_none() && fact.is_public;
    Some(fact)
}

fn class(node: &Node<'_>, source: &str) -> Option<SymbolFact> {
    let name_node = node.child_by_field_name("name")?;
    let mut fact =
        SymbolFact::at(node, &name_node, source, SymbolKind::Class)?.with_scope(&scope_of(node, source));
    fact.is_public = is_public_name(&fact.name);
    fact.is_exported = fact.parent.is_none() && fact.is_public;
    Some(fact)
}

/// Module-level `NAME = value`; `__all__` feeds the export list.
fn module_assignment(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let at_module_level = node
        .parent()
        .filter(|p| p.kind() == "expression_statement")
        .and_then(|p| p.parent())
        .map(|gp| gp.kind() == "module")
        .unwrap_or(false);
    if !at_module_level {
        return;
    }
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let name = node_text(&left, source);

    if name == "__all__" {
        if let Some(right) = node.child_by_field_name("right") {
            visit::walk(right, |n, _| {
                if n.kind() == "string" {
                    set.push_export(unquote(node_text(n, source)));
                    return Visit::SkipChildren;
                }
                Visit::Continue
            });
        }
        return;
    }
    if name.starts_with("__") {
        return;
    }

    let is_constant = name.chars().any(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    let kind = if is_constant {
        SymbolKind::Constant
    } else {
        SymbolKind::Variable
    };
    if let Some(mut fact) = SymbolFact::at(node, &left, source, kind) {
        fact.is_public = is_public_name(&fact.name);
        fact.is_exported = fact.is_public;
        set.symbols.push(fact);
    }
}

/// `import a.b` / `import a.b as c`
fn import_statement(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let conditional = inside_any(node, CONDITIONAL_KINDS);
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let (module, bound) = match name.kind() {
            "aliased_import" => {
                let module = name
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source))
                    .unwrap_or("");
                let alias = name
                    .child_by_field_name("alias")
                    .map(|n| node_text(&n, source))
                    .unwrap_or(module);
                (module, alias)
            }
            _ => {
                let module = node_text(&name, source);
                (module, module.split('.').next().unwrap_or(module))
            }
        };
        if module.is_empty() {
            continue;
        }
        let mut fact = ImportFact::new(module, ImportKind::Static, node);
        fact.imported_names.push(bound.to_string());
        fact.is_conditional = conditional;
        set.imports.push(fact);
    }
}

/// `from .models import User, Role as R` / `from x import *`
fn import_from(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let Some(module) = node.child_by_field_name("module_name") else {
        return;
    };
    let mut fact = ImportFact::new(node_text(&module, source), ImportKind::Static, node);
    fact.is_conditional = inside_any(node, CONDITIONAL_KINDS);

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let bound = match name.kind() {
            "aliased_import" => name
                .child_by_field_name("alias")
                .map(|n| node_text(&n, source)),
            _ => Some(node_text(&name, source)),
        };
        if let Some(bound) = bound {
            fact.imported_names.push(bound.to_string());
        }
    }
    if has_child_kind(node, "wildcard_import") {
        fact.imported_names.push("*".to_string());
    }
    set.imports.push(fact);
}

/// `importlib.import_module('x')` and `__import__('x')`.
fn dynamic_import(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let Some(function) = node.child_by_field_name("function") else {
        return;
    };
    let callee = node_text(&function, source);
    if callee != "importlib.import_module" && callee != "import_module" && callee != "__import__" {
        return;
    }
    let Some(first) = node
        .child_by_field_name("arguments")
        .and_then(|args| args.named_child(0))
    else {
        return;
    };
    if first.kind() != "string" {
        return;
    }
    let mut fact = ImportFact::new(unquote(node_text(&first, source)), ImportKind::Dynamic, node);
    fact.is_conditional = inside_any(node, CONDITIONAL_KINDS);
    set.imports.push(fact);
}
