//! C symbol extraction using tree-sitter-c.
//!
//! The declarator walk here is shared with C++ ([`super::cpp`]); C++ adds
//! classes, namespaces and qualified names on top.

use tree_sitter::Node;

use crate::ingest::visit::{self, Visit};
use crate::ingest::{
    inside_any, node_text, unquote, ImportFact, ImportKind, Language,
    LanguageSupport, ScopeSeparator, ScopeStack, SymbolFact, SymbolKind, SymbolSet,
};

const PREPROC_CONDITIONALS: &[&str] = &["preproc_if", "preproc_ifdef", "preproc_else", "preproc_elif"];

/// C (`.c .h`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CSupport;

impl LanguageSupport for CSupport {
    fn language(&self) -> Language {
        Language::C
    }

    fn extract_symbols(&self, root: Node<'_>, source: &str) -> SymbolSet {
        extract_c_family(Language::C, root, source)
    }

    fn call_target<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        c_family_call_target(node)
    }

    fn is_identifier(&self, kind: &str) -> bool {
        matches!(kind, "identifier" | "field_identifier" | "type_identifier")
    }
}

pub(crate) fn extract_c_family(language: Language, root: Node<'_>, source: &str) -> SymbolSet {
    let mut set = SymbolSet::new(language);

    visit::walk(root, |node, _| {
        match node.kind() {
            "function_definition" => {
                if let Some(fact) = function(node, source) {
                    set.symbols.push(fact);
                }
            }
            "struct_specifier" | "union_specifier" | "class_specifier" | "enum_specifier" => {
                if let Some(fact) = record(node, source) {
                    set.symbols.push(fact);
                }
            }
            "type_definition" => type_definition(node, source, &mut set),
            "declaration" if is_file_scope(node) => global_variables(node, source, &mut set),
            "preproc_include" => {
                include(node, source, &mut set);
                return Visit::SkipChildren;
            }
            _ => {}
        }
        Visit::Continue
    });

    let exported: Vec<String> = set
        .symbols
        .iter()
        .filter(|s| s.is_exported)
        .map(|s| s.name.clone())
        .collect();
    for name in exported {
        set.push_export(name);
    }

    set.finish(root)
}

pub(crate) fn c_family_call_target<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    if node.kind() != "call_expression" {
        return None;
    }
    callee_name(node.child_by_field_name("function")?)
}

fn callee_name(function: Node<'_>) -> Option<Node<'_>> {
    match function.kind() {
        "identifier" | "field_identifier" => Some(function),
        "field_expression" => function.child_by_field_name("field"),
        "qualified_identifier" => callee_name(function.child_by_field_name("name")?),
        "template_function" => callee_name(function.child_by_field_name("name")?),
        _ => None,
    }
}

/// Scopes from namespaces and class bodies, outermost first.
fn scope_of(node: &Node<'_>, source: &str) -> ScopeStack {
    ScopeStack::from_ancestors(node, ScopeSeparator::DoubleColon, |ancestor| match ancestor.kind() {
        "namespace_definition" | "class_specifier" | "struct_specifier" | "union_specifier" => ancestor
            .child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string()),
        _ => None,
    })
}

fn is_file_scope(node: &Node<'_>) -> bool {
    !inside_any(
        node,
        &["function_definition", "field_declaration_list", "compound_statement"],
    )
}

/// Descend `declarator` fields to the name of a function declarator.
fn function_name<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        match current.kind() {
            "function_declarator" => return current.child_by_field_name("declarator"),
            "pointer_declarator" | "reference_declarator" | "parenthesized_declarator" => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| current.named_child(0))?;
            }
            _ => return None,
        }
    }
}

fn is_static(node: &Node<'_>, source: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| c.kind() == "storage_class_specifier" && node_text(&c, source) == "static");
    found
}

/// Access in a C++ class body: the nearest preceding `public:`/`private:`,
/// else the default for the enclosing specifier.
fn member_access_public(node: &Node<'_>, source: &str) -> Option<bool> {
    let body = node.parent().filter(|p| p.kind() == "field_declaration_list")?;
    let owner = body.parent()?;
    let mut access = owner.kind() != "class_specifier";
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.start_byte() >= node.start_byte() {
            break;
        }
        if child.kind() == "access_specifier" {
            access = node_text(&child, source).trim_end_matches(':').trim() == "public";
        }
    }
    Some(access)
}

fn function(node: &Node<'_>, source: &str) -> Option<SymbolFact> {
    let name_node = function_name(node)?;
    let mut scope = scope_of(node, source);

    // `void Client::send()` defines a member out of line
    let (name_node, qualified) = if name_node.kind() == "qualified_identifier" {
        if let Some(owner) = name_node.child_by_field_name("scope") {
            scope.push(node_text(&owner, source).to_string());
        }
        let mut leaf = name_node.child_by_field_name("name")?;
        while leaf.kind() == "qualified_identifier" {
            if let Some(owner) = leaf.child_by_field_name("scope") {
                scope.push(node_text(&owner, source).to_string());
            }
            leaf = leaf.child_by_field_name("name")?;
        }
        (leaf, true)
    } else {
        (name_node, false)
    };

    let in_class = inside_any(node, &["field_declaration_list"]);
    let kind = if qualified || in_class {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };
    let mut fact = SymbolFact::at(node, &name_node, source, kind)?.with_scope(&scope);
    fact.is_public = match member_access_public(node, source) {
        Some(public) => public,
        None => !is_static(node, source),
    };
    fact.is_exported = fact.is_public && kind == SymbolKind::Function;
    Some(fact)
}

/// struct/union/class/enum specifiers that carry a body.
fn record(node: &Node<'_>, source: &str) -> Option<SymbolFact> {
    node.child_by_field_name("body")?;
    let name_node = node.child_by_field_name("name")?;
    let kind = if node.kind() == "enum_specifier" {
        SymbolKind::Enum
    } else {
        SymbolKind::Class
    };
    let mut fact = SymbolFact::at(node, &name_node, source, kind)?.with_scope(&scope_of(node, source));
    fact.is_public = member_access_public(node, source).unwrap_or(true);
    fact.is_exported = fact.is_public && fact.parent.is_none();
    Some(fact)
}

/// `typedef struct { .. } Name;`
fn type_definition(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        if declarator.kind() != "type_identifier" {
            continue;
        }
        if let Some(mut fact) = SymbolFact::at(node, &declarator, source, SymbolKind::TypeAlias) {
            fact = fact.with_scope(&scope_of(node, source));
            fact.is_public = true;
            fact.is_exported = fact.parent.is_none();
            set.symbols.push(fact);
        }
    }
}

/// File-scope `int counter = 0;` (prototypes are skipped).
fn global_variables(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let is_const = {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .any(|c| c.kind() == "type_qualifier" && node_text(&c, source) == "const");
        found
    };
    let public = !is_static(node, source);

    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        let name_node = match declarator.kind() {
            "identifier" => Some(declarator),
            "init_declarator" => declarator
                .child_by_field_name("declarator")
                .filter(|d| d.kind() == "identifier"),
            _ => None,
        };
        let Some(name_node) = name_node else {
            continue;
        };
        let kind = if is_const {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        if let Some(mut fact) = SymbolFact::at(node, &name_node, source, kind) {
            fact = fact.with_scope(&scope_of(node, source));
            fact.is_public = public;
            set.symbols.push(fact);
        }
    }
}

/// `#include "x.h"` / `#include <stdio.h>`
fn include(node: &Node<'_>, source: &str, set: &mut SymbolSet) {
    let Some(path) = node.child_by_field_name("path") else {
        return;
    };
    let raw = node_text(&path, source);
    let specifier = if path.kind() == "system_lib_string" {
        raw.trim_start_matches('<').trim_end_matches('>').to_string()
    } else {
        // Local includes resolve against the including file's directory
        let local = unquote(raw);
        if local.starts_with("./") || local.starts_with("../") {
            local.to_string()
        } else {
            format!("./{}", local)
        }
    };
    let mut fact = ImportFact::new(specifier, ImportKind::Include, node);
    fact.is_conditional = inside_any(node, PREPROC_CONDITIONALS);
    set.imports.push(fact);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::pool::with_parser;

    fn extract(source: &str) -> SymbolSet {
        let tree = with_parser(Language::C, |p| p.parse(source, None))
            .unwrap()
            .unwrap();
        CSupport.extract_symbols(tree.root_node(), source)
    }

    #[test]
    fn test_functions_and_records() {
        let set = extract(
            "#include <stdio.h>\n#include \"auth.h\"\nstruct user { int id; };\nenum mode { A, B };\ntypedef struct { int x; } point_t;\nstatic int helper(void) { return 0; }\nint *make_user(int id) { return 0; }\nint counter = 0;\nconst int LIMIT = 3;\nint proto(void);\n",
        );
        let kinds: Vec<_> = set.symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("user", SymbolKind::Class),
                ("mode", SymbolKind::Enum),
                ("point_t", SymbolKind::TypeAlias),
                ("helper", SymbolKind::Function),
                ("make_user", SymbolKind::Function),
                ("counter", SymbolKind::Variable),
                ("LIMIT", SymbolKind::Constant),
            ]
        );
        let helper = set.symbols.iter().find(|s| s.name == "helper").unwrap();
        assert!(!helper.is_public);
        let make_user = set.symbols.iter().find(|s| s.name == "make_user").unwrap();
        assert!(make_user.is_public);
        assert!(set.exports.contains(&"make_user".to_string()));
        assert!(!set.exports.contains(&"helper".to_string()));
    }

    #[test]
    fn test_includes() {
        let set = extract("#include <stdio.h>\n#ifdef DEBUG\n#include \"debug.h\"\n#endif\n");
        assert_eq!(set.imports.len(), 2);
        assert_eq!(set.imports[0].specifier, "stdio.h");
        assert_eq!(set.imports[0].kind, ImportKind::Include);
        assert!(!set.imports[0].is_relative());
        assert_eq!(set.imports[1].specifier, "./debug.h");
        assert!(set.imports[1].is_conditional);
    }

    #[test]
    fn test_call_targets() {
        let source = "void f(void) { run(); dev->ops.open(); }";
        let tree = with_parser(Language::C, |p| p.parse(source, None))
            .unwrap()
            .unwrap();
        let mut targets = Vec::new();
        visit::walk(tree.root_node(), |node, _| {
            if let Some(target) = CSupport.call_target(node) {
                targets.push(node_text(&target, source).to_string());
            }
            Visit::Continue
        });
        assert_eq!(targets, vec!["run", "open"]);
    }
}
