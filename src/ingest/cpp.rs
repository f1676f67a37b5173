//! C++ symbol extraction using tree-sitter-cpp.

use tree_sitter::Node;

use crate::ingest::c::{c_family_call_target, extract_c_family};
use crate::ingest::{Language, LanguageSupport, SymbolSet};

/// C++ (`.cpp .cc .cxx .hpp .hh .hxx`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CppSupport;

impl LanguageSupport for CppSupport {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn extract_symbols(&self, root: Node<'_>, source: &str) -> SymbolSet {
        extract_c_family(Language::Cpp, root, source)
    }

    fn call_target<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        if node.kind() == "new_expression" {
            let ty = node.child_by_field_name("type")?;
            return (ty.kind() == "type_identifier").then_some(ty);
        }
        c_family_call_target(node)
    }

    fn is_identifier(&self, kind: &str) -> bool {
        matches!(
            kind,
            "identifier" | "field_identifier" | "type_identifier" | "namespace_identifier"
        )
    }
}
