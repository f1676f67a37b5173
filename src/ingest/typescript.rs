//! TypeScript and TSX symbol extraction using tree-sitter-typescript.
//!
//! Both dialects run the ECMAScript table from [`super::javascript`]; this
//! module adds interfaces, type aliases, enums and type-identifier references.

use tree_sitter::Node;

use crate::ingest::javascript::{ecmascript_call_target, extract_ecmascript};
use crate::ingest::{Language, LanguageSupport, SymbolFact, SymbolKind, SymbolSet};

/// TypeScript (`.ts .mts .cts`) or TSX (`.tsx`).
#[derive(Debug, Clone, Copy)]
pub struct TypeScriptSupport {
    language: Language,
}

impl TypeScriptSupport {
    pub fn typescript() -> Self {
        Self {
            language: Language::TypeScript,
        }
    }

    pub fn tsx() -> Self {
        Self {
            language: Language::Tsx,
        }
    }
}

impl LanguageSupport for TypeScriptSupport {
    fn language(&self) -> Language {
        self.language
    }

    fn extract_symbols(&self, root: Node<'_>, source: &str) -> SymbolSet {
        extract_ecmascript(self.language, root, source)
    }

    fn call_target<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        ecmascript_call_target(node)
    }

    fn is_identifier(&self, kind: &str) -> bool {
        matches!(
            kind,
            "identifier" | "property_identifier" | "shorthand_property_identifier" | "type_identifier"
        )
    }
}

/// Declarations that only exist in the typed grammars.
pub(crate) fn typed_declaration(node: &Node<'_>, source: &str) -> Option<SymbolFact> {
    let kind = match node.kind() {
        "interface_declaration" => SymbolKind::Interface,
        "type_alias_declaration" => SymbolKind::TypeAlias,
        "enum_declaration" => SymbolKind::Enum,
        _ => return None,
    };
    let name_node = node.child_by_field_name("name")?;
    let mut fact = SymbolFact::at(node, &name_node, source, kind)?;
    fact.is_public = true;
    fact.is_exported = node
        .parent()
        .map(|p| p.kind() == "export_statement")
        .unwrap_or(false);
    Some(fact)
}
