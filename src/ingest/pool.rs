//! Thread-local parser pool for reusing tree-sitter Parser instances.
//!
//! Creating a `Parser` and loading a grammar per file dominates small-file
//! parse time. Each thread keeps one parser per language, created on first
//! use; no locks are needed since a `RefCell` guards single-threaded access.
//!
//! ```rust,ignore
//! use meridian::ingest::pool::with_parser;
//! use meridian::ingest::Language;
//!
//! let tree = with_parser(Language::Rust, |parser| parser.parse(source, None))?;
//! ```

use crate::ingest::detect::Language;
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<Language, tree_sitter::Parser>> = RefCell::new(HashMap::new());
}

/// Grammar for a language.
pub fn grammar_for(language: Language) -> tree_sitter::Language {
    match language {
        Language::JavaScript => tree_sitter_javascript::language(),
        Language::TypeScript => tree_sitter_typescript::language_typescript(),
        Language::Tsx => tree_sitter_typescript::language_tsx(),
        Language::Python => tree_sitter_python::language(),
        Language::Rust => tree_sitter_rust::language(),
        Language::Java => tree_sitter_java::language(),
        Language::C => tree_sitter_c::language(),
        Language::Cpp => tree_sitter_cpp::language(),
    }
}

/// Execute a function with the calling thread's parser for `language`.
///
/// The parser is created and bound to its grammar on first use. Errors only
/// when the grammar's ABI version is incompatible with the tree-sitter runtime.
pub fn with_parser<F, R>(language: Language, f: F) -> Result<R>
where
    F: FnOnce(&mut tree_sitter::Parser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        if !parsers.contains_key(&language) {
            let mut parser = tree_sitter::Parser::new();
            parser
                .set_language(&grammar_for(language))
                .map_err(|e| anyhow!("grammar for {} rejected: {}", language, e))?;
            parsers.insert(language, parser);
        }
        let parser = parsers
            .get_mut(&language)
            .ok_or_else(|| anyhow!("parser for {} missing after initialization", language))?;
        // Clear any state left over from a cancelled or timed-out parse
        parser.reset();
        Ok(f(parser))
    })
}

/// Warmup all parsers on the calling thread to avoid first-parse latency.
///
/// Thread-local parsers are per-thread, so worker threads call this on start.
pub fn warmup_parsers() -> Result<()> {
    let samples: [(Language, &[u8]); 8] = [
        (Language::JavaScript, b"function test() {}"),
        (Language::TypeScript, b"function test(): void {}"),
        (Language::Tsx, b"const A = () => <div />;"),
        (Language::Python, b"def test(): pass"),
        (Language::Rust, b"fn test() {}"),
        (Language::Java, b"class Test {}"),
        (Language::C, b"int test() { return 0; }"),
        (Language::Cpp, b"void test() {}"),
    ];

    for (lang, source) in samples {
        with_parser(lang, |parser| {
            parser.parse(source, None);
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_reuse() {
        let addr1 = with_parser(Language::Rust, |p| p as *const _ as usize).unwrap();
        let addr2 = with_parser(Language::Rust, |p| p as *const _ as usize).unwrap();
        assert_eq!(addr1, addr2, "Parser should be reused in same thread");
    }

    #[test]
    fn test_all_languages_have_parsers() {
        for lang in Language::ALL {
            let result = with_parser(lang, |parser| parser.parse(b"", None).is_some());
            assert!(result.is_ok(), "Language {:?} should have a working parser", lang);
            assert!(result.unwrap(), "Language {:?} should parse successfully", lang);
        }
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let source = b"def f():\n    return 1\n";
        let barrier = Arc::new(Barrier::new(2));
        let barrier_clone = barrier.clone();

        let handle = thread::spawn(move || {
            barrier_clone.wait();
            with_parser(Language::Python, |parser| parser.parse(source, None))
                .unwrap()
                .is_some()
        });

        barrier.wait();
        let main_result = with_parser(Language::Python, |parser| parser.parse(source, None))
            .unwrap()
            .is_some();

        assert!(main_result, "Main thread parse should succeed");
        assert!(handle.join().unwrap(), "Spawned thread parse should succeed");
    }

    #[test]
    fn test_tsx_and_typescript_are_distinct() {
        let source = b"const A = () => <div />;";
        let tsx_errors = with_parser(Language::Tsx, |parser| {
            parser.parse(source, None).unwrap().root_node().has_error()
        })
        .unwrap();
        assert!(!tsx_errors, "JSX should parse under the TSX grammar");
    }

    #[test]
    fn test_root_kinds() {
        let tree = with_parser(Language::Rust, |parser| parser.parse(b"struct Test;", None))
            .unwrap()
            .unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");

        let tree = with_parser(Language::Java, |parser| parser.parse(b"class A {}", None))
            .unwrap()
            .unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_warmup_parsers() {
        warmup_parsers().expect("Parser warmup should succeed");
    }
}
