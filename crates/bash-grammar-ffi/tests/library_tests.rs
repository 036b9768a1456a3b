//! Loads this crate's own shared library build as a pre-built grammar.
//!
//! Cargo emits the cdylib next to the test executable; each test copies it
//! into a fresh directory under the platform grammar file name.

use bash_grammar_ffi::EXPORTED_SYMBOL;
use bash_grammar_probe::{
    grammar_library_name, GrammarLibrary, GrammarLoadProbe, GrammarOrigin, GrammarSource,
    LibraryError, ProbeConfig, SmokeSample,
};
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tree_sitter::Parser;

fn built_library() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();
    let prefix = format!("{DLL_PREFIX}bash_grammar_ffi");

    [deps, deps.parent().unwrap_or(deps)]
        .iter()
        .filter_map(|dir| fs::read_dir(dir).ok())
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(DLL_SUFFIX))
        })
        .max_by_key(|path| fs::metadata(path).and_then(|m| m.modified()).ok())
        .unwrap_or_else(|| panic!("no {prefix}*{DLL_SUFFIX} next to {}", exe.display()))
}

fn grammar_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(built_library(), dir.path().join(grammar_library_name("bash"))).unwrap();
    dir
}

fn library_config(dir: &Path) -> ProbeConfig {
    ProbeConfig {
        source: GrammarSource::Library {
            path: None,
            symbol: Some(EXPORTED_SYMBOL.to_string()),
        },
        search_paths: vec![dir.to_path_buf()],
        ..ProbeConfig::default()
    }
}

#[test]
fn probe_loads_shared_library() {
    let dir = grammar_dir();
    let mut config = library_config(dir.path());
    config.samples = vec![SmokeSample::new("echo", "echo from a library\n")];

    let report = GrammarLoadProbe::from_config(&config).run();
    assert!(report.passed, "{report:?}");
    assert_eq!(
        report.origin,
        Some(GrammarOrigin::Library {
            path: dir.path().join(grammar_library_name("bash")),
        })
    );
    assert_eq!(report.samples.len(), 1);
}

#[test]
fn library_matches_linked_grammar() {
    let dir = grammar_dir();
    let from_library = GrammarLoadProbe::from_config(&library_config(dir.path()))
        .into_handle()
        .unwrap();
    let linked = GrammarLoadProbe::bash().into_handle().unwrap();

    assert_eq!(from_library.metadata(), linked.metadata());
}

#[test]
fn language_outlives_handle_and_library() {
    let dir = grammar_dir();
    let language = {
        let library = GrammarLibrary::find("bash", &[dir.path().to_path_buf()]).unwrap();
        let handle = library.load(EXPORTED_SYMBOL).unwrap();
        handle.language().clone()
    };

    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();
    let tree = parser.parse("echo hi\n", None).unwrap();
    assert_eq!(tree.root_node().kind(), "program");
    assert!(!tree.root_node().has_error());
}

#[test]
fn reopening_library_loads_again() {
    let dir = grammar_dir();
    let path = dir.path().join(grammar_library_name("bash"));

    for _ in 0..3 {
        let handle = GrammarLibrary::open(&path)
            .and_then(|library| library.load(EXPORTED_SYMBOL))
            .unwrap();
        assert!(handle.node_kind_count() > 0);
    }
}

#[test]
fn missing_symbol_in_library() {
    let dir = grammar_dir();
    let library = GrammarLibrary::find("bash", &[dir.path().to_path_buf()]).unwrap();

    match library.load("tree_sitter_fish") {
        Err(LibraryError::MissingSymbol { symbol, .. }) => assert_eq!(symbol, "tree_sitter_fish"),
        other => panic!("expected MissingSymbol, got {other:?}"),
    }
}
