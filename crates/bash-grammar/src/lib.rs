//! Grammar provider for the tree-sitter Bash language.
//!
//! The parse tables and the external scanner are compiled by the
//! `tree-sitter-bash` crate; this crate exposes them behind a zero-argument
//! accessor together with the metadata the probe needs.

use tree_sitter::Language;
use tree_sitter_language::LanguageFn;

/// Short grammar name, as used for library file names.
pub const GRAMMAR_NAME: &str = "bash";

/// Human-readable grammar name used in diagnostics.
pub const DISPLAY_NAME: &str = "Bash";

/// Exported C symbol of the compiled grammar.
pub const LANGUAGE_SYMBOL: &str = "tree_sitter_bash";

/// The raw accessor for the statically linked Bash grammar.
pub const LANGUAGE: LanguageFn = tree_sitter_bash::LANGUAGE;

/// The highlight query shipped with the grammar.
pub const HIGHLIGHTS_QUERY: &str = tree_sitter_bash::HIGHLIGHT_QUERY;

/// Returns the raw accessor for the Bash grammar.
pub fn language_fn() -> LanguageFn {
    LANGUAGE
}

/// Returns the tree-sitter [`Language`] for Bash.
pub fn language() -> Language {
    Language::new(LANGUAGE)
}

/// Returns the JSON description of the node types.
pub fn node_types_json() -> &'static str {
    tree_sitter_bash::NODE_TYPES
}
