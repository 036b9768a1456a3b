//! Load verification for the compiled tree-sitter Bash grammar.
//!
//! The probe obtains the grammar's raw language pointer from a provider,
//! hands it to the tree-sitter runtime and checks that a usable language
//! comes back. Providers are either the statically linked `tree-sitter-bash`
//! grammar or a pre-built shared library.
//!
//! # Example
//!
//! ```rust
//! let mut probe = bash_grammar_probe::GrammarLoadProbe::bash();
//! let handle = probe.load().expect("Error loading Bash grammar");
//! assert!(handle.node_kind_count() > 0);
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod library;
pub mod probe;
pub mod smoke;

pub use adapter::{
    check_abi_version, new_language, try_new_language, verify_parser_accepts, GrammarOrigin,
    LanguageHandle, LanguageMetadata,
};
pub use config::{GrammarSource, ProbeConfig};
pub use error::{AdapterError, ConfigError, LibraryError, LoadCause, ProbeError, Result, SmokeError};
pub use library::{grammar_library_name, grammar_search_paths, GrammarLibrary};
pub use probe::{GrammarLoadProbe, ProbeReport, ProbeState};
pub use smoke::{check_sample, run_samples, smoke_parse, ParseSummary, SmokeOutcome, SmokeSample};

/// Convenience function: load the builtin Bash grammar.
pub fn probe_bash() -> Result<LanguageHandle> {
    GrammarLoadProbe::bash().into_handle()
}

/// Convenience function: build a probe from the environment and run it.
///
/// # Example
///
/// ```rust,ignore
/// std::env::set_var("BASH_GRAMMAR_LIBRARY", "target/grammars/libbash.so");
/// let report = bash_grammar_probe::probe_from_env();
/// ```
pub fn probe_from_env() -> ProbeReport {
    GrammarLoadProbe::from_config(&ProbeConfig::from_env()).run()
}

/// Convenience function: read a JSON probe configuration, apply the
/// environment and run it.
pub fn probe_from_file(path: impl AsRef<std::path::Path>) -> Result<ProbeReport> {
    let config = ProbeConfig::from_file(path)?.apply_env(|key| std::env::var(key).ok());
    Ok(GrammarLoadProbe::from_config(&config).run())
}
