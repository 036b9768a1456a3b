//! Error types for grammar loading and verification.

use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons the runtime adapter refuses to produce a language handle.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("grammar accessor returned a null language")]
    NullLanguage,

    #[error("incompatible grammar ABI version {version} (runtime supports {min}..={max})")]
    IncompatibleVersion {
        version: usize,
        min: usize,
        max: usize,
    },

    #[error("parser rejected the language")]
    Rejected(#[source] tree_sitter::LanguageError),
}

/// Errors raised while locating or opening a grammar shared library.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Grammar library not found in any search path.
    #[error("grammar library not found: {name} (searched {} directories)", searched.len())]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// The dynamic loader refused the file.
    #[error("failed to load grammar library {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The library exists but doesn't export the expected symbol.
    #[error("grammar library {} missing language function '{symbol}'", path.display())]
    MissingSymbol { path: PathBuf, symbol: String },

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Errors raised by a smoke parse.
#[derive(Error, Debug)]
pub enum SmokeError {
    #[error("parser initialisation failed")]
    ParserInit(#[source] tree_sitter::LanguageError),

    #[error("parser produced no tree")]
    NoTree,

    #[error("sample '{name}' contains syntax errors at line {line}, column {column}")]
    SyntaxError {
        name: String,
        line: usize,
        column: usize,
        byte_range: Range<usize>,
    },

    #[error("sample '{name}' was expected to fail but parsed cleanly")]
    UnexpectedSuccess { name: String },

    #[error("sample '{name}': expected {what} '{expected}', got '{actual}'")]
    KindMismatch {
        name: String,
        what: &'static str,
        expected: String,
        actual: String,
    },
}

/// Errors raised while reading probe configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid probe configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Underlying cause of a load failure.
#[derive(Error, Debug)]
pub enum LoadCause {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// All errors that can occur while probing a grammar
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The grammar could not be turned into a usable language.
    ///
    /// The message is fixed; the reason is kept as the error source.
    #[error("Error loading {grammar} grammar")]
    LoadFailure {
        grammar: String,
        #[source]
        cause: LoadCause,
    },

    #[error("smoke parse failed: {0}")]
    Smoke(#[from] SmokeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProbeError {
    pub(crate) fn load_failure(grammar: &str, cause: impl Into<LoadCause>) -> Self {
        ProbeError::LoadFailure {
            grammar: grammar.to_string(),
            cause: cause.into(),
        }
    }

    /// Returns the underlying cause when this is a load failure.
    pub fn load_cause(&self) -> Option<&LoadCause> {
        match self {
            ProbeError::LoadFailure { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;
