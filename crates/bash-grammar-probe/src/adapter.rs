//! Runtime adapter: wraps a raw grammar accessor into a tree-sitter language.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;
use tree_sitter::{ffi, Language, Parser, LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION};
use tree_sitter_language::LanguageFn;

use crate::error::AdapterError;

/// Where a language handle came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrammarOrigin {
    /// Grammar linked into the binary.
    Builtin,
    /// Grammar loaded from a shared library file.
    Library { path: PathBuf },
}

/// A grammar accepted by the runtime.
///
/// Grammar libraries are never unloaded, so a [`Language`] cloned out of a
/// handle stays valid after the handle is dropped.
#[derive(Clone)]
pub struct LanguageHandle {
    language: Language,
    origin: GrammarOrigin,
}

impl LanguageHandle {
    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn origin(&self) -> &GrammarOrigin {
        &self.origin
    }

    pub fn abi_version(&self) -> usize {
        self.language.abi_version()
    }

    pub fn node_kind_count(&self) -> usize {
        self.language.node_kind_count()
    }

    pub fn field_count(&self) -> usize {
        self.language.field_count()
    }

    pub fn parse_state_count(&self) -> usize {
        self.language.parse_state_count()
    }

    /// Snapshot of the table metadata.
    pub fn metadata(&self) -> LanguageMetadata {
        LanguageMetadata {
            abi_version: self.abi_version(),
            node_kind_count: self.node_kind_count(),
            field_count: self.field_count(),
            parse_state_count: self.parse_state_count(),
        }
    }
}

impl fmt::Debug for LanguageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageHandle")
            .field("origin", &self.origin)
            .field("abi_version", &self.abi_version())
            .finish_non_exhaustive()
    }
}

/// Table sizes reported by a loaded grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageMetadata {
    pub abi_version: usize,
    pub node_kind_count: usize,
    pub field_count: usize,
    pub parse_state_count: usize,
}

/// Wraps `provider` into a language handle, or `None` if the runtime
/// cannot use it.
pub fn new_language(provider: LanguageFn) -> Option<LanguageHandle> {
    try_new_language(provider).ok()
}

/// Like [`new_language`], reporting why a grammar was refused.
pub fn try_new_language(provider: LanguageFn) -> Result<LanguageHandle, AdapterError> {
    wrap(provider, GrammarOrigin::Builtin)
}

pub(crate) fn wrap(
    provider: LanguageFn,
    origin: GrammarOrigin,
) -> Result<LanguageHandle, AdapterError> {
    let accessor = provider.into_raw();

    // SAFETY: grammar accessors take no arguments and return a pointer to
    // static tables (or null when the artifact is broken).
    let raw = unsafe { accessor() };
    if raw.is_null() {
        return Err(AdapterError::NullLanguage);
    }

    // SAFETY: a non-null accessor result points at a `TSLanguage`, whose
    // ABI version is readable whatever the rest of its layout.
    let version = unsafe { ffi::ts_language_abi_version(raw.cast()) } as usize;
    check_abi_version(version)?;

    // SAFETY: `accessor` is the same grammar accessor we just called.
    let language = Language::new(unsafe { LanguageFn::from_raw(accessor) });

    debug!(abi_version = version, ?origin, "Grammar accepted by runtime");
    Ok(LanguageHandle { language, origin })
}

/// Checks that a grammar's ABI version is one the runtime can read.
pub fn check_abi_version(version: usize) -> Result<(), AdapterError> {
    if (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&version) {
        return Ok(());
    }
    Err(AdapterError::IncompatibleVersion {
        version,
        min: MIN_COMPATIBLE_LANGUAGE_VERSION,
        max: LANGUAGE_VERSION,
    })
}

/// Confirms that a parser accepts the language.
pub fn verify_parser_accepts(handle: &LanguageHandle) -> Result<(), AdapterError> {
    let mut parser = Parser::new();
    parser
        .set_language(handle.language())
        .map_err(AdapterError::Rejected)
}
