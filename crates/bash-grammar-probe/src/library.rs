//! Loading grammars from pre-built shared libraries.
//!
//! A grammar library is a `.so`/`.dylib`/`.dll` that exports the grammar's
//! zero-argument accessor (`tree_sitter_bash` by default). Libraries are
//! looked up by file name across a list of directories.
//!
//! Opened libraries are never unloaded: languages cloned out of a handle
//! point into the library's tables and may outlive every handle. Each path
//! is opened once per process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use libloading::{Library, Symbol};
use tracing::{debug, info};
use tree_sitter_language::LanguageFn;

use crate::adapter::{self, GrammarOrigin, LanguageHandle};
use crate::error::LibraryError;

type GrammarAccessor = unsafe extern "C" fn() -> *const ();

static LOADED: OnceLock<Mutex<HashMap<PathBuf, &'static Library>>> = OnceLock::new();

/// An opened grammar shared library.
#[derive(Debug, Clone)]
pub struct GrammarLibrary {
    library: &'static Library,
    path: PathBuf,
}

impl GrammarLibrary {
    /// Opens the library at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LibraryError::NotFound {
                name: path.display().to_string(),
                searched: Vec::new(),
            });
        }

        Ok(Self {
            library: load_once(path)?,
            path: path.to_path_buf(),
        })
    }

    /// Searches `dirs` in order for the library of grammar `name`.
    pub fn find(name: &str, dirs: &[PathBuf]) -> Result<Self, LibraryError> {
        let lib_name = grammar_library_name(name);

        for dir in dirs {
            let candidate = dir.join(&lib_name);
            if candidate.is_file() {
                return Self::open(candidate);
            }
        }

        Err(LibraryError::NotFound {
            name: lib_name,
            searched: dirs.to_vec(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the grammar exported as `symbol` and hands it to the runtime
    /// adapter.
    pub fn load(&self, symbol: &str) -> Result<LanguageHandle, LibraryError> {
        let provider = self.language_fn(symbol)?;
        let handle = adapter::wrap(
            provider,
            GrammarOrigin::Library {
                path: self.path.clone(),
            },
        )?;
        info!(path = %self.path.display(), symbol, "Loaded grammar library");
        Ok(handle)
    }

    fn language_fn(&self, symbol: &str) -> Result<LanguageFn, LibraryError> {
        // SAFETY: the symbol is declared with the signature every tree-sitter
        // grammar exports.
        let accessor: Symbol<GrammarAccessor> = unsafe { self.library.get(symbol.as_bytes()) }
            .map_err(|_| LibraryError::MissingSymbol {
                path: self.path.clone(),
                symbol: symbol.to_string(),
            })?;

        // SAFETY: `self.library` is never unloaded, so the accessor and the
        // tables it returns stay mapped for the rest of the process.
        Ok(unsafe { LanguageFn::from_raw(*accessor) })
    }
}

/// Opens `path` unless it is already open, leaking the library so it stays
/// mapped.
fn load_once(path: &Path) -> Result<&'static Library, LibraryError> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut loaded = LOADED
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(library) = loaded.get(&key) {
        return Ok(*library);
    }

    debug!(path = %path.display(), "Opening grammar library");
    // SAFETY: grammar libraries contain generated parse tables and a C
    // scanner; loading them runs no initialisers of their own.
    let library = unsafe { Library::new(path) }.map_err(|source| LibraryError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let library: &'static Library = Box::leak(Box::new(library));
    loaded.insert(key, library);
    Ok(library)
}

/// Returns the platform-specific library filename for a grammar.
pub fn grammar_library_name(name: &str) -> String {
    let safe_name = name.replace('-', "_");
    #[cfg(target_os = "macos")]
    {
        format!("lib{safe_name}.dylib")
    }
    #[cfg(target_os = "windows")]
    {
        format!("{safe_name}.dll")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        format!("lib{safe_name}.so")
    }
}

/// Returns directories to search for compiled grammar libraries, `extra`
/// first.
pub fn grammar_search_paths(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs = extra.to_vec();

    if let Some(libdir) = std::env::var_os("TREE_SITTER_LIBDIR") {
        dirs.push(PathBuf::from(libdir));
    }

    if let Some(workspace) = Path::new(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2) {
        dirs.push(workspace.join("target").join("grammars"));
    }

    if let Some(cache) = cache_dir() {
        dirs.push(cache.join("tree-sitter").join("lib"));
    }

    dirs
}

fn cache_dir() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))
    }
    #[cfg(windows)]
    {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}
