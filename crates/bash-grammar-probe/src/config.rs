//! Probe configuration.
//!
//! Configuration is plain JSON; every field has a default so `{}` describes
//! the builtin Bash grammar. Environment overrides are applied on top.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::smoke::SmokeSample;

/// Path of a grammar shared library to probe instead of the builtin grammar.
pub const ENV_LIBRARY: &str = "BASH_GRAMMAR_LIBRARY";

/// Symbol to look up in the grammar library.
pub const ENV_SYMBOL: &str = "BASH_GRAMMAR_SYMBOL";

/// Where the probe gets its grammar from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrammarSource {
    /// The grammar linked into this binary.
    #[default]
    Builtin,
    /// A pre-built shared library. Without a path the library is looked up
    /// by grammar name in the search paths.
    Library {
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default)]
        symbol: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Grammar name, used for library lookup.
    pub grammar: String,
    /// Name shown in the load failure message.
    pub display_name: String,
    pub source: GrammarSource,
    /// Extra directories searched before the default ones.
    pub search_paths: Vec<PathBuf>,
    /// Also require `Parser::set_language` to accept the grammar.
    pub verify_parser: bool,
    pub samples: Vec<SmokeSample>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            grammar: bash_grammar::GRAMMAR_NAME.to_string(),
            display_name: bash_grammar::DISPLAY_NAME.to_string(),
            source: GrammarSource::Builtin,
            search_paths: Vec::new(),
            verify_parser: true,
            samples: Vec::new(),
        }
    }
}

impl ProbeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Default configuration with the process environment applied.
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Applies `BASH_GRAMMAR_LIBRARY` and `BASH_GRAMMAR_SYMBOL` as read
    /// through `lookup`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let library = lookup(ENV_LIBRARY).filter(|value| !value.is_empty());
        let symbol_override = lookup(ENV_SYMBOL).filter(|value| !value.is_empty());

        if let Some(library) = library {
            let symbol = match &self.source {
                GrammarSource::Library { symbol, .. } => symbol.clone(),
                GrammarSource::Builtin => None,
            };
            self.source = GrammarSource::Library {
                path: Some(PathBuf::from(library)),
                symbol,
            };
        }

        if let (Some(value), GrammarSource::Library { symbol, .. }) =
            (symbol_override, &mut self.source)
        {
            *symbol = Some(value);
        }

        self
    }

    /// Symbol to resolve when loading from a library.
    pub fn symbol(&self) -> &str {
        match &self.source {
            GrammarSource::Library {
                symbol: Some(symbol),
                ..
            } => symbol,
            _ => bash_grammar::LANGUAGE_SYMBOL,
        }
    }
}
