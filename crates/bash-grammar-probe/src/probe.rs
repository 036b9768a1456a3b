//! The grammar load probe.
//!
//! A probe makes exactly one attempt to turn its grammar provider into a
//! [`LanguageHandle`]. The outcome is recorded and returned again on every
//! later call; to retry, build a new probe.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};
use tree_sitter_language::LanguageFn;

use crate::adapter::{self, GrammarOrigin, LanguageHandle, LanguageMetadata};
use crate::config::{GrammarSource, ProbeConfig};
use crate::error::{ProbeError, Result};
use crate::library::{grammar_search_paths, GrammarLibrary};
use crate::smoke::{self, ParseSummary, SmokeOutcome, SmokeSample};

type GrammarAccessor = unsafe extern "C" fn() -> *const ();

enum Provider {
    Linked(GrammarAccessor),
    Library {
        path: Option<PathBuf>,
        symbol: String,
        search_paths: Vec<PathBuf>,
    },
}

/// Progress of a probe.
#[derive(Debug)]
pub enum ProbeState {
    NotLoaded,
    Loaded(LanguageHandle),
    Failed(ProbeError),
}

/// Verifies that a compiled grammar can be wrapped into a usable language.
pub struct GrammarLoadProbe {
    grammar: String,
    display_name: String,
    provider: Provider,
    verify_parser: bool,
    samples: Vec<SmokeSample>,
    state: ProbeState,
}

impl GrammarLoadProbe {
    /// Probe for a statically linked grammar accessor.
    pub fn new(provider: LanguageFn) -> Self {
        Self {
            grammar: bash_grammar::GRAMMAR_NAME.to_string(),
            display_name: bash_grammar::DISPLAY_NAME.to_string(),
            provider: Provider::Linked(provider.into_raw()),
            verify_parser: false,
            samples: Vec::new(),
            state: ProbeState::NotLoaded,
        }
    }

    /// Probe for the builtin Bash grammar.
    pub fn bash() -> Self {
        Self::new(bash_grammar::language_fn())
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        let provider = match &config.source {
            GrammarSource::Builtin => Provider::Linked(bash_grammar::language_fn().into_raw()),
            GrammarSource::Library { path, .. } => Provider::Library {
                path: path.clone(),
                symbol: config.symbol().to_string(),
                search_paths: config.search_paths.clone(),
            },
        };

        Self {
            grammar: config.grammar.clone(),
            display_name: config.display_name.clone(),
            provider,
            verify_parser: config.verify_parser,
            samples: config.samples.clone(),
            state: ProbeState::NotLoaded,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Also require a parser to accept the loaded language.
    pub fn with_parser_check(mut self, verify_parser: bool) -> Self {
        self.verify_parser = verify_parser;
        self
    }

    pub fn with_samples(mut self, samples: Vec<SmokeSample>) -> Self {
        self.samples = samples;
        self
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    /// Runs the load attempt if it has not happened yet and returns its
    /// outcome.
    pub fn load(&mut self) -> std::result::Result<&LanguageHandle, &ProbeError> {
        if let ProbeState::NotLoaded = self.state {
            self.state = match self.attempt() {
                Ok(handle) => ProbeState::Loaded(handle),
                Err(e) => {
                    warn!(
                        grammar = %self.grammar,
                        error = %e,
                        cause = ?e.load_cause(),
                        "Grammar failed to load"
                    );
                    ProbeState::Failed(e)
                }
            };
        }

        match &self.state {
            ProbeState::Loaded(handle) => Ok(handle),
            ProbeState::Failed(e) => Err(e),
            ProbeState::NotLoaded => unreachable!("load attempt always records an outcome"),
        }
    }

    /// Loads and hands over the handle.
    pub fn into_handle(mut self) -> Result<LanguageHandle> {
        let _ = self.load();
        match self.state {
            ProbeState::Loaded(handle) => Ok(handle),
            ProbeState::Failed(e) => Err(e),
            ProbeState::NotLoaded => unreachable!("load attempt always records an outcome"),
        }
    }

    /// Loads the grammar and checks every sample, stopping at the first
    /// failure.
    pub fn into_checked(self) -> Result<(LanguageHandle, Vec<ParseSummary>)> {
        let samples = self.samples.clone();
        let handle = self.into_handle()?;
        let summaries = samples
            .iter()
            .map(|sample| smoke::check_sample(&handle, sample))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((handle, summaries))
    }

    /// Loads the grammar, runs any smoke samples and summarises the result.
    pub fn run(&mut self) -> ProbeReport {
        let grammar = self.grammar.clone();
        let samples = std::mem::take(&mut self.samples);

        let report = match self.load() {
            Ok(handle) => {
                let outcomes = smoke::run_samples(handle, &samples);
                ProbeReport {
                    grammar,
                    passed: outcomes.iter().all(|o| o.passed),
                    origin: Some(handle.origin().clone()),
                    message: None,
                    cause: None,
                    metadata: Some(handle.metadata()),
                    samples: outcomes,
                }
            }
            Err(e) => ProbeReport {
                grammar,
                passed: false,
                origin: None,
                message: Some(e.to_string()),
                cause: e.load_cause().map(|cause| cause.to_string()),
                metadata: None,
                samples: Vec::new(),
            },
        };

        self.samples = samples;
        report
    }

    fn attempt(&self) -> Result<LanguageHandle> {
        debug!(grammar = %self.grammar, "Loading grammar");

        let handle = match &self.provider {
            Provider::Linked(accessor) => {
                // SAFETY: `accessor` came out of a `LanguageFn`.
                let provider = unsafe { LanguageFn::from_raw(*accessor) };
                adapter::try_new_language(provider)
                    .map_err(|e| ProbeError::load_failure(&self.display_name, e))?
            }
            Provider::Library {
                path,
                symbol,
                search_paths,
            } => {
                let library = match path {
                    Some(path) => GrammarLibrary::open(path),
                    None => GrammarLibrary::find(&self.grammar, &grammar_search_paths(search_paths)),
                };
                library
                    .and_then(|library| library.load(symbol))
                    .map_err(|e| ProbeError::load_failure(&self.display_name, e))?
            }
        };

        if self.verify_parser {
            adapter::verify_parser_accepts(&handle)
                .map_err(|e| ProbeError::load_failure(&self.display_name, e))?;
        }

        info!(
            grammar = %self.grammar,
            abi_version = handle.abi_version(),
            node_kinds = handle.node_kind_count(),
            "Grammar loaded"
        );
        Ok(handle)
    }
}

/// Serializable summary of a probe run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub grammar: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<GrammarOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LanguageMetadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<SmokeOutcome>,
}
