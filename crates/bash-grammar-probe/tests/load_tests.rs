//! Load verification for the Bash grammar through every provider.

use bash_grammar_probe::{
    new_language, probe_from_file, GrammarLoadProbe, GrammarOrigin, GrammarSource, LibraryError,
    LoadCause, ProbeConfig, ProbeError, ProbeState,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tree_sitter_language::LanguageFn;

unsafe extern "C" fn broken_grammar() -> *const () {
    std::ptr::null()
}

fn broken_provider() -> LanguageFn {
    unsafe { LanguageFn::from_raw(broken_grammar) }
}

// ============================================================================
// Builtin grammar
// ============================================================================

#[test]
fn can_load_grammar() {
    let language = new_language(bash_grammar::language_fn());
    assert!(language.is_some(), "Error loading Bash grammar");
}

#[test]
fn can_load_grammar_through_probe() {
    let mut probe = GrammarLoadProbe::bash();
    if let Err(e) = probe.load() {
        panic!("{e}");
    }
    assert!(matches!(probe.state(), ProbeState::Loaded(_)));
}

#[test]
fn parser_accepts_loaded_grammar() {
    let mut probe = GrammarLoadProbe::bash().with_parser_check(true);
    let handle = probe.load().unwrap();
    assert_eq!(handle.origin(), &GrammarOrigin::Builtin);
}

#[test]
fn repeated_loads_agree() {
    let outcomes: Vec<_> = (0..5)
        .map(|_| {
            GrammarLoadProbe::bash()
                .into_handle()
                .map(|handle| handle.metadata())
                .ok()
        })
        .collect();

    assert!(outcomes[0].is_some());
    assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]));
}

// ============================================================================
// Broken grammar
// ============================================================================

#[test]
fn null_grammar_fails_with_message() {
    let mut probe = GrammarLoadProbe::new(broken_provider());
    let err = probe.load().unwrap_err();
    assert_eq!(err.to_string(), "Error loading Bash grammar");
}

#[test]
fn null_grammar_fails_every_time() {
    for _ in 0..3 {
        let err = GrammarLoadProbe::new(broken_provider())
            .into_handle()
            .unwrap_err();
        assert_eq!(err.to_string(), "Error loading Bash grammar");
        assert!(matches!(err.load_cause(), Some(LoadCause::Adapter(_))));
    }
}

#[test]
fn null_grammar_report() {
    let report = GrammarLoadProbe::new(broken_provider()).run();
    assert!(!report.passed);
    assert_eq!(report.message.as_deref(), Some("Error loading Bash grammar"));
    assert_eq!(
        report.cause.as_deref(),
        Some("grammar accessor returned a null language")
    );
    assert!(report.metadata.is_none());
}

// ============================================================================
// Shared library grammar
// ============================================================================

#[test]
fn missing_library_is_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = ProbeConfig {
        source: GrammarSource::Library {
            path: Some(dir.path().join("libmissing.so")),
            symbol: None,
        },
        ..ProbeConfig::default()
    };

    let err = GrammarLoadProbe::from_config(&config)
        .into_handle()
        .unwrap_err();
    assert_eq!(err.to_string(), "Error loading Bash grammar");
    assert!(matches!(
        err.load_cause(),
        Some(LoadCause::Library(LibraryError::NotFound { .. }))
    ));
}

#[test]
fn corrupt_library_is_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(bash_grammar_probe::grammar_library_name("bash"));
    fs::write(&path, b"\x7fELF but not really").unwrap();

    let config = ProbeConfig {
        source: GrammarSource::Library {
            path: None,
            symbol: None,
        },
        search_paths: vec![dir.path().to_path_buf()],
        ..ProbeConfig::default()
    };

    let err = GrammarLoadProbe::from_config(&config)
        .into_handle()
        .unwrap_err();
    assert!(matches!(
        err.load_cause(),
        Some(LoadCause::Library(LibraryError::Load { .. }))
    ));
}

// ============================================================================
// Configuration files
// ============================================================================

#[test]
fn probe_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("probe.json");
    fs::write(
        &path,
        r#"{
            "verify_parser": true,
            "samples": [
                {"name": "echo", "source": "echo ok\n", "first_statement": "command"}
            ]
        }"#,
    )
    .unwrap();

    let report = probe_from_file(&path).unwrap();
    assert!(report.passed);
    assert_eq!(report.samples.len(), 1);
}

#[test]
fn probe_from_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("probe.json");
    fs::write(&path, "{ not json").unwrap();

    let err = probe_from_file(&path).unwrap_err();
    assert!(matches!(err, ProbeError::Config(_)));
}

#[test]
fn report_serializes_to_json() {
    let report = GrammarLoadProbe::bash().run();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["grammar"], "bash");
    assert_eq!(json["passed"], true);
    assert_eq!(json["origin"]["kind"], "builtin");
    assert!(json["metadata"]["abi_version"].as_u64().unwrap() > 0);
    assert!(json.get("message").is_none());
}

#[test]
fn library_origin_serializes_path() {
    let origin = GrammarOrigin::Library {
        path: PathBuf::from("/opt/libbash.so"),
    };
    let json = serde_json::to_value(&origin).unwrap();
    assert_eq!(json["kind"], "library");
    assert_eq!(json["path"], "/opt/libbash.so");
}
