//! C ABI for the Bash grammar.
//!
//! Builds the statically linked grammar into a shared library so it can be
//! loaded like any pre-built grammar (`GrammarSource::Library` with symbol
//! [`EXPORTED_SYMBOL`]). Also exposes `bash_grammar_report_json` and
//! `bash_grammar_string_free` for FFI consumers that want the probe result.

use std::ffi::{c_char, c_void, CString};
use std::ptr;

use bash_grammar_probe::GrammarLoadProbe;
use tracing::warn;

/// Name of the grammar accessor exported by this library.
pub const EXPORTED_SYMBOL: &str = "tree_sitter_bash_probe";

/// Returns the linked grammar's `TSLanguage` pointer.
#[no_mangle]
pub extern "C" fn tree_sitter_bash_probe() -> *const c_void {
    let accessor = bash_grammar::language_fn().into_raw();
    // SAFETY: the Bash grammar accessor takes no arguments and returns a
    // pointer to static tables.
    unsafe { accessor() }.cast()
}

/// Probe the linked grammar and return the report as JSON.
///
/// The caller must free the result with `bash_grammar_string_free`.
/// Returns null if the report cannot be encoded.
#[no_mangle]
pub extern "C" fn bash_grammar_report_json() -> *mut c_char {
    let report = GrammarLoadProbe::bash().with_parser_check(true).run();

    let json = match serde_json::to_string(&report) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode probe report");
            return ptr::null_mut();
        }
    };

    match CString::new(json) {
        Ok(cs) => cs.into_raw(),
        Err(e) => {
            warn!(error = %e, "Probe report contains a NUL byte");
            ptr::null_mut()
        }
    }
}

/// Free a string previously returned by `bash_grammar_report_json`.
///
/// # Safety
///
/// `p` must be a pointer previously returned by this crate via `CString::into_raw`,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn bash_grammar_string_free(p: *mut c_char) {
    if !p.is_null() {
        drop(CString::from_raw(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    use bash_grammar_probe::new_language;
    use tree_sitter_language::LanguageFn;

    unsafe extern "C" fn exported_accessor() -> *const () {
        tree_sitter_bash_probe().cast()
    }

    #[test]
    fn test_exported_pointer_matches_builtin() {
        let builtin = unsafe { bash_grammar::language_fn().into_raw()() };
        assert_eq!(tree_sitter_bash_probe().cast::<()>(), builtin);
    }

    #[test]
    fn test_exported_accessor_loads() {
        let provider = unsafe { LanguageFn::from_raw(exported_accessor) };
        assert!(new_language(provider).is_some(), "Error loading Bash grammar");
    }

    #[test]
    fn test_report_json() {
        let p = bash_grammar_report_json();
        assert!(!p.is_null());

        unsafe {
            let json = CStr::from_ptr(p).to_str().unwrap();
            let report: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(report["grammar"], "bash");
            assert_eq!(report["passed"], true);
            assert_eq!(report["origin"]["kind"], "builtin");

            bash_grammar_string_free(p);
        }
    }

    #[test]
    fn test_string_free_null() {
        unsafe { bash_grammar_string_free(ptr::null_mut()) };
    }
}
