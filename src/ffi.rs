//! FFI bindings for the moment engine
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions take and return JSON as C strings (null-terminated);
//! returned strings are allocated and must be freed by the caller using
//! `moment_engine_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::EngineError;
use crate::pipeline::{analyze_bundle_json, assess_patterns_json};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Shared shape of every JSON-in / JSON-out entry point
unsafe fn json_call(
    input: *const c_char,
    what: &str,
    f: impl FnOnce(&str) -> Result<String, EngineError>,
) -> *mut c_char {
    clear_last_error();

    let input = match cstr_to_string(input) {
        Some(s) => s,
        None => {
            set_last_error(&format!("Invalid {what} string pointer"));
            return ptr::null_mut();
        }
    };

    match f(&input) {
        Ok(output) => string_to_cstr(&output),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Analysis API
// ============================================================================

/// Analyze a bundle of dataset descriptors and payloads; returns the report JSON.
///
/// The bundle is `{ "datasets": [descriptor...], "payloads": { "<id>": <raw log> } }`.
/// Datasets without a payload, or whose payload does not match their schema,
/// are listed under `skipped` in the report rather than failing the call.
///
/// # Safety
/// - `bundle_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `moment_engine_free_string`.
/// - Returns NULL on error; call `moment_engine_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn moment_engine_analyze(bundle_json: *const c_char) -> *mut c_char {
    json_call(bundle_json, "bundle JSON", analyze_bundle_json)
}

/// Assess an interaction-pattern corpus; returns the quality report JSON.
///
/// # Safety
/// - `patterns_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `moment_engine_free_string`.
/// - Returns NULL on error; call `moment_engine_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn moment_engine_assess_patterns(patterns_json: *const c_char) -> *mut c_char {
    json_call(patterns_json, "patterns JSON", assess_patterns_json)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn moment_engine_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn moment_engine_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn moment_engine_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_bundle() -> CString {
        CString::new(
            r#"{
            "datasets": [
                { "id": "policy", "filename": "policy.json", "label": "Policy run",
                  "schema": { "kind": "nested_multi_life", "key": "results" } },
                { "id": "missing", "filename": "missing.json", "label": "Missing",
                  "schema": { "kind": "multi_life" } }
            ],
            "payloads": {
                "policy": { "results": { "lives": [
                    { "t3_history": [0.5, 0.3], "atp_history": [100.0, 60.0] },
                    { "t3_history": [0.3, 0.52], "atp_history": [60.0, 15.0],
                      "termination_reason": "atp_exhaustion" }
                ] } }
            }
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_analyze() {
        let bundle = sample_bundle();

        unsafe {
            let result = moment_engine_analyze(bundle.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let report: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(report["producer"]["name"], "moment-engine");
            assert_eq!(report["skipped"][0], "missing");
            assert_eq!(report["moments"][0]["category"], "emergence");
            assert!(moment_engine_last_error().is_null());

            moment_engine_free_string(result);
        }
    }

    #[test]
    fn test_ffi_assess_patterns() {
        let corpus = CString::new("[]").unwrap();

        unsafe {
            let result = moment_engine_assess_patterns(corpus.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("overall_quality"));

            moment_engine_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = moment_engine_analyze(invalid.as_ptr());
            assert!(result.is_null());

            let error = moment_engine_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let result = moment_engine_assess_patterns(ptr::null());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(moment_engine_last_error()).to_str().unwrap();
            assert!(error_str.contains("patterns JSON"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = moment_engine_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}
