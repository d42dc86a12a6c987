//! WebAssembly module for Pesticide Stock Management Platform
//!
//! Provides client-side computation for:
//! - Offline code validation for scanner clients
//! - Code parsing into components
//! - Quick structural checks before a server round trip

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Validate a code string against the current calendar year
///
/// Returns the validation outcome (validity, errors, warnings, components)
/// as a JSON string.
#[wasm_bindgen]
pub fn validate_code(code: &str) -> Result<String, JsValue> {
    let validation = shared::validation::validate_code(code);
    serde_json::to_string(&validation)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Validate a code string against a caller-supplied reference year
#[wasm_bindgen]
pub fn validate_code_with_year(code: &str, current_year: i32) -> Result<String, JsValue> {
    let validation = shared::validation::validate_code_with_year(code, current_year);
    serde_json::to_string(&validation)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Parse a code string into its components as a JSON string
#[wasm_bindgen]
pub fn parse_code(code: &str) -> Result<String, JsValue> {
    match shared::code::parse(code) {
        Some(components) => serde_json::to_string(&components)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
        None => Err(JsValue::from_str("Code is not structurally parseable")),
    }
}

/// Quick validity check without the full report
#[wasm_bindgen]
pub fn is_valid_code(code: &str) -> bool {
    shared::validation::validate_code(code).is_valid
}

/// Whether a code string is a bulk-package code
#[wasm_bindgen]
pub fn is_bulk_code(code: &str) -> bool {
    shared::code::parse(code).map_or(false, |c| c.is_bulk())
}

/// Classify the numbering regime of a code's sequence part
///
/// Returns "numeric", "alpha_suffix", "alpha_infix", or "unrecognized".
#[wasm_bindgen]
pub fn sequence_regime(code: &str) -> String {
    shared::code::parse(code)
        .and_then(|c| shared::code::SequenceRegime::classify(&c.sequence))
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| "unrecognized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("2507AF123B0001"));
        assert!(!is_valid_code("not-a-code"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn test_is_bulk_code() {
        assert!(is_bulk_code("2507AF123B-X0001"));
        assert!(!is_bulk_code("2507AF123B0001"));
        assert!(!is_bulk_code("garbage"));
    }

    #[test]
    fn test_sequence_regime() {
        assert_eq!(sequence_regime("2507AF123B0001"), "numeric");
        assert_eq!(sequence_regime("2507AF123B001A"), "alpha_suffix");
        assert_eq!(sequence_regime("2507AF123B01A1"), "alpha_infix");
        assert_eq!(sequence_regime("????"), "unrecognized");
    }
}
