//! Validation utilities for the Pesticide Stock Management Platform
//!
//! Code-string validation is layered on the structural parser: a string that
//! parses can still be semantically invalid, and the two outcomes are
//! reported differently.

use crate::code::{parse, CodeComponents, SequenceRegime, MAX_CODE_LEN, MIN_CODE_LEN};

/// Medicine type characters accepted in a code
pub const MEDICINE_TYPE_CHARS: &[char] = &['F', 'I', 'H', 'B'];

/// How far a code's 2-digit year may sit from the current year before a
/// warning is raised.
pub const YEAR_WARNING_SPAN: i32 = 5;

// ============================================================================
// Code Validation
// ============================================================================

/// Outcome of validating a candidate code string
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CodeValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Present whenever the string was structurally parseable, valid or not.
    pub components: Option<CodeComponents>,
}

impl CodeValidation {
    fn failed(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
            components: None,
        }
    }
}

/// Validate a code string against the current calendar year.
pub fn validate_code(code: &str) -> CodeValidation {
    validate_code_with_year(code, current_two_digit_year())
}

/// Validate a code string, with the reference year supplied by the caller.
///
/// Errors make the code invalid; warnings never do. Year deviation is only a
/// warning since stock legitimately stays in circulation across years.
pub fn validate_code_with_year(code: &str, current_year: i32) -> CodeValidation {
    let length = code.chars().count();
    if length < MIN_CODE_LEN {
        return CodeValidation::failed(vec![format!(
            "Code is {} characters, shorter than the minimum of {}",
            length, MIN_CODE_LEN
        )]);
    }
    if length > MAX_CODE_LEN {
        return CodeValidation::failed(vec![format!(
            "Code is {} characters, longer than the maximum of {}",
            length, MAX_CODE_LEN
        )]);
    }

    let Some(components) = parse(code) else {
        return CodeValidation::failed(vec!["Unable to parse code structure".to_string()]);
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match components.month.parse::<u32>() {
        Ok(month) if (1..=12).contains(&month) => {}
        _ => errors.push(format!(
            "Month '{}' is outside the range 01-12",
            components.month
        )),
    }

    if !MEDICINE_TYPE_CHARS.contains(&components.medicine_type) {
        errors.push(format!(
            "Medicine type '{}' is not one of F, I, H, B",
            components.medicine_type
        ));
    }

    if components.active_ingredient.len() != 3
        || !components
            .active_ingredient
            .bytes()
            .all(|b| b.is_ascii_digit())
    {
        errors.push(format!(
            "Active ingredient code '{}' must be exactly three digits",
            components.active_ingredient
        ));
    }

    if !components.producer.is_ascii_uppercase() {
        errors.push(format!(
            "Producer code '{}' must be a single uppercase letter",
            components.producer
        ));
    }

    if SequenceRegime::classify(&components.sequence).is_none() {
        errors.push(format!(
            "Sequence '{}' matches no known numbering shape",
            components.sequence
        ));
    }

    // A year that does not read as a number stays silent here; the field is
    // advisory and has no hard check.
    if let Ok(year) = components.year.parse::<i32>() {
        if (year - current_year).abs() > YEAR_WARNING_SPAN {
            warnings.push(format!(
                "Year '{}' is more than {} years from the current year",
                components.year, YEAR_WARNING_SPAN
            ));
        }
    }

    CodeValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        components: Some(components),
    }
}

fn current_two_digit_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year() % 100
}

// ============================================================================
// Medicine Master Validations
// ============================================================================

/// Validate a funding source marker (single uppercase letter or digit)
pub fn validate_funding_source(source: &str) -> Result<(), &'static str> {
    let mut chars = source.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() || c.is_ascii_digit() => Ok(()),
        _ => Err("Funding source must be a single uppercase letter or digit"),
    }
}

/// Validate an active-ingredient code (exactly three digits)
pub fn validate_active_ingredient_code(code: &str) -> Result<(), &'static str> {
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Active ingredient code must be exactly three digits")
    }
}

/// Validate a producer code (single uppercase letter)
pub fn validate_producer_code(code: &str) -> Result<(), &'static str> {
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Ok(()),
        _ => Err("Producer code must be a single uppercase letter"),
    }
}

/// Validate a bulk package-type marker (single uppercase letter or digit)
pub fn validate_package_type(package_type: &str) -> Result<(), &'static str> {
    let mut chars = package_type.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() || c.is_ascii_digit() => Ok(()),
        _ => Err("Package type must be a single uppercase letter or digit"),
    }
}

/// Validate a medicine display name
pub fn validate_medicine_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Medicine name cannot be empty");
    }
    if trimmed.chars().count() > 200 {
        return Err("Medicine name must be at most 200 characters");
    }
    Ok(())
}
