//! QR identifier format for pesticide stock codes
//!
//! A unit code packs its fields at fixed positions with no separators:
//!
//! ```text
//! YY MM S T III P SSSS
//! 25 07 A F 123 B 0001   ->  "2507AF123B0001"
//! ```
//!
//! year(2) month(2) fundingSource(1) medicineType(1) activeIngredient(3)
//! producer(1), then the sequence as the remainder. A bulk-package code uses
//! the same ten-character prefix, a literal `-`, the package type, then the
//! sequence: `"2507AF123B-X0001"`.
//!
//! Parsing is purely structural. Field values are carried as found so the
//! validator can report "parseable but invalid" separately from
//! "unparseable".

pub mod sequence;

pub use sequence::*;

use serde::{Deserialize, Serialize};

/// Shortest admissible code string (unit prefix + 3-character remainder).
pub const MIN_CODE_LEN: usize = 13;
/// Longest admissible code string.
pub const MAX_CODE_LEN: usize = 20;

/// Number of fixed-position characters before the sequence in a unit code.
pub const UNIT_PREFIX_LEN: usize = 10;

/// The decomposed fields of a code string
///
/// Produced by [`parse`] or built from a sequence scope at generation time.
/// Fields hold whatever characters occupied the positions; semantic checks
/// live in [`crate::validation`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeComponents {
    /// Two-digit year, e.g. "25"
    pub year: String,
    /// Two-digit month, e.g. "07"
    pub month: String,
    pub funding_source: char,
    pub medicine_type: char,
    /// Three-digit active-ingredient code
    pub active_ingredient: String,
    pub producer: char,
    /// Present only on bulk-package codes
    pub package_type: Option<char>,
    pub sequence: String,
}

impl CodeComponents {
    /// Whether these components describe a bulk-package code.
    pub fn is_bulk(&self) -> bool {
        self.package_type.is_some()
    }

    /// Render the components into their textual code form.
    pub fn encode(&self) -> String {
        match self.package_type {
            Some(package_type) => format!(
                "{}{}{}{}{}{}-{}{}",
                self.year,
                self.month,
                self.funding_source,
                self.medicine_type,
                self.active_ingredient,
                self.producer,
                package_type,
                self.sequence
            ),
            None => format!(
                "{}{}{}{}{}{}{}",
                self.year,
                self.month,
                self.funding_source,
                self.medicine_type,
                self.active_ingredient,
                self.producer,
                self.sequence
            ),
        }
    }
}

impl std::fmt::Display for CodeComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Decompose a code string into its components.
///
/// Returns `None` for anything that cannot be split positionally: wrong
/// length, non-ASCII content, or a bulk separator away from its slot. Never
/// panics. A `Some` result only means the string had the right shape;
/// callers wanting semantic guarantees go through the validator.
pub fn parse(code: &str) -> Option<CodeComponents> {
    if !code.is_ascii() {
        return None;
    }
    if code.len() < MIN_CODE_LEN || code.len() > MAX_CODE_LEN {
        return None;
    }

    let bytes = code.as_bytes();
    let is_bulk = code.contains('-');

    let (package_type, sequence) = if is_bulk {
        // Prefix is fixed-width, so the separator has exactly one valid slot.
        if bytes[UNIT_PREFIX_LEN] != b'-' {
            return None;
        }
        (
            Some(char::from(bytes[UNIT_PREFIX_LEN + 1])),
            code[UNIT_PREFIX_LEN + 2..].to_string(),
        )
    } else {
        (None, code[UNIT_PREFIX_LEN..].to_string())
    };

    Some(CodeComponents {
        year: code[0..2].to_string(),
        month: code[2..4].to_string(),
        funding_source: char::from(bytes[4]),
        medicine_type: char::from(bytes[5]),
        active_ingredient: code[6..9].to_string(),
        producer: char::from(bytes[9]),
        package_type,
        sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_components() -> CodeComponents {
        CodeComponents {
            year: "25".to_string(),
            month: "07".to_string(),
            funding_source: 'A',
            medicine_type: 'F',
            active_ingredient: "123".to_string(),
            producer: 'B',
            package_type: None,
            sequence: "0001".to_string(),
        }
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    #[test]
    fn test_encode_unit_code() {
        assert_eq!(unit_components().encode(), "2507AF123B0001");
    }

    #[test]
    fn test_encode_bulk_code() {
        let mut components = unit_components();
        components.package_type = Some('X');
        assert_eq!(components.encode(), "2507AF123B-X0001");
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn test_parse_unit_code() {
        let parsed = parse("2507AF123B0001").unwrap();
        assert_eq!(parsed, unit_components());
        assert!(!parsed.is_bulk());
    }

    #[test]
    fn test_parse_bulk_code() {
        let parsed = parse("2507AF123B-X0001").unwrap();
        assert_eq!(parsed.package_type, Some('X'));
        assert_eq!(parsed.sequence, "0001");
        assert!(parsed.is_bulk());
    }

    #[test]
    fn test_parse_round_trip_unit() {
        let components = unit_components();
        assert_eq!(parse(&components.encode()), Some(components));
    }

    #[test]
    fn test_parse_round_trip_bulk() {
        let mut components = unit_components();
        components.package_type = Some('K');
        components.sequence = "042Z".to_string();
        assert_eq!(parse(&components.encode()), Some(components));
    }

    #[test]
    fn test_parse_carries_invalid_fields_through() {
        // Structure is fine even though month and type are nonsense; the
        // validator owns that judgement.
        let parsed = parse("2599XX999Z0001").unwrap();
        assert_eq!(parsed.month, "99");
        assert_eq!(parsed.medicine_type, 'X');
    }

    #[test]
    fn test_parse_takes_remainder_as_sequence() {
        let parsed = parse("2507AF123B000A").unwrap();
        assert_eq!(parsed.sequence, "000A");
        let parsed = parse("2507AF123B12345678").unwrap();
        assert_eq!(parsed.sequence, "12345678");
    }

    #[test]
    fn test_parse_rejects_out_of_range_lengths() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("2507AF123B01"), None); // 12 chars
        assert_eq!(parse("2507AF123B00011223344"), None); // 21 chars
    }

    #[test]
    fn test_parse_rejects_misplaced_separator() {
        // Separator must sit immediately after the ten-character prefix.
        assert_eq!(parse("25-07AF123B0001"), None);
        assert_eq!(parse("2507AF123B0-001"), None);
    }

    #[test]
    fn test_parse_rejects_non_ascii() {
        assert_eq!(parse("๒๕07AF123B0001"), None);
        assert_eq!(parse("2507AF123B000せ"), None);
    }

    #[test]
    fn test_parse_accepts_trailing_separator_sequence() {
        // Extra dash past the package type lands in the sequence field and is
        // left for the validator to reject.
        let parsed = parse("2507AF123B-X-001").unwrap();
        assert_eq!(parsed.sequence, "-001");
    }
}
