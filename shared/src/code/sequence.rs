//! Sequence numbering regimes for QR identifier allocation
//!
//! Sequence values are opaque fixed-width 4-character strings. Three shapes
//! are in circulation, allocated in order of age:
//!
//! - numeric: `0000`..`9999`
//! - alpha-suffix: `000A`..`999Z` (three digits, one uppercase letter)
//! - alpha-infix: `00A1`..`99Z9` (two digits, one uppercase letter, one digit)
//!
//! A value's regime is determined from its shape alone, on every increment.
//! Nothing else about the counter is persisted, so codes issued years apart
//! stay on one continuous series per scope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value a freshly created sequence counter holds before any allocation.
///
/// The sentinel itself is never printed on a label; the first allocated
/// value is `0001`.
pub const INITIAL_SEQUENCE: &str = "0000";

/// Errors from sequence increment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The final value of the final regime (`99Z9`) cannot be incremented.
    #[error("sequence space exhausted at '{0}'")]
    Exhausted(String),
    /// The stored value matches none of the three shapes.
    #[error("unrecognized sequence value '{0}'")]
    Unrecognized(String),
}

/// The numbering regime a sequence value belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SequenceRegime {
    Numeric,
    AlphaSuffix,
    AlphaInfix,
}

impl SequenceRegime {
    /// Classify a value by shape. Returns `None` for anything that is not
    /// exactly four characters in one of the three layouts.
    pub fn classify(value: &str) -> Option<SequenceRegime> {
        let b = value.as_bytes();
        if b.len() != 4 {
            return None;
        }
        let digit = |i: usize| b[i].is_ascii_digit();
        let upper = |i: usize| b[i].is_ascii_uppercase();

        if digit(0) && digit(1) && digit(2) && digit(3) {
            Some(SequenceRegime::Numeric)
        } else if digit(0) && digit(1) && digit(2) && upper(3) {
            Some(SequenceRegime::AlphaSuffix)
        } else if digit(0) && digit(1) && upper(2) && digit(3) {
            Some(SequenceRegime::AlphaInfix)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceRegime::Numeric => "numeric",
            SequenceRegime::AlphaSuffix => "alpha_suffix",
            SequenceRegime::AlphaInfix => "alpha_infix",
        }
    }
}

impl std::fmt::Display for SequenceRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compute the successor of a sequence value.
///
/// Classification happens per call; the successor's regime follows from its
/// own shape, never from a stored tag.
pub fn next_sequence_value(current: &str) -> Result<String, SequenceError> {
    match SequenceRegime::classify(current) {
        Some(SequenceRegime::Numeric) => Ok(next_numeric(current)),
        Some(SequenceRegime::AlphaSuffix) => Ok(next_alpha_suffix(current)),
        Some(SequenceRegime::AlphaInfix) => next_alpha_infix(current),
        None => Err(SequenceError::Unrecognized(current.to_string())),
    }
}

/// Parse a run of ASCII digits already verified by classification.
fn digits_value(s: &str) -> u32 {
    s.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

fn next_numeric(current: &str) -> String {
    let n = digits_value(current);
    if n >= 9999 {
        // Numeric space full: continue into the alpha-suffix series.
        "000A".to_string()
    } else {
        format!("{:04}", n + 1)
    }
}

fn next_alpha_suffix(current: &str) -> String {
    let letter = current.as_bytes()[3];
    if letter < b'Z' {
        return format!("{}{}", &current[..3], char::from(letter + 1));
    }
    let n = digits_value(&current[..3]);
    if n >= 999 {
        // Codes already in the field continued from 999Z with 001A, so every
        // later allocation must do the same to keep each scope a single
        // unbroken series.
        "001A".to_string()
    } else {
        format!("{:03}A", n + 1)
    }
}

fn next_alpha_infix(current: &str) -> Result<String, SequenceError> {
    let b = current.as_bytes();
    let (letter, trailing) = (b[2], b[3]);
    if trailing < b'9' {
        return Ok(format!("{}{}", &current[..3], char::from(trailing + 1)));
    }
    if letter < b'Z' {
        // Trailing digit runs 1..9; it restarts at 1, not 0.
        return Ok(format!("{}{}1", &current[..2], char::from(letter + 1)));
    }
    let n = digits_value(&current[..2]);
    if n >= 99 {
        Err(SequenceError::Exhausted(current.to_string()))
    } else {
        Ok(format!("{:02}A1", n + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next(v: &str) -> String {
        next_sequence_value(v).unwrap()
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[test]
    fn test_classify_numeric() {
        assert_eq!(SequenceRegime::classify("0000"), Some(SequenceRegime::Numeric));
        assert_eq!(SequenceRegime::classify("9999"), Some(SequenceRegime::Numeric));
        assert_eq!(SequenceRegime::classify("0420"), Some(SequenceRegime::Numeric));
    }

    #[test]
    fn test_classify_alpha_suffix() {
        assert_eq!(SequenceRegime::classify("000A"), Some(SequenceRegime::AlphaSuffix));
        assert_eq!(SequenceRegime::classify("999Z"), Some(SequenceRegime::AlphaSuffix));
        assert_eq!(SequenceRegime::classify("123M"), Some(SequenceRegime::AlphaSuffix));
    }

    #[test]
    fn test_classify_alpha_infix() {
        assert_eq!(SequenceRegime::classify("00A1"), Some(SequenceRegime::AlphaInfix));
        assert_eq!(SequenceRegime::classify("99Z9"), Some(SequenceRegime::AlphaInfix));
        assert_eq!(SequenceRegime::classify("42K7"), Some(SequenceRegime::AlphaInfix));
    }

    #[test]
    fn test_classify_rejects_other_shapes() {
        assert_eq!(SequenceRegime::classify(""), None);
        assert_eq!(SequenceRegime::classify("000"), None);
        assert_eq!(SequenceRegime::classify("00001"), None);
        assert_eq!(SequenceRegime::classify("abcd"), None);
        assert_eq!(SequenceRegime::classify("000a"), None); // lowercase
        assert_eq!(SequenceRegime::classify("A000"), None); // letter leads
        assert_eq!(SequenceRegime::classify("0A00"), None); // letter in wrong slot
        assert_eq!(SequenceRegime::classify("00AA"), None); // two letters
        assert_eq!(SequenceRegime::classify("٠٠٠٠"), None); // non-ASCII digits
    }

    // ========================================================================
    // Numeric regime
    // ========================================================================

    #[test]
    fn test_numeric_increment() {
        assert_eq!(next("0000"), "0001");
        assert_eq!(next("0001"), "0002");
        assert_eq!(next("0009"), "0010");
        assert_eq!(next("0099"), "0100");
        assert_eq!(next("0999"), "1000");
        assert_eq!(next("9998"), "9999");
    }

    #[test]
    fn test_numeric_rolls_into_alpha_suffix() {
        assert_eq!(next("9999"), "000A");
    }

    // ========================================================================
    // Alpha-suffix regime
    // ========================================================================

    #[test]
    fn test_alpha_suffix_letter_increment() {
        assert_eq!(next("000A"), "000B");
        assert_eq!(next("000Y"), "000Z");
        assert_eq!(next("123M"), "123N");
        assert_eq!(next("998Z"), "999A");
    }

    #[test]
    fn test_alpha_suffix_digit_carry() {
        assert_eq!(next("000Z"), "001A");
        assert_eq!(next("042Z"), "043A");
        assert_eq!(next("099Z"), "100A");
    }

    #[test]
    fn test_alpha_suffix_final_value_wraps_to_001a() {
        // Historical wrap value, kept for series continuity.
        assert_eq!(next("999Z"), "001A");
    }

    // ========================================================================
    // Alpha-infix regime
    // ========================================================================

    #[test]
    fn test_alpha_infix_trailing_digit_increment() {
        assert_eq!(next("00A1"), "00A2");
        assert_eq!(next("00A8"), "00A9");
        assert_eq!(next("99Z8"), "99Z9");
    }

    #[test]
    fn test_alpha_infix_letter_carry_resets_trailing_to_one() {
        assert_eq!(next("00A9"), "00B1");
        assert_eq!(next("02A9"), "02B1");
        assert_eq!(next("17Y9"), "17Z1");
    }

    #[test]
    fn test_alpha_infix_digit_carry() {
        assert_eq!(next("00Z9"), "01A1");
        assert_eq!(next("05Z9"), "06A1");
        assert_eq!(next("98Z9"), "99A1");
    }

    #[test]
    fn test_alpha_infix_exhaustion() {
        assert_eq!(
            next_sequence_value("99Z9"),
            Err(SequenceError::Exhausted("99Z9".to_string()))
        );
    }

    // ========================================================================
    // Cross-regime behavior
    // ========================================================================

    #[test]
    fn test_unrecognized_values_error() {
        assert!(matches!(
            next_sequence_value("0A00"),
            Err(SequenceError::Unrecognized(_))
        ));
        assert!(matches!(
            next_sequence_value(""),
            Err(SequenceError::Unrecognized(_))
        ));
        assert!(matches!(
            next_sequence_value("00001"),
            Err(SequenceError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_successor_always_four_chars_until_exhaustion() {
        let mut value = INITIAL_SEQUENCE.to_string();
        // Walk far enough to cross the numeric/alpha-suffix boundary.
        for _ in 0..12_000 {
            value = next(&value);
            assert_eq!(value.len(), 4);
            assert!(SequenceRegime::classify(&value).is_some());
        }
    }

    #[test]
    fn test_regime_of_successor_follows_shape() {
        assert_eq!(
            SequenceRegime::classify(&next("9999")),
            Some(SequenceRegime::AlphaSuffix)
        );
        // The historical wrap value is alpha-suffix shaped, so the series
        // continues there.
        assert_eq!(
            SequenceRegime::classify(&next("999Z")),
            Some(SequenceRegime::AlphaSuffix)
        );
    }
}
