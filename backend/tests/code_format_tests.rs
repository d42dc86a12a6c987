//! Property-based and unit tests for the code format
//!
//! Covers:
//! - Encode/parse round-trip fidelity for unit and bulk codes
//! - Structural rejection of out-of-shape strings
//! - Validator agreement with the parser
//! - Sequence successor shape preservation

use proptest::prelude::*;
use std::collections::HashSet;

use shared::code::{next_sequence_value, parse, CodeComponents, SequenceError, SequenceRegime};
use shared::validation::validate_code_with_year;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate a 4-character sequence value in one of the three regimes
fn sequence_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0..=9999u32).prop_map(|n| format!("{:04}", n)),
        (0..=999u32, 0..26u8).prop_map(|(n, l)| format!("{:03}{}", n, (b'A' + l) as char)),
        (0..=99u32, 0..26u8, 0..=9u8).prop_map(|(n, l, d)| {
            format!("{:02}{}{}", n, (b'A' + l) as char, d)
        }),
    ]
}

/// Generate an uppercase ASCII letter
fn upper_strategy() -> impl Strategy<Value = char> {
    (0..26u8).prop_map(|l| (b'A' + l) as char)
}

/// Generate components that pass every semantic check
fn valid_components_strategy() -> impl Strategy<Value = CodeComponents> {
    (
        0..=99u32,
        1..=12u32,
        upper_strategy(),
        prop::sample::select(vec!['F', 'I', 'H', 'B']),
        0..=999u32,
        upper_strategy(),
        prop::option::of(upper_strategy()),
        sequence_strategy(),
    )
        .prop_map(
            |(year, month, funding, mtype, ingredient, producer, package, sequence)| {
                CodeComponents {
                    year: format!("{:02}", year),
                    month: format!("{:02}", month),
                    funding_source: funding,
                    medicine_type: mtype,
                    active_ingredient: format!("{:03}", ingredient),
                    producer,
                    package_type: package,
                    sequence,
                }
            },
        )
}

/// Generate ASCII strings whose length falls outside the admissible envelope
fn out_of_length_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec(32u8..127, 0..13),
        prop::collection::vec(32u8..127, 21..40),
    ]
    .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
}

// ============================================================================
// Round-Trip Properties
// ============================================================================

proptest! {
    /// Every well-formed component set survives encode -> parse unchanged
    #[test]
    fn test_encode_parse_round_trip(components in valid_components_strategy()) {
        let encoded = components.encode();
        let parsed = parse(&encoded);
        prop_assert_eq!(parsed, Some(components));
    }

    /// Encoded length is fully determined by the bulk marker
    #[test]
    fn test_encoded_length_is_fixed(components in valid_components_strategy()) {
        let encoded = components.encode();
        if components.is_bulk() {
            prop_assert_eq!(encoded.len(), 16);
        } else {
            prop_assert_eq!(encoded.len(), 14);
        }
    }

    /// The validator accepts everything the generator can produce
    #[test]
    fn test_validator_accepts_generated_codes(components in valid_components_strategy()) {
        let encoded = components.encode();
        let reference_year: i32 = components.year.parse().unwrap();
        let result = validate_code_with_year(&encoded, reference_year);
        prop_assert!(
            result.is_valid,
            "expected '{}' to validate, errors: {:?}",
            encoded,
            result.errors
        );
        prop_assert!(result.components.is_some());
    }

    /// Strings outside the length envelope never parse
    #[test]
    fn test_out_of_length_strings_rejected(code in out_of_length_strategy()) {
        prop_assert_eq!(parse(&code), None);
        prop_assert!(!validate_code_with_year(&code, 25).is_valid);
    }

    /// The validator never disagrees with the parser about structure
    #[test]
    fn test_validator_components_match_parser(components in valid_components_strategy()) {
        let encoded = components.encode();
        let result = validate_code_with_year(&encoded, 25);
        prop_assert_eq!(result.components, parse(&encoded));
    }
}

// ============================================================================
// Sequence Successor Properties
// ============================================================================

proptest! {
    /// A successor is always 4 characters in a known regime, or the
    /// allocation space is exhausted at exactly one value
    #[test]
    fn test_successor_keeps_shape(value in sequence_strategy()) {
        match next_sequence_value(&value) {
            Ok(next) => {
                prop_assert_eq!(next.len(), 4);
                prop_assert!(SequenceRegime::classify(&next).is_some());
            }
            Err(SequenceError::Exhausted(v)) => prop_assert_eq!(v, "99Z9".to_string()),
            Err(SequenceError::Unrecognized(v)) => {
                prop_assert!(false, "generated value '{}' should classify", v)
            }
        }
    }

    /// Within the numeric regime the successor is the arithmetic increment
    #[test]
    fn test_numeric_successor_is_increment(n in 0..9999u32) {
        let value = format!("{:04}", n);
        let next = next_sequence_value(&value).unwrap();
        prop_assert_eq!(next, format!("{:04}", n + 1));
    }

    /// Walking the successor chain never revisits a value inside one regime
    /// span (the historical 999Z -> 001A wrap is the single exception and
    /// sits outside this walk)
    #[test]
    fn test_successor_chain_has_no_short_cycles(start in 0..9000u32, steps in 1..500usize) {
        let mut value = format!("{:04}", start);
        let mut seen = HashSet::new();
        seen.insert(value.clone());
        for _ in 0..steps {
            value = next_sequence_value(&value).unwrap();
            prop_assert!(seen.insert(value.clone()), "value '{}' repeated", value);
        }
    }
}

// ============================================================================
// Structural Edge Cases
// ============================================================================

mod structure {
    use super::*;

    #[test]
    fn bulk_separator_only_valid_directly_after_prefix() {
        assert!(parse("2507AF123B-X0001").is_some());
        assert_eq!(parse("2507AF123-BX0001"), None);
        assert_eq!(parse("-2507AF123BX0001"), None);
    }

    #[test]
    fn unit_code_with_embedded_dash_is_bulk_shaped_or_nothing() {
        // A dash anywhere flags the bulk layout, which pins the dash slot.
        assert_eq!(parse("2507AF123B00-01"), None);
    }

    #[test]
    fn sequence_keeps_leading_zeros() {
        let parsed = parse("2507AF123B0042").unwrap();
        assert_eq!(parsed.sequence, "0042");
        assert_eq!(parsed.encode(), "2507AF123B0042");
    }

    #[test]
    fn longest_admissible_code_parses() {
        // 10-character prefix plus a 10-character remainder.
        let parsed = parse("2507AF123B0123456789").unwrap();
        assert_eq!(parsed.sequence, "0123456789");
    }

    #[test]
    fn validator_flags_long_sequence_as_shapeless() {
        let result = validate_code_with_year("2507AF123B0123456789", 25);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("Sequence")));
    }
}
