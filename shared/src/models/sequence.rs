//! Sequence scopes and counter records

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::code::CodeComponents;

use super::medicine::Medicine;

/// The identity tuple owning one sequence counter
///
/// Every distinct combination of period and medicine markers (plus package
/// type for bulk codes) numbers its codes independently. A new calendar
/// month therefore always starts from a fresh counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequenceScope {
    /// Two-digit year
    pub year: String,
    /// Two-digit month
    pub month: String,
    pub funding_source: char,
    pub medicine_type: char,
    /// Three-digit active-ingredient code
    pub active_ingredient: String,
    pub producer: char,
    /// Present only for bulk-package scopes
    pub package_type: Option<char>,
}

impl SequenceScope {
    /// Build the scope a medicine's codes are numbered under for the given
    /// instant. Fails if the master record's marker fields are malformed.
    pub fn for_medicine(
        medicine: &Medicine,
        at: DateTime<Utc>,
        bulk: bool,
    ) -> Result<Self, &'static str> {
        let funding_source = single_char(&medicine.funding_source)
            .ok_or("Funding source marker must be a single character")?;
        let producer = single_char(&medicine.producer_code)
            .ok_or("Producer code must be a single character")?;
        let package_type = if bulk {
            let marker = medicine
                .package_type
                .as_deref()
                .ok_or("Medicine has no package type for bulk codes")?;
            Some(single_char(marker).ok_or("Package type must be a single character")?)
        } else {
            None
        };

        Ok(Self {
            year: format!("{:02}", at.year() % 100),
            month: format!("{:02}", at.month()),
            funding_source,
            medicine_type: medicine.medicine_type.code(),
            active_ingredient: medicine.active_ingredient_code.clone(),
            producer,
            package_type,
        })
    }

    /// Canonical storage key for this scope. Identical to the code prefix,
    /// with the package marker dash-separated for bulk scopes.
    pub fn key(&self) -> String {
        let prefix = format!(
            "{}{}{}{}{}{}",
            self.year,
            self.month,
            self.funding_source,
            self.medicine_type,
            self.active_ingredient,
            self.producer
        );
        match self.package_type {
            Some(package_type) => format!("{}-{}", prefix, package_type),
            None => prefix,
        }
    }

    /// Combine this scope with an allocated sequence value into the full
    /// component set of one code.
    pub fn components(&self, sequence: &str) -> CodeComponents {
        CodeComponents {
            year: self.year.clone(),
            month: self.month.clone(),
            funding_source: self.funding_source,
            medicine_type: self.medicine_type,
            active_ingredient: self.active_ingredient.clone(),
            producer: self.producer,
            package_type: self.package_type,
            sequence: sequence.to_string(),
        }
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// A persisted per-scope counter
///
/// `current_sequence` is the last-issued value and only ever moves forward;
/// `total_generated` counts successful allocations regardless of what became
/// of the allocated value downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSequence {
    pub id: Uuid,
    pub scope_key: String,
    pub year: String,
    pub month: String,
    pub funding_source: String,
    pub medicine_type: String,
    pub active_ingredient: String,
    pub producer: String,
    pub package_type: Option<String>,
    pub current_sequence: String,
    pub total_generated: i64,
    pub last_generated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
