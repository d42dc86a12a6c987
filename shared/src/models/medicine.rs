//! Pesticide medicine master data

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::code::CodeComponents;

/// Category of a pesticide product; one letter inside every code
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MedicineType {
    Fungicide,
    Insecticide,
    Herbicide,
    Bactericide,
}

impl MedicineType {
    /// The single-character marker used inside code strings.
    pub fn code(&self) -> char {
        match self {
            MedicineType::Fungicide => 'F',
            MedicineType::Insecticide => 'I',
            MedicineType::Herbicide => 'H',
            MedicineType::Bactericide => 'B',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'F' => Some(MedicineType::Fungicide),
            'I' => Some(MedicineType::Insecticide),
            'H' => Some(MedicineType::Herbicide),
            'B' => Some(MedicineType::Bactericide),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MedicineType::Fungicide => "fungicide",
            MedicineType::Insecticide => "insecticide",
            MedicineType::Herbicide => "herbicide",
            MedicineType::Bactericide => "bactericide",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fungicide" => Some(MedicineType::Fungicide),
            "insecticide" => Some(MedicineType::Insecticide),
            "herbicide" => Some(MedicineType::Herbicide),
            "bactericide" => Some(MedicineType::Bactericide),
            _ => None,
        }
    }
}

impl std::fmt::Display for MedicineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MedicineType::Fungicide => write!(f, "Fungicide"),
            MedicineType::Insecticide => write!(f, "Insecticide"),
            MedicineType::Herbicide => write!(f, "Herbicide"),
            MedicineType::Bactericide => write!(f, "Bactericide"),
        }
    }
}

/// A registered pesticide product whose stock is tracked by codes
///
/// The one-character marker fields are validated to width on creation; they
/// feed directly into code prefixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub medicine_type: MedicineType,
    /// Funding source marker, e.g. "A" for APBN budget stock
    pub funding_source: String,
    /// Three-digit active-ingredient code
    pub active_ingredient_code: String,
    pub active_ingredient_name: String,
    /// Single uppercase producer letter
    pub producer_code: String,
    pub producer_name: String,
    /// Package-type marker printed on this product's bulk codes
    pub package_type: Option<String>,
    /// Contents of one unit package
    pub unit_contents: Decimal,
    /// Unit of measure for `unit_contents`, e.g. "ml"
    pub unit_label: String,
    /// Stock on hand, in unit packages
    pub quantity: i32,
    pub registration_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The marker fields that tie a code prefix back to one master record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineIdentity {
    pub funding_source: String,
    pub medicine_type: MedicineType,
    pub active_ingredient_code: String,
    pub producer_code: String,
}

impl MedicineIdentity {
    /// Recover the identity encoded in parsed components. `None` when the
    /// medicine-type marker is not one of the known letters.
    pub fn from_components(components: &CodeComponents) -> Option<Self> {
        Some(Self {
            funding_source: components.funding_source.to_string(),
            medicine_type: MedicineType::from_code(components.medicine_type)?,
            active_ingredient_code: components.active_ingredient.clone(),
            producer_code: components.producer.to_string(),
        })
    }
}

impl Medicine {
    pub fn identity(&self) -> MedicineIdentity {
        MedicineIdentity {
            funding_source: self.funding_source.clone(),
            medicine_type: self.medicine_type,
            active_ingredient_code: self.active_ingredient_code.clone(),
            producer_code: self.producer_code.clone(),
        }
    }
}
