//! Generated code records and generation reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::code::CodeComponents;

/// Lifecycle status of an issued code
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Generated,
    Distributed,
    Expired,
}

impl CodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Generated => "generated",
            CodeStatus::Distributed => "distributed",
            CodeStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "generated" => Some(CodeStatus::Generated),
            "distributed" => Some(CodeStatus::Distributed),
            "expired" => Some(CodeStatus::Expired),
            _ => None,
        }
    }

    /// Whether this status may move to `next`. Expiry is terminal.
    pub fn can_transition_to(&self, next: CodeStatus) -> bool {
        matches!(
            (self, next),
            (CodeStatus::Generated, CodeStatus::Distributed)
                | (CodeStatus::Generated, CodeStatus::Expired)
                | (CodeStatus::Distributed, CodeStatus::Expired)
        )
    }
}

impl std::fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeStatus::Generated => write!(f, "Generated"),
            CodeStatus::Distributed => write!(f, "Distributed"),
            CodeStatus::Expired => write!(f, "Expired"),
        }
    }
}

/// One issued code with its image, components, and scan statistics
///
/// Created by generation; after that only status and the scan counters ever
/// change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub id: Uuid,
    /// The full textual code, unique across the system
    pub code: String,
    pub medicine_id: Uuid,
    pub is_bulk: bool,
    pub components: CodeComponents,
    /// Rendered QR image as a data URL, absent if rendering failed later
    pub image_data: Option<String>,
    pub batch_info: Option<String>,
    pub notes: Option<String>,
    pub status: CodeStatus,
    pub generated_by: Uuid,
    pub scanned_count: i64,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub last_scanned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One failed iteration inside a generation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationFailure {
    /// 1-based position within the requested quantity
    pub index: u32,
    pub message: String,
}

/// Aggregated outcome of a generation run
///
/// Partial success is the normal completion mode: failed iterations are
/// listed here instead of aborting their siblings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationReport {
    pub generated: u32,
    pub failed: u32,
    pub codes: Vec<GeneratedCode>,
    pub errors: Vec<GenerationFailure>,
}

impl GenerationReport {
    /// Fold another report into this one. Indexes are kept as issued by
    /// each run, so a combined report can carry one entry per family for
    /// the same position.
    pub fn merge(&mut self, other: GenerationReport) {
        self.generated += other.generated;
        self.failed += other.failed;
        self.codes.extend(other.codes);
        self.errors.extend(other.errors);
    }
}
