//! Scan outcomes and the append-only audit log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::code::GeneratedCode;

/// Declared reason for a scan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanPurpose {
    Verification,
    Distribution,
    StockCheck,
    Disposal,
}

impl ScanPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPurpose::Verification => "verification",
            ScanPurpose::Distribution => "distribution",
            ScanPurpose::StockCheck => "stock_check",
            ScanPurpose::Disposal => "disposal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "verification" => Some(ScanPurpose::Verification),
            "distribution" => Some(ScanPurpose::Distribution),
            "stock_check" => Some(ScanPurpose::StockCheck),
            "disposal" => Some(ScanPurpose::Disposal),
            _ => None,
        }
    }
}

/// How a scan attempt resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    Success,
    NotFound,
    Expired,
    InvalidFormat,
}

impl ScanOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanOutcome::Success => "success",
            ScanOutcome::NotFound => "not_found",
            ScanOutcome::Expired => "expired",
            ScanOutcome::InvalidFormat => "invalid_format",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(ScanOutcome::Success),
            "not_found" => Some(ScanOutcome::NotFound),
            "expired" => Some(ScanOutcome::Expired),
            "invalid_format" => Some(ScanOutcome::InvalidFormat),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied context recorded alongside a scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanContext {
    pub location: Option<String>,
    pub device: Option<String>,
    pub note: Option<String>,
}

/// One scan attempt, successful or not
///
/// Written on every attempt, including unparseable strings and lookups
/// that matched nothing, and never updated afterwards. This is the audit
/// evidence for field inspections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogEntry {
    pub id: Uuid,
    /// The exact string presented to the scanner
    pub code: String,
    /// Resolved code record, when one was found
    pub code_id: Option<Uuid>,
    pub scanned_by: Uuid,
    pub purpose: ScanPurpose,
    pub outcome: ScanOutcome,
    pub location: Option<String>,
    pub device: Option<String>,
    pub note: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

/// Result returned to the scanning client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub success: bool,
    pub outcome: ScanOutcome,
    pub message: String,
    /// The matched code on the success path
    pub code: Option<GeneratedCode>,
    pub scan_log: ScanLogEntry,
}
