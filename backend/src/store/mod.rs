//! Storage abstraction for masters, sequences, codes, and scan logs
//!
//! All stateful services talk to storage through [`CodeStore`], so the
//! production PostgreSQL backend and the in-memory backend used by tests
//! are interchangeable.

mod memory;
mod postgres;

pub use memory::MemoryCodeStore;
pub use postgres::PgCodeStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use shared::{
    CodeSequence, CodeStatus, DateRange, GeneratedCode, Medicine, MedicineIdentity, Pagination,
    ScanLogEntry, ScanOutcome,
};

use crate::error::AppResult;

/// Filters for listing generated codes
#[derive(Debug, Clone, Default)]
pub struct CodeFilter {
    pub medicine_id: Option<Uuid>,
    pub status: Option<CodeStatus>,
    pub is_bulk: Option<bool>,
}

/// Filters for listing scan-log entries
#[derive(Debug, Clone, Default)]
pub struct ScanLogFilter {
    pub code: Option<String>,
    pub outcome: Option<ScanOutcome>,
    pub scanned_by: Option<Uuid>,
    pub range: Option<DateRange>,
}

/// One row of the per-month generation statistics
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationStat {
    /// Two-digit year as encoded in the codes
    pub year: String,
    /// Two-digit month as encoded in the codes
    pub month: String,
    pub medicine_type: String,
    pub unit_codes: i64,
    pub bulk_codes: i64,
    pub total_scans: i64,
}

/// Storage operations the code engine depends on
///
/// Implementations must make [`advance_sequence`](CodeStore::advance_sequence)
/// atomic: of two concurrent calls carrying the same `expected` value,
/// exactly one may succeed. Everything else is plain row access.
#[async_trait]
pub trait CodeStore: Send + Sync {
    // ==== Medicine masters ====

    async fn insert_medicine(&self, medicine: &Medicine) -> AppResult<()>;

    async fn find_medicine(&self, id: Uuid) -> AppResult<Option<Medicine>>;

    /// Look up a master by the marker fields its codes carry.
    async fn find_medicine_by_identity(
        &self,
        identity: &MedicineIdentity,
    ) -> AppResult<Option<Medicine>>;

    async fn list_medicines(&self, pagination: &Pagination)
        -> AppResult<(Vec<Medicine>, u64)>;

    async fn delete_medicine(&self, id: Uuid) -> AppResult<()>;

    /// How many generated codes reference this master, scanned or not.
    async fn count_codes_for_medicine(&self, medicine_id: Uuid) -> AppResult<i64>;

    // ==== Sequences ====

    async fn find_sequence(&self, scope_key: &str) -> AppResult<Option<CodeSequence>>;

    /// Insert a fresh counter unless one already exists for its scope key.
    /// Callers re-read afterwards; under a creation race the first writer
    /// wins and the loser silently keeps the existing row.
    async fn insert_sequence(&self, sequence: &CodeSequence) -> AppResult<()>;

    /// Compare-and-swap the counter forward. Returns `false` when
    /// `expected` no longer matches, i.e. another allocation got there
    /// first. A successful swap also bumps `total_generated` and
    /// `last_generated`.
    async fn advance_sequence(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    // ==== Generated codes ====

    async fn insert_code(&self, code: &GeneratedCode) -> AppResult<()>;

    async fn find_code(&self, id: Uuid) -> AppResult<Option<GeneratedCode>>;

    async fn find_code_by_string(&self, code: &str) -> AppResult<Option<GeneratedCode>>;

    async fn list_codes(
        &self,
        filter: &CodeFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<GeneratedCode>, u64)>;

    async fn update_code_status(&self, id: Uuid, status: CodeStatus) -> AppResult<()>;

    /// Bump the scan counter and last-scanned metadata of a code.
    async fn record_scan(&self, id: Uuid, scanned_by: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    async fn delete_code(&self, id: Uuid) -> AppResult<()>;

    /// Codes and scans grouped per encoded year/month and medicine type.
    async fn generation_statistics(&self) -> AppResult<Vec<GenerationStat>>;

    // ==== Scan logs ====

    /// Append one audit entry. There is deliberately no update or delete
    /// counterpart.
    async fn append_scan_log(&self, entry: &ScanLogEntry) -> AppResult<()>;

    async fn list_scan_logs(
        &self,
        filter: &ScanLogFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<ScanLogEntry>, u64)>;

    // ==== Health ====

    async fn ping(&self) -> AppResult<()>;
}
