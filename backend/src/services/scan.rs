//! Scan Processor
//!
//! Classifies a presented code string and records the attempt. Every call
//! appends exactly one scan-log entry, whichever way it resolves; the code's
//! counters move only on the success branch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::{
    validate_code, CodeStatus, Pagination, ScanContext, ScanLogEntry, ScanOutcome, ScanPurpose,
    ScanResult,
};

use crate::error::{AppError, AppResult};
use crate::store::{CodeStore, ScanLogFilter};

use super::ReportingService;

/// Scan-log exports are bounded rather than streamed.
const EXPORT_ROW_CAP: u32 = 100_000;

/// One scan attempt from a device
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScanInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub purpose: ScanPurpose,
    #[serde(default)]
    pub context: ScanContext,
}

/// Processes scans and serves the audit trail
#[derive(Clone)]
pub struct ScanService {
    store: Arc<dyn CodeStore>,
}

impl ScanService {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self { store }
    }

    /// Resolve one scan attempt.
    ///
    /// Outcomes, in the order they are ruled out: INVALID_FORMAT for a
    /// string the validator rejects, NOT_FOUND for a well-formed string
    /// matching no record, EXPIRED for a code past its life (left untouched),
    /// SUCCESS otherwise, with counters updated.
    pub async fn scan(
        &self,
        code: &str,
        actor: Uuid,
        purpose: ScanPurpose,
        context: ScanContext,
    ) -> AppResult<ScanResult> {
        let now = Utc::now();

        let validation = validate_code(code);
        if !validation.is_valid {
            let scan_log = self
                .log(code, None, actor, purpose, ScanOutcome::InvalidFormat, &context, now)
                .await?;
            return Ok(ScanResult {
                success: false,
                outcome: ScanOutcome::InvalidFormat,
                message: validation.errors.join("; "),
                code: None,
                scan_log,
            });
        }

        let Some(found) = self.store.find_code_by_string(code).await? else {
            let scan_log = self
                .log(code, None, actor, purpose, ScanOutcome::NotFound, &context, now)
                .await?;
            return Ok(ScanResult {
                success: false,
                outcome: ScanOutcome::NotFound,
                message: "Code is not registered".to_string(),
                code: None,
                scan_log,
            });
        };

        if found.status == CodeStatus::Expired {
            let scan_log = self
                .log(code, Some(found.id), actor, purpose, ScanOutcome::Expired, &context, now)
                .await?;
            return Ok(ScanResult {
                success: false,
                outcome: ScanOutcome::Expired,
                message: "Code has expired".to_string(),
                code: None,
                scan_log,
            });
        }

        self.store.record_scan(found.id, actor, now).await?;
        let scan_log = self
            .log(code, Some(found.id), actor, purpose, ScanOutcome::Success, &context, now)
            .await?;
        let refreshed = self
            .store
            .find_code(found.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Code".to_string()))?;

        Ok(ScanResult {
            success: true,
            outcome: ScanOutcome::Success,
            message: "Scan recorded".to_string(),
            code: Some(refreshed),
            scan_log,
        })
    }

    /// Query the audit trail.
    pub async fn logs(
        &self,
        filter: &ScanLogFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<ScanLogEntry>, u64)> {
        self.store.list_scan_logs(filter, pagination).await
    }

    /// Export the audit trail as CSV.
    pub async fn export_logs(&self, filter: &ScanLogFilter) -> AppResult<String> {
        let (entries, total) = self
            .store
            .list_scan_logs(
                filter,
                &Pagination {
                    page: 1,
                    per_page: EXPORT_ROW_CAP,
                },
            )
            .await?;
        if total > u64::from(EXPORT_ROW_CAP) {
            tracing::warn!(
                "Scan-log export truncated to {} of {} matching entries",
                EXPORT_ROW_CAP,
                total
            );
        }
        ReportingService::export_to_csv(&entries)
    }

    async fn log(
        &self,
        code: &str,
        code_id: Option<Uuid>,
        actor: Uuid,
        purpose: ScanPurpose,
        outcome: ScanOutcome,
        context: &ScanContext,
        at: DateTime<Utc>,
    ) -> AppResult<ScanLogEntry> {
        let entry = ScanLogEntry {
            id: Uuid::new_v4(),
            code: code.to_string(),
            code_id,
            scanned_by: actor,
            purpose,
            outcome,
            location: context.location.clone(),
            device: context.device.clone(),
            note: context.note.clone(),
            scanned_at: at,
        };
        self.store.append_scan_log(&entry).await?;
        Ok(entry)
    }
}
