//! HTTP handlers for scan processing and the audit trail

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::{DateRange, PaginatedResponse, Pagination, PaginationMeta, ScanLogEntry, ScanOutcome, ScanResult};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::scan::ScanInput;
use crate::services::ScanService;
use crate::store::ScanLogFilter;
use crate::AppState;

/// Process one scan attempt and append its audit entry
pub async fn process_scan(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ScanInput>,
) -> AppResult<Json<ScanResult>> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = ScanService::new(state.store.clone());
    let result = service
        .scan(&input.code, current_user.0.user_id, input.purpose, input.context)
        .await?;
    Ok(Json(result))
}

/// Query parameters for the scan-log listing and export
#[derive(Debug, Deserialize)]
pub struct ScanLogsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub code: Option<String>,
    pub outcome: Option<String>,
    pub scanned_by: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// List scan-log entries with optional filters
pub async fn list_scan_logs(
    State(state): State<AppState>,
    Query(query): Query<ScanLogsQuery>,
) -> AppResult<Json<PaginatedResponse<ScanLogEntry>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let filter = build_filter(query)?;

    let service = ScanService::new(state.store.clone());
    let (entries, total) = service.logs(&filter, &pagination).await?;

    Ok(Json(PaginatedResponse {
        data: entries,
        pagination: PaginationMeta::new(&pagination, total),
    }))
}

/// Export the filtered audit trail as CSV
pub async fn export_scan_logs(
    State(state): State<AppState>,
    Query(query): Query<ScanLogsQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = build_filter(query)?;

    let service = ScanService::new(state.store.clone());
    let csv_data = service.export_logs(&filter).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"scan_logs.csv\"",
            ),
        ],
        csv_data,
    )
        .into_response())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Translate query parameters into a scan-log filter
fn build_filter(query: ScanLogsQuery) -> AppResult<ScanLogFilter> {
    let range = if query.start_date.is_some() || query.end_date.is_some() {
        let start = query
            .start_date
            .unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let end = query
            .end_date
            .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());
        Some(DateRange { start, end })
    } else {
        None
    };

    Ok(ScanLogFilter {
        code: query.code,
        outcome: query.outcome.as_deref().map(parse_outcome).transpose()?,
        scanned_by: query.scanned_by,
        range,
    })
}

/// Parse a scan outcome from its query-string form
fn parse_outcome(s: &str) -> AppResult<ScanOutcome> {
    ScanOutcome::from_str(s).ok_or_else(|| AppError::Validation {
        field: "outcome".to_string(),
        message: format!("Invalid scan outcome: {}", s),
        message_id: format!("Hasil pindai tidak valid: {}", s),
    })
}
