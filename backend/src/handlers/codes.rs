//! HTTP handlers for code generation and lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::{
    CodeStatus, CodeValidation, GeneratedCode, GenerationReport, PaginatedResponse, Pagination,
    PaginationMeta,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, require_generate_role};
use crate::middleware::CurrentUser;
use crate::services::codes::{CodeLookup, UpdateCodeStatusInput};
use crate::services::generation::{BulkGenerateInput, GenerateCodesInput};
use crate::services::{CodeService, GenerationService, SequenceService};
use crate::store::CodeFilter;
use crate::AppState;

// ============================================================================
// Generation
// ============================================================================

/// Generate identifier codes for a medicine
pub async fn generate_codes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<GenerateCodesInput>,
) -> AppResult<Json<GenerationReport>> {
    require_generate_role(&current_user.0)?;
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = generation_service(&state);
    let report = service.generate(&input, current_user.0.user_id).await?;
    Ok(Json(report))
}

/// Generate a bulk-package family: unit codes plus bulk package codes
pub async fn bulk_generate_codes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkGenerateInput>,
) -> AppResult<Json<GenerationReport>> {
    require_generate_role(&current_user.0)?;
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = generation_service(&state);
    let report = service.bulk_generate(&input, current_user.0.user_id).await?;
    Ok(Json(report))
}

// ============================================================================
// Listing and lookup
// ============================================================================

/// Query parameters for listing generated codes
#[derive(Debug, Deserialize)]
pub struct ListCodesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub medicine_id: Option<Uuid>,
    pub status: Option<String>,
    pub is_bulk: Option<bool>,
}

/// List generated codes with optional filters
pub async fn list_codes(
    State(state): State<AppState>,
    Query(query): Query<ListCodesQuery>,
) -> AppResult<Json<PaginatedResponse<GeneratedCode>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let filter = CodeFilter {
        medicine_id: query.medicine_id,
        status: query.status.as_deref().map(parse_status).transpose()?,
        is_bulk: query.is_bulk,
    };

    let service = CodeService::new(state.store.clone());
    let (codes, total) = service.list(&filter, &pagination).await?;

    Ok(Json(PaginatedResponse {
        data: codes,
        pagination: PaginationMeta::new(&pagination, total),
    }))
}

/// Get a generated code by ID
pub async fn get_code(
    State(state): State<AppState>,
    Path(code_id): Path<Uuid>,
) -> AppResult<Json<GeneratedCode>> {
    let service = CodeService::new(state.store.clone());
    let code = service.get(code_id).await?;
    Ok(Json(code))
}

/// Look up a generated code by its code string
pub async fn lookup_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<CodeLookup>> {
    let service = CodeService::new(state.store.clone());
    let lookup = service.lookup(&code).await?;
    Ok(Json(lookup))
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Move a code through its status lifecycle
pub async fn update_code_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(code_id): Path<Uuid>,
    Json(input): Json<UpdateCodeStatusInput>,
) -> AppResult<Json<GeneratedCode>> {
    require_generate_role(&current_user.0)?;

    let service = CodeService::new(state.store.clone());
    let code = service.update_status(code_id, input.status).await?;
    Ok(Json(code))
}

/// Delete a code that has never been scanned
pub async fn delete_code(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(code_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    require_admin(&current_user.0)?;

    let service = CodeService::new(state.store.clone());
    service.delete(code_id).await?;
    Ok(Json(()))
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a candidate code string without touching storage
///
/// Public endpoint so offline-capable scanner clients can fall back to it.
pub async fn validate_code(Path(code): Path<String>) -> Json<CodeValidation> {
    Json(shared::validate_code(&code))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Build the generation service with its sequence allocator and renderer
fn generation_service(state: &AppState) -> GenerationService {
    let sequences = SequenceService::new(
        state.store.clone(),
        state.config.generation.allocation_retries,
    );
    GenerationService::new(
        state.store.clone(),
        state.renderer.clone(),
        sequences,
        state.config.generation.max_quantity,
    )
}

/// Parse a code status from its query-string form
fn parse_status(s: &str) -> AppResult<CodeStatus> {
    CodeStatus::from_str(s).ok_or_else(|| AppError::Validation {
        field: "status".to_string(),
        message: format!("Invalid code status: {}", s),
        message_id: format!("Status kode tidak valid: {}", s),
    })
}
