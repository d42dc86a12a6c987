//! HTTP handlers for medicine master endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::{Medicine, PaginatedResponse, Pagination, PaginationMeta};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, require_generate_role};
use crate::middleware::CurrentUser;
use crate::services::medicine::CreateMedicineInput;
use crate::services::MedicineService;
use crate::AppState;

/// Query parameters for listing medicines
#[derive(Debug, Deserialize)]
pub struct ListMedicinesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List medicine masters
pub async fn list_medicines(
    State(state): State<AppState>,
    Query(query): Query<ListMedicinesQuery>,
) -> AppResult<Json<PaginatedResponse<Medicine>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };

    let service = MedicineService::new(state.store.clone());
    let (medicines, total) = service.list(&pagination).await?;

    Ok(Json(PaginatedResponse {
        data: medicines,
        pagination: PaginationMeta::new(&pagination, total),
    }))
}

/// Register a new medicine master
pub async fn create_medicine(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMedicineInput>,
) -> AppResult<Json<Medicine>> {
    require_generate_role(&current_user.0)?;
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = MedicineService::new(state.store.clone());
    let medicine = service.create(input).await?;
    Ok(Json(medicine))
}

/// Get a medicine master by ID
pub async fn get_medicine(
    State(state): State<AppState>,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<Json<Medicine>> {
    let service = MedicineService::new(state.store.clone());
    let medicine = service.get(medicine_id).await?;
    Ok(Json(medicine))
}

/// Delete a medicine master that no generated code references
pub async fn delete_medicine(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(medicine_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    require_admin(&current_user.0)?;

    let service = MedicineService::new(state.store.clone());
    service.delete(medicine_id).await?;
    Ok(Json(()))
}
