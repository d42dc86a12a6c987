//! Medicine master records
//!
//! The subset of the stock master the code engine works against: the fields
//! that feed the code prefix plus packaging and registration details.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::{
    validate_active_ingredient_code, validate_funding_source, validate_medicine_name,
    validate_package_type, validate_producer_code, Medicine, MedicineIdentity, MedicineType,
    Pagination,
};

use crate::error::{AppError, AppResult};
use crate::store::CodeStore;

/// Request to register a medicine master
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMedicineInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub medicine_type: MedicineType,
    pub funding_source: String,
    pub active_ingredient_code: String,
    #[validate(length(min = 1, max = 200))]
    pub active_ingredient_name: String,
    pub producer_code: String,
    #[validate(length(min = 1, max = 200))]
    pub producer_name: String,
    pub package_type: Option<String>,
    pub unit_contents: Decimal,
    #[validate(length(min = 1, max = 20))]
    pub unit_label: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(length(max = 50))]
    pub registration_number: Option<String>,
}

/// Manages the medicine masters codes are generated against
#[derive(Clone)]
pub struct MedicineService {
    store: Arc<dyn CodeStore>,
}

impl MedicineService {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self { store }
    }

    /// Register a medicine master.
    ///
    /// The marker fields must fit the code format, and no other master may
    /// already carry the same code identity, since two masters sharing one
    /// identity would interleave their numbering.
    pub async fn create(&self, input: CreateMedicineInput) -> AppResult<Medicine> {
        check_markers(&input)?;

        let identity = MedicineIdentity {
            funding_source: input.funding_source.clone(),
            medicine_type: input.medicine_type,
            active_ingredient_code: input.active_ingredient_code.clone(),
            producer_code: input.producer_code.clone(),
        };
        if self.store.find_medicine_by_identity(&identity).await?.is_some() {
            return Err(AppError::DuplicateEntry(
                "A medicine with the same code identity already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let medicine = Medicine {
            id: Uuid::new_v4(),
            name: input.name,
            medicine_type: input.medicine_type,
            funding_source: input.funding_source,
            active_ingredient_code: input.active_ingredient_code,
            active_ingredient_name: input.active_ingredient_name,
            producer_code: input.producer_code,
            producer_name: input.producer_name,
            package_type: input.package_type,
            unit_contents: input.unit_contents,
            unit_label: input.unit_label,
            quantity: input.quantity,
            registration_number: input.registration_number,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_medicine(&medicine).await?;

        tracing::info!("Registered medicine {} ({})", medicine.name, medicine.id);
        Ok(medicine)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Medicine> {
        self.store
            .find_medicine(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine".to_string()))
    }

    pub async fn list(&self, pagination: &Pagination) -> AppResult<(Vec<Medicine>, u64)> {
        self.store.list_medicines(pagination).await
    }

    /// Delete a master. Refused while any generated code still references
    /// it, as a conflict distinct from not-found.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let medicine = self.get(id).await?;
        let references = self.store.count_codes_for_medicine(medicine.id).await?;
        if references > 0 {
            return Err(AppError::Conflict {
                resource: "Medicine".to_string(),
                message: format!(
                    "Medicine is referenced by {} generated code(s) and cannot be deleted",
                    references
                ),
                message_id: format!(
                    "Obat masih direferensikan oleh {} kode dan tidak dapat dihapus",
                    references
                ),
            });
        }
        self.store.delete_medicine(medicine.id).await
    }
}

fn check_markers(input: &CreateMedicineInput) -> AppResult<()> {
    let checks = [
        ("name", validate_medicine_name(&input.name)),
        ("funding_source", validate_funding_source(&input.funding_source)),
        (
            "active_ingredient_code",
            validate_active_ingredient_code(&input.active_ingredient_code),
        ),
        ("producer_code", validate_producer_code(&input.producer_code)),
    ];
    for (field, result) in checks {
        if let Err(message) = result {
            return Err(field_error(field, message));
        }
    }
    if let Some(package_type) = &input.package_type {
        validate_package_type(package_type).map_err(|m| field_error("package_type", m))?;
    }
    Ok(())
}

fn field_error(field: &str, message: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
        message_id: format!("Nilai untuk kolom '{}' tidak valid", field),
    }
}
