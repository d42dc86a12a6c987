//! Generation Orchestrator
//!
//! Drives unit and bulk-package code generation against a medicine master:
//! allocate a sequence value, encode the code, render its image, persist the
//! record. Each iteration fails independently; a run reports partial success
//! instead of aborting on the first bad item.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::{
    CodeStatus, GeneratedCode, GenerationFailure, GenerationReport, SequenceScope,
};

use crate::error::{AppError, AppResult};
use crate::external::CodeRenderer;
use crate::store::CodeStore;

use super::SequenceService;

/// Request for one generation run
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateCodesInput {
    pub medicine_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[serde(default)]
    pub is_bulk: bool,
    #[validate(length(max = 100))]
    pub batch_info: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Request for a bulk-package run covering `total_quantity` items
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkGenerateInput {
    pub medicine_id: Uuid,
    #[validate(range(min = 1))]
    pub total_quantity: u32,
    #[validate(range(min = 1))]
    pub bulk_package_size: u32,
    #[validate(length(max = 100))]
    pub batch_info: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Orchestrates code generation runs
#[derive(Clone)]
pub struct GenerationService {
    store: Arc<dyn CodeStore>,
    renderer: Arc<dyn CodeRenderer>,
    sequences: SequenceService,
    max_quantity: u32,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn CodeStore>,
        renderer: Arc<dyn CodeRenderer>,
        sequences: SequenceService,
        max_quantity: u32,
    ) -> Self {
        Self {
            store,
            renderer,
            sequences,
            max_quantity,
        }
    }

    /// Generate `quantity` codes for one medicine, unit or bulk-package.
    ///
    /// A missing medicine fails the whole call. After that, every iteration
    /// is caught on its own: the failure lands in the report with its
    /// 1-based index and the remaining iterations still run. An allocation
    /// that succeeded stays spent even when rendering or persisting the
    /// same item fails afterwards.
    pub async fn generate(
        &self,
        input: &GenerateCodesInput,
        actor: Uuid,
    ) -> AppResult<GenerationReport> {
        self.check_quantity(input.quantity)?;

        let medicine = self
            .store
            .find_medicine(input.medicine_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        let now = Utc::now();
        let scope = SequenceScope::for_medicine(&medicine, now, input.is_bulk)
            .map_err(|message| field_error("medicine", message))?;
        self.sequences.get_or_create(&scope).await?;
        let scope_key = scope.key();

        let mut report = GenerationReport::default();
        for index in 1..=input.quantity {
            match self.generate_one(&scope, &scope_key, input, actor, now).await {
                Ok(code) => {
                    report.generated += 1;
                    report.codes.push(code);
                }
                Err(e) => {
                    tracing::warn!(
                        "Generation item {} of {} failed for scope {}: {}",
                        index,
                        input.quantity,
                        scope_key,
                        e
                    );
                    report.failed += 1;
                    report.errors.push(GenerationFailure {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Generated {}/{} codes for scope {} ({} failed)",
            report.generated,
            input.quantity,
            scope_key,
            report.failed
        );
        Ok(report)
    }

    /// Generate codes for a bulk batch: one unit code per item plus one
    /// bulk-package code per `bulk_package_size` items, rounded up. Both
    /// families share the batch metadata and land in one combined report,
    /// each keeping its own 1-based failure indexes.
    pub async fn bulk_generate(
        &self,
        input: &BulkGenerateInput,
        actor: Uuid,
    ) -> AppResult<GenerationReport> {
        self.check_quantity(input.total_quantity)?;
        if input.bulk_package_size == 0 {
            return Err(field_error(
                "bulk_package_size",
                "Bulk package size must be at least 1",
            ));
        }

        // Refuse up front if the master cannot scope bulk codes at all, so
        // the unit family is not issued for a request that can never finish.
        let medicine = self
            .store
            .find_medicine(input.medicine_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;
        SequenceScope::for_medicine(&medicine, Utc::now(), true)
            .map_err(|message| field_error("medicine", message))?;

        let package_count = input.total_quantity.div_ceil(input.bulk_package_size);

        let unit_input = GenerateCodesInput {
            medicine_id: input.medicine_id,
            quantity: input.total_quantity,
            is_bulk: false,
            batch_info: input.batch_info.clone(),
            notes: input.notes.clone(),
        };
        let mut report = self.generate(&unit_input, actor).await?;

        let bulk_input = GenerateCodesInput {
            medicine_id: input.medicine_id,
            quantity: package_count,
            is_bulk: true,
            batch_info: input.batch_info.clone(),
            notes: input.notes.clone(),
        };
        report.merge(self.generate(&bulk_input, actor).await?);

        Ok(report)
    }

    async fn generate_one(
        &self,
        scope: &SequenceScope,
        scope_key: &str,
        input: &GenerateCodesInput,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<GeneratedCode> {
        let value = self.sequences.allocate_next(scope_key).await?;
        let components = scope.components(&value);
        let code = components.encode();

        // The allocation above is already persisted; a render failure from
        // here on costs the value but never rewinds the counter.
        let image_data = self.renderer.render(&code).await?;

        let record = GeneratedCode {
            id: Uuid::new_v4(),
            code,
            medicine_id: input.medicine_id,
            is_bulk: components.is_bulk(),
            components,
            image_data: Some(image_data),
            batch_info: input.batch_info.clone(),
            notes: input.notes.clone(),
            status: CodeStatus::Generated,
            generated_by: actor,
            scanned_count: 0,
            last_scanned_at: None,
            last_scanned_by: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_code(&record).await?;
        Ok(record)
    }

    fn check_quantity(&self, quantity: u32) -> AppResult<()> {
        if quantity == 0 || quantity > self.max_quantity {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: format!("Quantity must be between 1 and {}", self.max_quantity),
                message_id: format!("Jumlah harus antara 1 dan {}", self.max_quantity),
            });
        }
        Ok(())
    }
}

fn field_error(field: &str, message: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
        message_id: format!("Nilai untuk kolom '{}' tidak valid", field),
    }
}
