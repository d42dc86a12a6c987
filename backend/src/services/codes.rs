//! Generated-code queries and lifecycle

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{CodeStatus, GeneratedCode, Medicine, Pagination};

use crate::error::{AppError, AppResult};
use crate::store::{CodeFilter, CodeStore};

/// Request to move a code to a new lifecycle status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCodeStatusInput {
    pub status: CodeStatus,
}

/// A code resolved by its string, with the master it belongs to
#[derive(Debug, Serialize)]
pub struct CodeLookup {
    pub code: GeneratedCode,
    pub medicine: Option<Medicine>,
}

/// Read and lifecycle operations on issued codes
#[derive(Clone)]
pub struct CodeService {
    store: Arc<dyn CodeStore>,
}

impl CodeService {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: &CodeFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<GeneratedCode>, u64)> {
        self.store.list_codes(filter, pagination).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<GeneratedCode> {
        self.store
            .find_code(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Code".to_string()))
    }

    /// Resolve a code by its exact string, joined with its medicine master.
    pub async fn lookup(&self, code: &str) -> AppResult<CodeLookup> {
        let code = self
            .store
            .find_code_by_string(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Code".to_string()))?;
        let medicine = self.store.find_medicine(code.medicine_id).await?;
        Ok(CodeLookup { code, medicine })
    }

    /// Move a code along its lifecycle. Expiry is terminal and nothing moves
    /// backwards.
    pub async fn update_status(&self, id: Uuid, status: CodeStatus) -> AppResult<GeneratedCode> {
        let code = self.get(id).await?;
        if !code.status.can_transition_to(status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot move code from {} to {}",
                code.status, status
            )));
        }
        self.store.update_code_status(id, status).await?;
        self.get(id).await
    }

    /// Delete a code. Refused once it has ever been scanned: the scan trail
    /// must keep pointing at a real record.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let code = self.get(id).await?;
        if code.scanned_count > 0 {
            return Err(AppError::Conflict {
                resource: "Code".to_string(),
                message: format!(
                    "Code has been scanned {} time(s) and cannot be deleted",
                    code.scanned_count
                ),
                message_id: format!(
                    "Kode telah dipindai {} kali dan tidak dapat dihapus",
                    code.scanned_count
                ),
            });
        }
        self.store.delete_code(id).await
    }
}
