//! Reporting service for generation statistics and data export

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::store::{CodeStore, GenerationStat};

/// Aggregated reporting over the generated-code records
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn CodeStore>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self { store }
    }

    /// Per-month generation and scan counts grouped by medicine type.
    pub async fn generation_statistics(&self) -> AppResult<Vec<GenerationStat>> {
        self.store.generation_statistics().await
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
