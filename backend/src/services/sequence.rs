//! Sequence allocation against the persisted per-scope counters

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shared::{next_sequence_value, CodeSequence, SequenceError, SequenceScope, INITIAL_SEQUENCE};

use crate::error::{AppError, AppResult};
use crate::store::CodeStore;

/// Issues sequence values, one counter per scope tuple
#[derive(Clone)]
pub struct SequenceService {
    store: Arc<dyn CodeStore>,
    allocation_retries: u32,
}

impl SequenceService {
    pub fn new(store: Arc<dyn CodeStore>, allocation_retries: u32) -> Self {
        Self {
            store,
            allocation_retries,
        }
    }

    /// Fetch the counter for `scope`, creating it at the sentinel value on
    /// first use within the period.
    pub async fn get_or_create(&self, scope: &SequenceScope) -> AppResult<CodeSequence> {
        let key = scope.key();
        if let Some(existing) = self.store.find_sequence(&key).await? {
            return Ok(existing);
        }

        let candidate = CodeSequence {
            id: Uuid::new_v4(),
            scope_key: key.clone(),
            year: scope.year.clone(),
            month: scope.month.clone(),
            funding_source: scope.funding_source.to_string(),
            medicine_type: scope.medicine_type.to_string(),
            active_ingredient: scope.active_ingredient.clone(),
            producer: scope.producer.to_string(),
            package_type: scope.package_type.map(|c| c.to_string()),
            current_sequence: INITIAL_SEQUENCE.to_string(),
            total_generated: 0,
            last_generated: None,
            created_at: Utc::now(),
        };
        self.store.insert_sequence(&candidate).await?;

        // Two first uses can race; whichever insert landed is the counter
        // everyone continues with.
        self.store
            .find_sequence(&key)
            .await?
            .ok_or_else(|| AppError::Internal(format!("sequence {} vanished after creation", key)))
    }

    /// Issue the next value for the scope, persisting the advance before
    /// returning. Every successful call moves the counter exactly one step
    /// and bumps its allocation total, whatever becomes of the value
    /// downstream.
    pub async fn allocate_next(&self, scope_key: &str) -> AppResult<String> {
        for _ in 0..self.allocation_retries {
            let sequence = self
                .store
                .find_sequence(scope_key)
                .await?
                .ok_or_else(|| AppError::NotFound("Sequence".to_string()))?;

            let next = next_sequence_value(&sequence.current_sequence).map_err(|e| match e {
                SequenceError::Exhausted(_) => AppError::SequenceExhausted(scope_key.to_string()),
                SequenceError::Unrecognized(value) => AppError::Internal(format!(
                    "counter for scope {} holds unrecognizable value '{}'",
                    scope_key, value
                )),
            })?;

            if self
                .store
                .advance_sequence(sequence.id, &sequence.current_sequence, &next, Utc::now())
                .await?
            {
                return Ok(next);
            }
            // Another allocation advanced the counter first; re-read and retry.
        }

        Err(AppError::Conflict {
            resource: "Sequence".to_string(),
            message: format!(
                "Could not allocate a sequence value for scope {} after {} attempts",
                scope_key, self.allocation_retries
            ),
            message_id: format!(
                "Gagal mengalokasikan nomor urut untuk lingkup {} setelah {} percobaan",
                scope_key, self.allocation_retries
            ),
        })
    }
}
