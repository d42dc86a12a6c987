//! In-memory [`CodeStore`] for tests and local development

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared::{
    CodeSequence, CodeStatus, GeneratedCode, Medicine, MedicineIdentity, Pagination, ScanLogEntry,
};

use crate::error::{AppError, AppResult};

use super::{CodeFilter, CodeStore, GenerationStat, ScanLogFilter};

#[derive(Default)]
struct Inner {
    medicines: HashMap<Uuid, Medicine>,
    sequences: HashMap<Uuid, CodeSequence>,
    sequences_by_scope: HashMap<String, Uuid>,
    codes: HashMap<Uuid, GeneratedCode>,
    codes_by_string: HashMap<String, Uuid>,
    scan_logs: Vec<ScanLogEntry>,
}

/// Storage backed by process memory, mirroring the PostgreSQL semantics
#[derive(Default)]
pub struct MemoryCodeStore {
    inner: Mutex<Inner>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::StorageError("code store mutex poisoned".to_string()))
    }
}

fn paginate<T>(items: Vec<T>, pagination: &Pagination) -> Vec<T> {
    items
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.per_page as usize)
        .collect()
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    // ==== Medicine masters ====

    async fn insert_medicine(&self, medicine: &Medicine) -> AppResult<()> {
        let mut inner = self.lock()?;
        inner.medicines.insert(medicine.id, medicine.clone());
        Ok(())
    }

    async fn find_medicine(&self, id: Uuid) -> AppResult<Option<Medicine>> {
        let inner = self.lock()?;
        Ok(inner.medicines.get(&id).cloned())
    }

    async fn find_medicine_by_identity(
        &self,
        identity: &MedicineIdentity,
    ) -> AppResult<Option<Medicine>> {
        let inner = self.lock()?;
        Ok(inner
            .medicines
            .values()
            .find(|m| {
                m.funding_source == identity.funding_source
                    && m.medicine_type == identity.medicine_type
                    && m.active_ingredient_code == identity.active_ingredient_code
                    && m.producer_code == identity.producer_code
            })
            .cloned())
    }

    async fn list_medicines(
        &self,
        pagination: &Pagination,
    ) -> AppResult<(Vec<Medicine>, u64)> {
        let inner = self.lock()?;
        let mut medicines: Vec<Medicine> = inner.medicines.values().cloned().collect();
        medicines.sort_by(|a, b| a.name.cmp(&b.name));
        let total = medicines.len() as u64;
        Ok((paginate(medicines, pagination), total))
    }

    async fn delete_medicine(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.lock()?;
        inner
            .medicines
            .remove(&id)
            .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;
        Ok(())
    }

    async fn count_codes_for_medicine(&self, medicine_id: Uuid) -> AppResult<i64> {
        let inner = self.lock()?;
        Ok(inner
            .codes
            .values()
            .filter(|c| c.medicine_id == medicine_id)
            .count() as i64)
    }

    // ==== Sequences ====

    async fn find_sequence(&self, scope_key: &str) -> AppResult<Option<CodeSequence>> {
        let inner = self.lock()?;
        Ok(inner
            .sequences_by_scope
            .get(scope_key)
            .and_then(|id| inner.sequences.get(id))
            .cloned())
    }

    async fn insert_sequence(&self, sequence: &CodeSequence) -> AppResult<()> {
        let mut inner = self.lock()?;
        if inner.sequences_by_scope.contains_key(&sequence.scope_key) {
            return Ok(());
        }
        inner
            .sequences_by_scope
            .insert(sequence.scope_key.clone(), sequence.id);
        inner.sequences.insert(sequence.id, sequence.clone());
        Ok(())
    }

    async fn advance_sequence(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut inner = self.lock()?;
        let Some(sequence) = inner.sequences.get_mut(&id) else {
            return Ok(false);
        };
        if sequence.current_sequence != expected {
            return Ok(false);
        }
        sequence.current_sequence = next.to_string();
        sequence.total_generated += 1;
        sequence.last_generated = Some(at);
        Ok(true)
    }

    // ==== Generated codes ====

    async fn insert_code(&self, code: &GeneratedCode) -> AppResult<()> {
        let mut inner = self.lock()?;
        if inner.codes_by_string.contains_key(&code.code) {
            return Err(AppError::DuplicateEntry(format!(
                "code '{}' already exists",
                code.code
            )));
        }
        inner.codes_by_string.insert(code.code.clone(), code.id);
        inner.codes.insert(code.id, code.clone());
        Ok(())
    }

    async fn find_code(&self, id: Uuid) -> AppResult<Option<GeneratedCode>> {
        let inner = self.lock()?;
        Ok(inner.codes.get(&id).cloned())
    }

    async fn find_code_by_string(&self, code: &str) -> AppResult<Option<GeneratedCode>> {
        let inner = self.lock()?;
        Ok(inner
            .codes_by_string
            .get(code)
            .and_then(|id| inner.codes.get(id))
            .cloned())
    }

    async fn list_codes(
        &self,
        filter: &CodeFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<GeneratedCode>, u64)> {
        let inner = self.lock()?;
        let mut codes: Vec<GeneratedCode> = inner
            .codes
            .values()
            .filter(|c| {
                filter.medicine_id.map_or(true, |id| c.medicine_id == id)
                    && filter.status.map_or(true, |s| c.status == s)
                    && filter.is_bulk.map_or(true, |b| c.is_bulk == b)
            })
            .cloned()
            .collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = codes.len() as u64;
        Ok((paginate(codes, pagination), total))
    }

    async fn update_code_status(&self, id: Uuid, status: CodeStatus) -> AppResult<()> {
        let mut inner = self.lock()?;
        let code = inner
            .codes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Code".to_string()))?;
        code.status = status;
        code.updated_at = Utc::now();
        Ok(())
    }

    async fn record_scan(&self, id: Uuid, scanned_by: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let mut inner = self.lock()?;
        let code = inner
            .codes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Code".to_string()))?;
        code.scanned_count += 1;
        code.last_scanned_at = Some(at);
        code.last_scanned_by = Some(scanned_by);
        code.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_code(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.lock()?;
        let code = inner
            .codes
            .remove(&id)
            .ok_or_else(|| AppError::NotFound("Code".to_string()))?;
        inner.codes_by_string.remove(&code.code);
        Ok(())
    }

    async fn generation_statistics(&self) -> AppResult<Vec<GenerationStat>> {
        let inner = self.lock()?;
        let mut groups: HashMap<(String, String, String), (i64, i64, i64)> = HashMap::new();
        for code in inner.codes.values() {
            let key = (
                code.components.year.clone(),
                code.components.month.clone(),
                code.components.medicine_type.to_string(),
            );
            let entry = groups.entry(key).or_default();
            if code.is_bulk {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
            entry.2 += code.scanned_count;
        }
        let mut stats: Vec<GenerationStat> = groups
            .into_iter()
            .map(|((year, month, medicine_type), (unit_codes, bulk_codes, total_scans))| {
                GenerationStat {
                    year,
                    month,
                    medicine_type,
                    unit_codes,
                    bulk_codes,
                    total_scans,
                }
            })
            .collect();
        stats.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then(b.month.cmp(&a.month))
                .then(a.medicine_type.cmp(&b.medicine_type))
        });
        Ok(stats)
    }

    // ==== Scan logs ====

    async fn append_scan_log(&self, entry: &ScanLogEntry) -> AppResult<()> {
        let mut inner = self.lock()?;
        inner.scan_logs.push(entry.clone());
        Ok(())
    }

    async fn list_scan_logs(
        &self,
        filter: &ScanLogFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<ScanLogEntry>, u64)> {
        let inner = self.lock()?;
        let mut entries: Vec<ScanLogEntry> = inner
            .scan_logs
            .iter()
            .filter(|e| {
                filter.code.as_deref().map_or(true, |c| e.code == c)
                    && filter.outcome.map_or(true, |o| e.outcome == o)
                    && filter.scanned_by.map_or(true, |u| e.scanned_by == u)
                    && filter.range.as_ref().map_or(true, |r| {
                        let day = e.scanned_at.date_naive();
                        day >= r.start && day <= r.end
                    })
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        let total = entries.len() as u64;
        Ok((paginate(entries, pagination), total))
    }

    // ==== Health ====

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::INITIAL_SEQUENCE;

    fn sample_sequence(scope_key: &str) -> CodeSequence {
        CodeSequence {
            id: Uuid::new_v4(),
            scope_key: scope_key.to_string(),
            year: "25".to_string(),
            month: "07".to_string(),
            funding_source: "A".to_string(),
            medicine_type: "F".to_string(),
            active_ingredient: "123".to_string(),
            producer: "B".to_string(),
            package_type: None,
            current_sequence: INITIAL_SEQUENCE.to_string(),
            total_generated: 0,
            last_generated: None,
            created_at: Utc::now(),
        }
    }

    fn sample_code(code: &str) -> GeneratedCode {
        let components = shared::parse(code).unwrap();
        let is_bulk = components.is_bulk();
        GeneratedCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            medicine_id: Uuid::new_v4(),
            is_bulk,
            components,
            image_data: None,
            batch_info: None,
            notes: None,
            status: CodeStatus::Generated,
            generated_by: Uuid::new_v4(),
            scanned_count: 0,
            last_scanned_at: None,
            last_scanned_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_sequence_keeps_first_writer() {
        let store = MemoryCodeStore::new();
        let first = sample_sequence("2507AF123B");
        store.insert_sequence(&first).await.unwrap();

        let mut second = sample_sequence("2507AF123B");
        second.current_sequence = "0042".to_string();
        store.insert_sequence(&second).await.unwrap();

        let found = store.find_sequence("2507AF123B").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.current_sequence, INITIAL_SEQUENCE);
    }

    #[tokio::test]
    async fn test_advance_sequence_compare_and_set() {
        let store = MemoryCodeStore::new();
        let sequence = sample_sequence("2507AF123B");
        store.insert_sequence(&sequence).await.unwrap();

        let now = Utc::now();
        assert!(store
            .advance_sequence(sequence.id, "0000", "0001", now)
            .await
            .unwrap());
        // Stale expectation loses the race.
        assert!(!store
            .advance_sequence(sequence.id, "0000", "0001", now)
            .await
            .unwrap());

        let found = store.find_sequence("2507AF123B").await.unwrap().unwrap();
        assert_eq!(found.current_sequence, "0001");
        assert_eq!(found.total_generated, 1);
        assert!(found.last_generated.is_some());
    }

    #[tokio::test]
    async fn test_insert_code_rejects_duplicate_string() {
        let store = MemoryCodeStore::new();
        store.insert_code(&sample_code("2507AF123B0001")).await.unwrap();
        let err = store
            .insert_code(&sample_code("2507AF123B0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEntry(_)));
    }

    #[tokio::test]
    async fn test_delete_code_clears_string_index() {
        let store = MemoryCodeStore::new();
        let code = sample_code("2507AF123B0001");
        store.insert_code(&code).await.unwrap();
        store.delete_code(code.id).await.unwrap();
        assert!(store
            .find_code_by_string("2507AF123B0001")
            .await
            .unwrap()
            .is_none());
        // The string is free for reuse once the code is gone.
        store.insert_code(&sample_code("2507AF123B0001")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_code_is_not_found() {
        let store = MemoryCodeStore::new();
        let err = store.delete_code(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_generation_statistics_groups_by_month_and_type() {
        let store = MemoryCodeStore::new();
        store.insert_code(&sample_code("2507AF123B0001")).await.unwrap();
        store.insert_code(&sample_code("2507AF123B0002")).await.unwrap();
        store.insert_code(&sample_code("2507AF123B-X0001")).await.unwrap();
        store.insert_code(&sample_code("2508AI456C0001")).await.unwrap();

        let stats = store.generation_statistics().await.unwrap();
        assert_eq!(stats.len(), 2);
        // Newest month first.
        assert_eq!(stats[0].month, "08");
        assert_eq!(stats[0].medicine_type, "I");
        assert_eq!(stats[1].month, "07");
        assert_eq!(stats[1].unit_codes, 2);
        assert_eq!(stats[1].bulk_codes, 1);
    }
}
