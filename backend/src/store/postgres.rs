//! PostgreSQL-backed [`CodeStore`]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{
    CodeComponents, CodeSequence, CodeStatus, GeneratedCode, Medicine, MedicineIdentity,
    MedicineType, Pagination, ScanLogEntry, ScanOutcome, ScanPurpose,
};

use crate::error::{AppError, AppResult};

use super::{CodeFilter, CodeStore, GenerationStat, ScanLogFilter};

/// Production storage on PostgreSQL
#[derive(Clone)]
pub struct PgCodeStore {
    db: PgPool,
}

impl PgCodeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Database row for a medicine master
#[derive(Debug, sqlx::FromRow)]
struct MedicineRow {
    id: Uuid,
    name: String,
    medicine_type: String,
    funding_source: String,
    active_ingredient_code: String,
    active_ingredient_name: String,
    producer_code: String,
    producer_name: String,
    package_type: Option<String>,
    unit_contents: Decimal,
    unit_label: String,
    quantity: i32,
    registration_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MedicineRow {
    fn into_medicine(self) -> AppResult<Medicine> {
        let medicine_type = MedicineType::from_str(&self.medicine_type).ok_or_else(|| {
            AppError::Internal(format!("unknown medicine type '{}'", self.medicine_type))
        })?;
        Ok(Medicine {
            id: self.id,
            name: self.name,
            medicine_type,
            funding_source: self.funding_source,
            active_ingredient_code: self.active_ingredient_code,
            active_ingredient_name: self.active_ingredient_name,
            producer_code: self.producer_code,
            producer_name: self.producer_name,
            package_type: self.package_type,
            unit_contents: self.unit_contents,
            unit_label: self.unit_label,
            quantity: self.quantity,
            registration_number: self.registration_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const MEDICINE_COLUMNS: &str = "id, name, medicine_type, funding_source, active_ingredient_code, \
     active_ingredient_name, producer_code, producer_name, package_type, unit_contents, \
     unit_label, quantity, registration_number, created_at, updated_at";

/// Database row for a generated code
#[derive(Debug, sqlx::FromRow)]
struct GeneratedCodeRow {
    id: Uuid,
    code: String,
    medicine_id: Uuid,
    is_bulk: bool,
    components: serde_json::Value,
    image_data: Option<String>,
    batch_info: Option<String>,
    notes: Option<String>,
    status: String,
    generated_by: Uuid,
    scanned_count: i64,
    last_scanned_at: Option<DateTime<Utc>>,
    last_scanned_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GeneratedCodeRow {
    fn into_code(self) -> AppResult<GeneratedCode> {
        let status = CodeStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown code status '{}'", self.status)))?;
        let components: CodeComponents = serde_json::from_value(self.components)
            .map_err(|e| AppError::Internal(format!("stored components malformed: {}", e)))?;
        Ok(GeneratedCode {
            id: self.id,
            code: self.code,
            medicine_id: self.medicine_id,
            is_bulk: self.is_bulk,
            components,
            image_data: self.image_data,
            batch_info: self.batch_info,
            notes: self.notes,
            status,
            generated_by: self.generated_by,
            scanned_count: self.scanned_count,
            last_scanned_at: self.last_scanned_at,
            last_scanned_by: self.last_scanned_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const CODE_COLUMNS: &str = "id, code, medicine_id, is_bulk, components, image_data, batch_info, \
     notes, status, generated_by, scanned_count, last_scanned_at, last_scanned_by, \
     created_at, updated_at";

/// Database row for a scan-log entry
#[derive(Debug, sqlx::FromRow)]
struct ScanLogRow {
    id: Uuid,
    code: String,
    code_id: Option<Uuid>,
    scanned_by: Uuid,
    purpose: String,
    outcome: String,
    location: Option<String>,
    device: Option<String>,
    note: Option<String>,
    scanned_at: DateTime<Utc>,
}

impl ScanLogRow {
    fn into_entry(self) -> AppResult<ScanLogEntry> {
        let purpose = ScanPurpose::from_str(&self.purpose)
            .ok_or_else(|| AppError::Internal(format!("unknown scan purpose '{}'", self.purpose)))?;
        let outcome = ScanOutcome::from_str(&self.outcome)
            .ok_or_else(|| AppError::Internal(format!("unknown scan outcome '{}'", self.outcome)))?;
        Ok(ScanLogEntry {
            id: self.id,
            code: self.code,
            code_id: self.code_id,
            scanned_by: self.scanned_by,
            purpose,
            outcome,
            location: self.location,
            device: self.device,
            note: self.note,
            scanned_at: self.scanned_at,
        })
    }
}

/// Database row for a sequence counter
#[derive(Debug, sqlx::FromRow)]
struct SequenceRow {
    id: Uuid,
    scope_key: String,
    year: String,
    month: String,
    funding_source: String,
    medicine_type: String,
    active_ingredient: String,
    producer: String,
    package_type: Option<String>,
    current_sequence: String,
    total_generated: i64,
    last_generated: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<SequenceRow> for CodeSequence {
    fn from(row: SequenceRow) -> Self {
        CodeSequence {
            id: row.id,
            scope_key: row.scope_key,
            year: row.year,
            month: row.month,
            funding_source: row.funding_source,
            medicine_type: row.medicine_type,
            active_ingredient: row.active_ingredient,
            producer: row.producer,
            package_type: row.package_type,
            current_sequence: row.current_sequence,
            total_generated: row.total_generated,
            last_generated: row.last_generated,
            created_at: row.created_at,
        }
    }
}

const SEQUENCE_COLUMNS: &str = "id, scope_key, year, month, funding_source, medicine_type, \
     active_ingredient, producer, package_type, current_sequence, total_generated, \
     last_generated, created_at";

#[async_trait]
impl CodeStore for PgCodeStore {
    // ==== Medicine masters ====

    async fn insert_medicine(&self, medicine: &Medicine) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO medicines (id, name, medicine_type, funding_source, active_ingredient_code,
                                   active_ingredient_name, producer_code, producer_name, package_type,
                                   unit_contents, unit_label, quantity, registration_number,
                                   created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(medicine.id)
        .bind(&medicine.name)
        .bind(medicine.medicine_type.as_str())
        .bind(&medicine.funding_source)
        .bind(&medicine.active_ingredient_code)
        .bind(&medicine.active_ingredient_name)
        .bind(&medicine.producer_code)
        .bind(&medicine.producer_name)
        .bind(&medicine.package_type)
        .bind(medicine.unit_contents)
        .bind(&medicine.unit_label)
        .bind(medicine.quantity)
        .bind(&medicine.registration_number)
        .bind(medicine.created_at)
        .bind(medicine.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_medicine(&self, id: Uuid) -> AppResult<Option<Medicine>> {
        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            "SELECT {} FROM medicines WHERE id = $1",
            MEDICINE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(MedicineRow::into_medicine).transpose()
    }

    async fn find_medicine_by_identity(
        &self,
        identity: &MedicineIdentity,
    ) -> AppResult<Option<Medicine>> {
        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            SELECT {} FROM medicines
            WHERE funding_source = $1 AND medicine_type = $2
              AND active_ingredient_code = $3 AND producer_code = $4
            LIMIT 1
            "#,
            MEDICINE_COLUMNS
        ))
        .bind(&identity.funding_source)
        .bind(identity.medicine_type.as_str())
        .bind(&identity.active_ingredient_code)
        .bind(&identity.producer_code)
        .fetch_optional(&self.db)
        .await?;
        row.map(MedicineRow::into_medicine).transpose()
    }

    async fn list_medicines(
        &self,
        pagination: &Pagination,
    ) -> AppResult<(Vec<Medicine>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM medicines")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, MedicineRow>(&format!(
            "SELECT {} FROM medicines ORDER BY name LIMIT $1 OFFSET $2",
            MEDICINE_COLUMNS
        ))
        .bind(i64::from(pagination.per_page))
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        let medicines = rows
            .into_iter()
            .map(MedicineRow::into_medicine)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((medicines, total as u64))
    }

    async fn delete_medicine(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Medicine".to_string()));
        }
        Ok(())
    }

    async fn count_codes_for_medicine(&self, medicine_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM generated_codes WHERE medicine_id = $1",
        )
        .bind(medicine_id)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    // ==== Sequences ====

    async fn find_sequence(&self, scope_key: &str) -> AppResult<Option<CodeSequence>> {
        let row = sqlx::query_as::<_, SequenceRow>(&format!(
            "SELECT {} FROM code_sequences WHERE scope_key = $1",
            SEQUENCE_COLUMNS
        ))
        .bind(scope_key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(CodeSequence::from))
    }

    async fn insert_sequence(&self, sequence: &CodeSequence) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO code_sequences (id, scope_key, year, month, funding_source, medicine_type,
                                        active_ingredient, producer, package_type, current_sequence,
                                        total_generated, last_generated, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (scope_key) DO NOTHING
            "#,
        )
        .bind(sequence.id)
        .bind(&sequence.scope_key)
        .bind(&sequence.year)
        .bind(&sequence.month)
        .bind(&sequence.funding_source)
        .bind(&sequence.medicine_type)
        .bind(&sequence.active_ingredient)
        .bind(&sequence.producer)
        .bind(&sequence.package_type)
        .bind(&sequence.current_sequence)
        .bind(sequence.total_generated)
        .bind(sequence.last_generated)
        .bind(sequence.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn advance_sequence(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE code_sequences
            SET current_sequence = $1,
                total_generated = total_generated + 1,
                last_generated = $2
            WHERE id = $3 AND current_sequence = $4
            "#,
        )
        .bind(next)
        .bind(at)
        .bind(id)
        .bind(expected)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    // ==== Generated codes ====

    async fn insert_code(&self, code: &GeneratedCode) -> AppResult<()> {
        let components = serde_json::to_value(&code.components)
            .map_err(|e| AppError::Internal(format!("serialize components: {}", e)))?;
        sqlx::query(
            r#"
            INSERT INTO generated_codes (id, code, medicine_id, is_bulk, components, image_data,
                                         batch_info, notes, status, generated_by, scanned_count,
                                         last_scanned_at, last_scanned_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(code.id)
        .bind(&code.code)
        .bind(code.medicine_id)
        .bind(code.is_bulk)
        .bind(components)
        .bind(&code.image_data)
        .bind(&code.batch_info)
        .bind(&code.notes)
        .bind(code.status.as_str())
        .bind(code.generated_by)
        .bind(code.scanned_count)
        .bind(code.last_scanned_at)
        .bind(code.last_scanned_by)
        .bind(code.created_at)
        .bind(code.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_code(&self, id: Uuid) -> AppResult<Option<GeneratedCode>> {
        let row = sqlx::query_as::<_, GeneratedCodeRow>(&format!(
            "SELECT {} FROM generated_codes WHERE id = $1",
            CODE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(GeneratedCodeRow::into_code).transpose()
    }

    async fn find_code_by_string(&self, code: &str) -> AppResult<Option<GeneratedCode>> {
        let row = sqlx::query_as::<_, GeneratedCodeRow>(&format!(
            "SELECT {} FROM generated_codes WHERE code = $1",
            CODE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        row.map(GeneratedCodeRow::into_code).transpose()
    }

    async fn list_codes(
        &self,
        filter: &CodeFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<GeneratedCode>, u64)> {
        let status = filter.status.map(|s| s.as_str().to_string());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM generated_codes
            WHERE ($1::uuid IS NULL OR medicine_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::boolean IS NULL OR is_bulk = $3)
            "#,
        )
        .bind(filter.medicine_id)
        .bind(&status)
        .bind(filter.is_bulk)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, GeneratedCodeRow>(&format!(
            r#"
            SELECT {} FROM generated_codes
            WHERE ($1::uuid IS NULL OR medicine_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::boolean IS NULL OR is_bulk = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            CODE_COLUMNS
        ))
        .bind(filter.medicine_id)
        .bind(&status)
        .bind(filter.is_bulk)
        .bind(i64::from(pagination.per_page))
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        let codes = rows
            .into_iter()
            .map(GeneratedCodeRow::into_code)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((codes, total as u64))
    }

    async fn update_code_status(&self, id: Uuid, status: CodeStatus) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE generated_codes SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Code".to_string()));
        }
        Ok(())
    }

    async fn record_scan(&self, id: Uuid, scanned_by: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE generated_codes
            SET scanned_count = scanned_count + 1,
                last_scanned_at = $1,
                last_scanned_by = $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(at)
        .bind(scanned_by)
        .bind(id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Code".to_string()));
        }
        Ok(())
    }

    async fn delete_code(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM generated_codes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Code".to_string()));
        }
        Ok(())
    }

    async fn generation_statistics(&self) -> AppResult<Vec<GenerationStat>> {
        let rows = sqlx::query_as::<_, (String, String, String, i64, i64, i64)>(
            r#"
            SELECT COALESCE(components->>'year', '') AS year,
                   COALESCE(components->>'month', '') AS month,
                   COALESCE(components->>'medicine_type', '') AS medicine_type,
                   COUNT(*) FILTER (WHERE NOT is_bulk) AS unit_codes,
                   COUNT(*) FILTER (WHERE is_bulk) AS bulk_codes,
                   COALESCE(SUM(scanned_count), 0)::BIGINT AS total_scans
            FROM generated_codes
            GROUP BY 1, 2, 3
            ORDER BY 1 DESC, 2 DESC, 3
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| GenerationStat {
                year: r.0,
                month: r.1,
                medicine_type: r.2,
                unit_codes: r.3,
                bulk_codes: r.4,
                total_scans: r.5,
            })
            .collect())
    }

    // ==== Scan logs ====

    async fn append_scan_log(&self, entry: &ScanLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO scan_logs (id, code, code_id, scanned_by, purpose, outcome,
                                   location, device, note, scanned_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.code)
        .bind(entry.code_id)
        .bind(entry.scanned_by)
        .bind(entry.purpose.as_str())
        .bind(entry.outcome.as_str())
        .bind(&entry.location)
        .bind(&entry.device)
        .bind(&entry.note)
        .bind(entry.scanned_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn list_scan_logs(
        &self,
        filter: &ScanLogFilter,
        pagination: &Pagination,
    ) -> AppResult<(Vec<ScanLogEntry>, u64)> {
        let outcome = filter.outcome.map(|o| o.as_str().to_string());
        let (start, end): (Option<NaiveDate>, Option<NaiveDate>) = match &filter.range {
            Some(range) => (Some(range.start), Some(range.end)),
            None => (None, None),
        };

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM scan_logs
            WHERE ($1::text IS NULL OR code = $1)
              AND ($2::text IS NULL OR outcome = $2)
              AND ($3::uuid IS NULL OR scanned_by = $3)
              AND ($4::date IS NULL OR scanned_at::date >= $4)
              AND ($5::date IS NULL OR scanned_at::date <= $5)
            "#,
        )
        .bind(&filter.code)
        .bind(&outcome)
        .bind(filter.scanned_by)
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ScanLogRow>(
            r#"
            SELECT id, code, code_id, scanned_by, purpose, outcome, location, device, note, scanned_at
            FROM scan_logs
            WHERE ($1::text IS NULL OR code = $1)
              AND ($2::text IS NULL OR outcome = $2)
              AND ($3::uuid IS NULL OR scanned_by = $3)
              AND ($4::date IS NULL OR scanned_at::date >= $4)
              AND ($5::date IS NULL OR scanned_at::date <= $5)
            ORDER BY scanned_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(&filter.code)
        .bind(&outcome)
        .bind(filter.scanned_by)
        .bind(start)
        .bind(end)
        .bind(i64::from(pagination.per_page))
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(ScanLogRow::into_entry)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((entries, total as u64))
    }

    // ==== Health ====

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }
}
