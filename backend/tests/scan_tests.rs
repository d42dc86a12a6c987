//! Scan processor tests against the in-memory store
//!
//! Each outcome branch must leave exactly one audit entry behind, and only
//! the success branch may move a code's counters.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use psm_server::services::ScanService;
use psm_server::store::{CodeStore, MemoryCodeStore, ScanLogFilter};
use shared::{
    CodeStatus, GeneratedCode, Pagination, ScanContext, ScanLogEntry, ScanOutcome, ScanPurpose,
};

// ============================================================================
// Fixtures
// ============================================================================

fn seeded_code(code: &str, status: CodeStatus) -> GeneratedCode {
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
        status,
        generated_by: Uuid::new_v4(),
        scanned_count: 0,
        last_scanned_at: None,
        last_scanned_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn context() -> ScanContext {
    ScanContext {
        location: Some("Gudang Bandung".to_string()),
        device: Some("scanner-07".to_string()),
        note: None,
    }
}

async fn logs_matching(
    store: &Arc<MemoryCodeStore>,
    filter: &ScanLogFilter,
) -> (Vec<ScanLogEntry>, u64) {
    store
        .list_scan_logs(filter, &Pagination::default())
        .await
        .unwrap()
}

async fn total_logs(store: &Arc<MemoryCodeStore>) -> u64 {
    logs_matching(store, &ScanLogFilter::default()).await.1
}

// ============================================================================
// Outcome Branches
// ============================================================================

#[tokio::test]
async fn malformed_string_logs_invalid_format() {
    let store = Arc::new(MemoryCodeStore::new());
    let scans = ScanService::new(store.clone());
    let actor = Uuid::new_v4();

    let result = scans
        .scan("BAD", actor, ScanPurpose::Verification, context())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.outcome, ScanOutcome::InvalidFormat);
    assert!(result.code.is_none());
    assert!(!result.message.is_empty());
    assert_eq!(result.scan_log.code, "BAD");
    assert!(result.scan_log.code_id.is_none());
    assert_eq!(result.scan_log.scanned_by, actor);
    assert_eq!(total_logs(&store).await, 1);
}

#[tokio::test]
async fn unregistered_code_logs_not_found() {
    let store = Arc::new(MemoryCodeStore::new());
    let scans = ScanService::new(store.clone());

    let result = scans
        .scan(
            "2507AF123B0001",
            Uuid::new_v4(),
            ScanPurpose::Verification,
            context(),
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.outcome, ScanOutcome::NotFound);
    assert_eq!(result.message, "Code is not registered");
    assert!(result.scan_log.code_id.is_none());
    assert_eq!(total_logs(&store).await, 1);
}

#[tokio::test]
async fn expired_code_logs_but_moves_nothing() {
    let store = Arc::new(MemoryCodeStore::new());
    let code = seeded_code("2507AF123B0001", CodeStatus::Expired);
    store.insert_code(&code).await.unwrap();
    let scans = ScanService::new(store.clone());

    let result = scans
        .scan(&code.code, Uuid::new_v4(), ScanPurpose::Distribution, context())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.outcome, ScanOutcome::Expired);
    assert_eq!(result.message, "Code has expired");
    // The record was resolved, so the log points at it even though the
    // response carries no code.
    assert_eq!(result.scan_log.code_id, Some(code.id));
    assert!(result.code.is_none());

    let stored = store.find_code(code.id).await.unwrap().unwrap();
    assert_eq!(stored.scanned_count, 0);
    assert!(stored.last_scanned_at.is_none());
    assert_eq!(total_logs(&store).await, 1);
}

#[tokio::test]
async fn successful_scan_updates_counters() {
    let store = Arc::new(MemoryCodeStore::new());
    let code = seeded_code("2507AF123B0001", CodeStatus::Generated);
    store.insert_code(&code).await.unwrap();
    let scans = ScanService::new(store.clone());
    let actor = Uuid::new_v4();

    let result = scans
        .scan(&code.code, actor, ScanPurpose::Distribution, context())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.outcome, ScanOutcome::Success);
    assert_eq!(result.message, "Scan recorded");
    assert_eq!(result.scan_log.code_id, Some(code.id));
    assert_eq!(result.scan_log.purpose, ScanPurpose::Distribution);
    assert_eq!(result.scan_log.location.as_deref(), Some("Gudang Bandung"));
    assert_eq!(result.scan_log.device.as_deref(), Some("scanner-07"));

    let refreshed = result.code.unwrap();
    assert_eq!(refreshed.scanned_count, 1);
    assert_eq!(refreshed.last_scanned_by, Some(actor));
    assert!(refreshed.last_scanned_at.is_some());

    let again = scans
        .scan(&code.code, actor, ScanPurpose::StockCheck, ScanContext::default())
        .await
        .unwrap();
    assert_eq!(again.code.unwrap().scanned_count, 2);
    assert_eq!(total_logs(&store).await, 2);
}

#[tokio::test]
async fn distributed_codes_still_scan() {
    let store = Arc::new(MemoryCodeStore::new());
    let code = seeded_code("2507AF123B0002", CodeStatus::Distributed);
    store.insert_code(&code).await.unwrap();
    let scans = ScanService::new(store.clone());

    let result = scans
        .scan(&code.code, Uuid::new_v4(), ScanPurpose::Verification, context())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.code.unwrap().scanned_count, 1);
}

// ============================================================================
// Audit Trail
// ============================================================================

#[tokio::test]
async fn every_branch_appends_one_entry() {
    let store = Arc::new(MemoryCodeStore::new());
    store
        .insert_code(&seeded_code("2507AF123B0001", CodeStatus::Generated))
        .await
        .unwrap();
    store
        .insert_code(&seeded_code("2507AF123B0002", CodeStatus::Expired))
        .await
        .unwrap();
    let scans = ScanService::new(store.clone());
    let actor = Uuid::new_v4();

    for code in ["???", "2507AF123B0009", "2507AF123B0002", "2507AF123B0001"] {
        scans
            .scan(code, actor, ScanPurpose::Verification, ScanContext::default())
            .await
            .unwrap();
    }

    assert_eq!(total_logs(&store).await, 4);
    for outcome in [
        ScanOutcome::InvalidFormat,
        ScanOutcome::NotFound,
        ScanOutcome::Expired,
        ScanOutcome::Success,
    ] {
        let filter = ScanLogFilter {
            outcome: Some(outcome),
            ..Default::default()
        };
        assert_eq!(logs_matching(&store, &filter).await.1, 1);
    }
}

#[tokio::test]
async fn logs_filter_by_actor_and_code() {
    let store = Arc::new(MemoryCodeStore::new());
    store
        .insert_code(&seeded_code("2507AF123B0001", CodeStatus::Generated))
        .await
        .unwrap();
    let scans = ScanService::new(store.clone());
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    scans
        .scan("2507AF123B0001", first, ScanPurpose::Verification, ScanContext::default())
        .await
        .unwrap();
    scans
        .scan("2507AF123B0001", second, ScanPurpose::Verification, ScanContext::default())
        .await
        .unwrap();
    scans
        .scan("garbage", second, ScanPurpose::Verification, ScanContext::default())
        .await
        .unwrap();

    let by_actor = ScanLogFilter {
        scanned_by: Some(second),
        ..Default::default()
    };
    let (entries, total) = logs_matching(&store, &by_actor).await;
    assert_eq!(total, 2);
    assert!(entries.iter().all(|e| e.scanned_by == second));

    let by_code = ScanLogFilter {
        code: Some("2507AF123B0001".to_string()),
        ..Default::default()
    };
    assert_eq!(logs_matching(&store, &by_code).await.1, 2);
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn export_renders_audit_rows_as_csv() {
    let store = Arc::new(MemoryCodeStore::new());
    store
        .insert_code(&seeded_code("2507AF123B0001", CodeStatus::Generated))
        .await
        .unwrap();
    let scans = ScanService::new(store.clone());

    scans
        .scan("2507AF123B0001", Uuid::new_v4(), ScanPurpose::Distribution, context())
        .await
        .unwrap();
    scans
        .scan("nonsense", Uuid::new_v4(), ScanPurpose::Verification, ScanContext::default())
        .await
        .unwrap();

    let csv = scans.export_logs(&ScanLogFilter::default()).await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "id,code,code_id,scanned_by,purpose,outcome,location,device,note,scanned_at"
    );
    assert!(csv.contains("2507AF123B0001"));
    assert!(csv.contains("distribution"));
    assert!(csv.contains("invalid_format"));

    let filtered = ScanLogFilter {
        outcome: Some(ScanOutcome::Success),
        ..Default::default()
    };
    let csv = scans.export_logs(&filtered).await.unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(!csv.contains("nonsense"));
}
