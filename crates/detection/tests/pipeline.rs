//! End-to-end pipeline tests: ingestion, filtering, severity banding,
//! the aggregate tamper flag, response orchestration, and idempotence.
//!
//! Response workers are not started here (`worker_count = 0`), so automatic
//! responses are executed explicitly where a test needs them. That keeps
//! the fire-and-forget path deterministic under test.

use std::sync::Arc;

use assert_matches::assert_matches;
use sqlx::PgPool;

use helioguard_core::error::CoreError;
use helioguard_core::evaluate::SensorReading;
use helioguard_core::tamper::{ResponseType, TamperEventType, TamperSeverity};
use helioguard_db::models::alert_config::UpdateAlertConfig;
use helioguard_db::repositories::InstallationRepo;
use helioguard_detection::events::NewTamperEvent;
use helioguard_detection::notify::LogNotifier;
use helioguard_detection::{
    DetectionError, ResponseQueue, TamperDetection, TamperEventService, TamperResponseService,
};
use tokio_util::sync::CancellationToken;

async fn seed_installation(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO installations (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Pipeline with no response workers; responses enqueue but never run.
fn pipeline(pool: &PgPool) -> TamperDetection {
    let responses = TamperResponseService::new(pool.clone(), Arc::new(LogNotifier));
    let (queue, _handles) =
        ResponseQueue::start(responses, 0, 64, CancellationToken::new());
    TamperDetection::new(pool.clone(), queue)
}

fn response_service(pool: &PgPool) -> TamperResponseService {
    TamperResponseService::new(pool.clone(), Arc::new(LogNotifier))
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn movement_over_threshold_creates_critical_event(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-a").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    // Default movement threshold 0.75; 1.5 = 2x threshold => confidence 1.0.
    let event = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .expect("reading at twice the threshold must create an event");

    assert_eq!(event.event_type, "physical_movement");
    assert_eq!(event.severity, "critical");
    assert_eq!(event.confidence_score, 1.0);
    assert_eq!(event.status, "new");

    // Flag raised atomically with the event.
    let installation = InstallationRepo::find_by_id(&pool, installation_id)
        .await
        .unwrap()
        .unwrap();
    assert!(installation.tamper_detected);

    // Audit entry written in the same transaction.
    let logs = detection
        .security_logs()
        .list_by_activity(installation_id, "alert_generated")
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn small_voltage_drift_produces_no_event(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-b").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    // First reading establishes the 220V baseline (and fires against the
    // zero default, which is expected).
    detection
        .ingest(installation_id, SensorReading::Voltage(220.0), None)
        .await
        .unwrap();

    // 0.3V of drift is under the 0.5V threshold.
    let second = detection
        .ingest(installation_id, SensorReading::Voltage(220.3), None)
        .await
        .unwrap();
    assert!(second.is_none());

    let baseline = detection.baseline_snapshot(installation_id).await.unwrap();
    assert_eq!(baseline.voltage, 220.3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn disconnect_edge_fires_exactly_once(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-c").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let event = detection
        .ingest(installation_id, SensorReading::Connectivity(false), None)
        .await
        .unwrap()
        .expect("connected -> disconnected must fire");
    assert_eq!(event.event_type, "connection_tampering");
    assert_eq!(event.confidence_score, 0.9);
    assert_eq!(event.severity, "high");

    // Still disconnected: no transition, no event.
    let repeat = detection
        .ingest(installation_id, SensorReading::Connectivity(false), None)
        .await
        .unwrap();
    assert!(repeat.is_none());

    let events = detection
        .events()
        .list_for_installation(installation_id, None, None)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn location_change_fires_after_first_report(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-d").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let first = detection
        .ingest(
            installation_id,
            SensorReading::Location("59.33,18.06".to_string()),
            None,
        )
        .await
        .unwrap();
    assert!(first.is_none(), "first report has no prior location");

    let second = detection
        .ingest(
            installation_id,
            SensorReading::Location("55.60,13.00".to_string()),
            None,
        )
        .await
        .unwrap()
        .expect("changed location must fire");
    assert_eq!(second.event_type, "location_change");
    assert_eq!(second.confidence_score, 0.95);
    assert_eq!(second.severity, "critical");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unmonitored_ingest_is_inert(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-e").await;
    let detection = pipeline(&pool);

    // Monitoring never started: no event, no baseline mutation.
    let result = detection
        .ingest(installation_id, SensorReading::Movement(5.0), None)
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(detection.baseline_snapshot(installation_id).await.is_none());

    assert_eq!(
        detection
            .events()
            .count_unresolved(installation_id)
            .await
            .unwrap(),
        0
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stop_monitoring_freezes_baseline(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-f").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    detection
        .ingest(installation_id, SensorReading::Movement(0.5), None)
        .await
        .unwrap();
    detection.stop_monitoring(installation_id).await.unwrap();

    let result = detection
        .ingest(installation_id, SensorReading::Movement(5.0), None)
        .await
        .unwrap();
    assert!(result.is_none());

    // Baseline still shows the pre-stop value.
    let baseline = detection.baseline_snapshot(installation_id).await.unwrap();
    assert_eq!(baseline.movement, 0.5);
}

// ---------------------------------------------------------------------------
// Filtering and validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn low_confidence_detection_is_dropped(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-g").await;
    let events = TamperEventService::new(pool.clone());

    let result = events
        .create(NewTamperEvent {
            installation_id,
            event_type: TamperEventType::Generic,
            severity: TamperSeverity::Low,
            confidence: 0.2,
            description: "weak signal".to_string(),
            raw_sensor_data: None,
        })
        .await
        .unwrap();
    assert!(result.is_none());

    // No rows, no flag, no audit entry.
    assert_eq!(events.count_unresolved(installation_id).await.unwrap(), 0);
    let installation = InstallationRepo::find_by_id(&pool, installation_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!installation.tamper_detected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_range_confidence_is_rejected(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-h").await;
    let events = TamperEventService::new(pool.clone());

    let result = events
        .create(NewTamperEvent {
            installation_id,
            event_type: TamperEventType::Generic,
            severity: TamperSeverity::Low,
            confidence: 1.2,
            description: "impossible confidence".to_string(),
            raw_sensor_data: None,
        })
        .await;

    assert_matches!(
        result,
        Err(DetectionError::Core(CoreError::Validation(_)))
    );
}

// ---------------------------------------------------------------------------
// Lifecycle and the aggregate flag
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn resolving_last_event_clears_flag(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-i").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let first = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .unwrap();
    let second = detection
        .ingest(installation_id, SensorReading::Movement(1.6), None)
        .await
        .unwrap()
        .unwrap();

    detection
        .resolve_event(first.id, "operator", Some("panel checked"))
        .await
        .unwrap();
    let installation = InstallationRepo::find_by_id(&pool, installation_id)
        .await
        .unwrap()
        .unwrap();
    assert!(
        installation.tamper_detected,
        "one unresolved sibling must keep the flag set"
    );

    detection
        .resolve_event(second.id, "operator", None)
        .await
        .unwrap();
    let installation = InstallationRepo::find_by_id(&pool, installation_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!installation.tamper_detected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn acknowledge_then_resolve_follows_state_machine(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-j").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let event = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .unwrap();

    let acked = detection
        .acknowledge_event(event.id, "operator")
        .await
        .unwrap();
    assert_eq!(acked.status, "acknowledged");
    assert!(!acked.resolved);

    let resolved = detection
        .resolve_event(event.id, "operator", None)
        .await
        .unwrap();
    assert_eq!(resolved.status, "resolved");
    assert!(resolved.resolved);

    // Resolved is terminal in both directions.
    let re_ack = detection.acknowledge_event(event.id, "operator").await;
    assert_matches!(re_ack, Err(DetectionError::Core(CoreError::Conflict(_))));
    let re_resolve = detection.resolve_event(event.id, "operator", None).await;
    assert_matches!(re_resolve, Err(DetectionError::Core(CoreError::Conflict(_))));
}

// ---------------------------------------------------------------------------
// Response orchestration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn automatic_response_follows_severity_plan(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-k").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let event = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.severity, "critical");

    let responses = response_service(&pool);
    let response = responses
        .execute_automatic_response(event.id)
        .await
        .unwrap()
        .expect("auto-response is on by default");
    assert_eq!(response.response_type, "service_suspended");
    assert!(response.success);
    assert_eq!(response.executed_by, "SYSTEM");

    // The plan response plus the unconditional notification.
    let all = responses.list_for_event(event.id).await.unwrap();
    let types: Vec<&str> = all.iter().map(|r| r.response_type.as_str()).collect();
    assert!(types.contains(&"service_suspended"));
    assert!(types.contains(&"notification_sent"));
    assert_eq!(all.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn disabled_auto_response_creates_no_rows(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-l").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    detection
        .update_alert_config(
            installation_id,
            UpdateAlertConfig {
                alert_level: "medium".to_string(),
                notification_channels: vec!["email".to_string(), "in_app".to_string()],
                auto_response_enabled: false,
                movement_threshold: 0.75,
                voltage_threshold: 0.5,
                connection_threshold: 0.8,
                sampling_rate_secs: 60,
            },
            Some("admin"),
        )
        .await
        .unwrap();

    let event = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .unwrap();

    let responses = response_service(&pool);
    let result = responses.execute_automatic_response(event.id).await.unwrap();
    assert!(result.is_none());
    assert!(responses.list_for_event(event.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn send_notification_is_idempotent(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-m").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let event = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .unwrap();

    let responses = response_service(&pool);
    responses
        .send_notification(event.id, "service_suspended")
        .await
        .unwrap();
    responses
        .send_notification(event.id, "service_suspended")
        .await
        .unwrap();

    let sent = responses
        .list_for_event_by_type(event.id, ResponseType::NotificationSent)
        .await
        .unwrap();
    assert_eq!(sent.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_response_has_no_idempotence_guard(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-n").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let event = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .unwrap();

    let responses = response_service(&pool);
    for _ in 0..2 {
        responses
            .create_manual_response(
                event.id,
                ResponseType::ManualIntervention,
                "field-tech",
                Some("on-site inspection"),
            )
            .await
            .unwrap();
    }

    let manual = responses
        .list_for_event_by_type(event.id, ResponseType::ManualIntervention)
        .await
        .unwrap();
    assert_eq!(manual.len(), 2);
    assert!(manual.iter().all(|r| r.executed_by == "field-tech"));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn start_monitoring_synthesizes_default_config(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-o").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let config = detection
        .get_or_create_alert_config(installation_id)
        .await
        .unwrap();
    assert_eq!(config.alert_level, "medium");
    assert!(config.auto_response_enabled);
    assert_eq!(config.movement_threshold, 0.75);
    assert_eq!(config.sampling_rate_secs, 60);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn adjust_sensitivity_rewrites_one_threshold(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-p").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let updated = detection
        .adjust_sensitivity(
            installation_id,
            TamperEventType::PhysicalMovement,
            0.9,
            Some("admin"),
        )
        .await
        .unwrap();
    assert_eq!(updated.movement_threshold, 0.9);
    assert_eq!(updated.voltage_threshold, 0.5, "other thresholds untouched");

    let logs = detection
        .security_logs()
        .list_by_activity(installation_id, "sensitivity_change")
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);

    // A movement reading of 1.5 now scores 1.5 / 1.8 against the new
    // threshold instead of hitting the old cap.
    let event = detection
        .ingest(installation_id, SensorReading::Movement(1.5), None)
        .await
        .unwrap()
        .unwrap();
    assert!(event.confidence_score < 1.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn adjust_sensitivity_rejects_unconfigurable_types(pool: PgPool) {
    let installation_id = seed_installation(&pool, "site-q").await;
    let detection = pipeline(&pool);
    detection.start_monitoring(installation_id).await.unwrap();

    let result = detection
        .adjust_sensitivity(installation_id, TamperEventType::LocationChange, 0.9, None)
        .await;
    assert_matches!(
        result,
        Err(DetectionError::Core(CoreError::Validation(_)))
    );

    let negative = detection
        .adjust_sensitivity(
            installation_id,
            TamperEventType::PhysicalMovement,
            -1.0,
            None,
        )
        .await;
    assert_matches!(
        negative,
        Err(DetectionError::Core(CoreError::Validation(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_installation_is_not_found(pool: PgPool) {
    let detection = pipeline(&pool);

    let result = detection.start_monitoring(4242).await;
    assert_matches!(
        result,
        Err(DetectionError::Core(CoreError::NotFound { entity: "Installation", id: 4242 }))
    );
}
