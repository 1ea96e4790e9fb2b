//! The tamper detection facade.
//!
//! [`TamperDetection`] is the entry point callers (and the maintenance
//! loops) use: monitoring toggles, sensor reading ingestion, sensitivity
//! adjustment, and delegation to the event/config services for lifecycle
//! and queries.
//!
//! Ingestion control flow: monitoring check -> threshold lookup ->
//! per-installation baseline lock -> evaluate -> false-positive filter +
//! severity classification -> transactional event creation -> response
//! enqueue. Everything after the baseline lock is serialized per
//! installation; different installations proceed in parallel.

use std::sync::Arc;

use helioguard_core::error::CoreError;
use helioguard_core::evaluate::{self, SensorReading};
use helioguard_core::severity;
use helioguard_core::tamper::TamperEventType;
use helioguard_core::types::DbId;

use helioguard_db::models::alert_config::{AlertConfig, UpdateAlertConfig};
use helioguard_db::models::tamper_event::TamperEvent;
use helioguard_db::repositories::{InstallationRepo, MonitoringStatusRepo};
use helioguard_db::DbPool;

use crate::alert_config::AlertConfigService;
use crate::baseline::BaselineCache;
use crate::dispatch::ResponseQueue;
use crate::error::DetectionResult;
use crate::events::{NewTamperEvent, TamperEventService};
use crate::security_log::SecurityLogService;

#[derive(Clone)]
pub struct TamperDetection {
    pool: DbPool,
    baselines: Arc<BaselineCache>,
    alert_configs: AlertConfigService,
    events: TamperEventService,
    security_logs: SecurityLogService,
    responses: ResponseQueue,
}

impl TamperDetection {
    pub fn new(pool: DbPool, responses: ResponseQueue) -> Self {
        let alert_configs = AlertConfigService::new(pool.clone());
        let events = TamperEventService::new(pool.clone());
        let security_logs = SecurityLogService::new(pool.clone());
        Self {
            pool,
            baselines: Arc::new(BaselineCache::new()),
            alert_configs,
            events,
            security_logs,
            responses,
        }
    }

    // -----------------------------------------------------------------------
    // Monitoring registry
    // -----------------------------------------------------------------------

    /// Switch monitoring on for an installation. Idempotent.
    ///
    /// Initializes the baseline entry, ensures a default alert config
    /// exists, and records the start in the security log.
    pub async fn start_monitoring(&self, installation_id: DbId) -> DetectionResult<()> {
        self.require_installation(installation_id).await?;

        self.baselines.ensure(installation_id).await;
        MonitoringStatusRepo::set_monitoring(&self.pool, installation_id, true).await?;
        self.security_logs
            .log_diagnostic(
                installation_id,
                "Tamper detection monitoring started".to_string(),
            )
            .await?;
        self.alert_configs
            .get_or_create_default(installation_id)
            .await?;

        tracing::info!(installation_id, "Monitoring started");
        Ok(())
    }

    /// Switch monitoring off. The baseline entry is retained so a later
    /// restart of monitoring resumes against the last observed values.
    pub async fn stop_monitoring(&self, installation_id: DbId) -> DetectionResult<()> {
        self.require_installation(installation_id).await?;

        MonitoringStatusRepo::set_monitoring(&self.pool, installation_id, false).await?;
        self.security_logs
            .log_diagnostic(
                installation_id,
                "Tamper detection monitoring stopped".to_string(),
            )
            .await?;

        tracing::info!(installation_id, "Monitoring stopped");
        Ok(())
    }

    /// Whether an installation is actively monitored.
    pub async fn is_monitoring(&self, installation_id: DbId) -> DetectionResult<bool> {
        Ok(MonitoringStatusRepo::is_monitoring(&self.pool, installation_id).await?)
    }

    /// Record a diagnostic run for an installation.
    pub async fn run_diagnostics(&self, installation_id: DbId) -> DetectionResult<()> {
        self.require_installation(installation_id).await?;
        self.security_logs
            .log_diagnostic(
                installation_id,
                "Tamper detection diagnostics executed".to_string(),
            )
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Process one raw sensor reading.
    ///
    /// Returns the created event, or `None` when monitoring is off, the
    /// reading did not cross its threshold, or the detection was filtered
    /// as a likely false positive. While monitoring is off the baseline is
    /// deliberately frozen: no cache update occurs.
    pub async fn ingest(
        &self,
        installation_id: DbId,
        reading: SensorReading,
        raw_sensor_data: Option<String>,
    ) -> DetectionResult<Option<TamperEvent>> {
        if !self.is_monitoring(installation_id).await? {
            tracing::debug!(installation_id, "Monitoring disabled, reading ignored");
            return Ok(None);
        }

        let event_type = reading.event_type();
        let threshold = self
            .alert_configs
            .threshold_for(installation_id, event_type)
            .await?;

        // Hold the per-installation lock across evaluation and event
        // creation so concurrent readings for one installation cannot
        // compare against a stale baseline or double-fire.
        let entry = self.baselines.entry(installation_id).await;
        let mut baseline = entry.lock().await;

        let Some(detection) = evaluate::evaluate(&reading, &mut baseline, threshold) else {
            return Ok(None);
        };

        let classified = severity::classify(detection.confidence);
        let created = self
            .events
            .create(NewTamperEvent {
                installation_id,
                event_type: detection.event_type,
                severity: classified,
                confidence: detection.confidence,
                description: detection.description,
                raw_sensor_data,
            })
            .await?;
        drop(baseline);

        if let Some(event) = &created {
            self.responses.enqueue(event.id);
        }

        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Rewrite one event type's detection threshold.
    pub async fn adjust_sensitivity(
        &self,
        installation_id: DbId,
        event_type: TamperEventType,
        new_threshold: f64,
        actor: Option<&str>,
    ) -> DetectionResult<AlertConfig> {
        self.alert_configs
            .adjust_sensitivity(installation_id, event_type, new_threshold, actor)
            .await
    }

    /// Fetch (or lazily create) the installation's alert configuration.
    pub async fn get_or_create_alert_config(
        &self,
        installation_id: DbId,
    ) -> DetectionResult<AlertConfig> {
        self.alert_configs.get_or_create_default(installation_id).await
    }

    /// Overwrite the installation's alert configuration.
    pub async fn update_alert_config(
        &self,
        installation_id: DbId,
        dto: UpdateAlertConfig,
        actor: Option<&str>,
    ) -> DetectionResult<AlertConfig> {
        self.alert_configs.update(installation_id, dto, actor).await
    }

    // -----------------------------------------------------------------------
    // Event lifecycle delegation
    // -----------------------------------------------------------------------

    pub async fn acknowledge_event(
        &self,
        event_id: DbId,
        actor: &str,
    ) -> DetectionResult<TamperEvent> {
        self.events.acknowledge(event_id, actor).await
    }

    pub async fn resolve_event(
        &self,
        event_id: DbId,
        actor: &str,
        notes: Option<&str>,
    ) -> DetectionResult<TamperEvent> {
        self.events.resolve(event_id, actor, notes).await
    }

    /// The event service, for the full query surface.
    pub fn events(&self) -> &TamperEventService {
        &self.events
    }

    /// The security log service, for the audit query surface.
    pub fn security_logs(&self) -> &SecurityLogService {
        &self.security_logs
    }

    /// Snapshot of an installation's cached baseline (diagnostics/tests).
    pub async fn baseline_snapshot(
        &self,
        installation_id: DbId,
    ) -> Option<helioguard_core::evaluate::SensorBaseline> {
        self.baselines.snapshot(installation_id).await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn require_installation(&self, installation_id: DbId) -> DetectionResult<()> {
        if !InstallationRepo::exists(&self.pool, installation_id).await? {
            return Err(CoreError::NotFound {
                entity: "Installation",
                id: installation_id,
            }
            .into());
        }
        Ok(())
    }
}
