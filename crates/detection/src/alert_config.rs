//! Per-installation alert configuration service.
//!
//! Configurations are synthesized lazily: the first access for an
//! installation inserts the default row. Reads used on the hot ingestion
//! path (`threshold_for`, `is_auto_response_enabled`) avoid creating rows
//! where a default answer suffices.

use helioguard_core::alerting::{AlertLevel, DEFAULT_SAMPLING_RATE_SECS, FALLBACK_THRESHOLD};
use helioguard_core::error::CoreError;
use helioguard_core::tamper::TamperEventType;
use helioguard_core::types::DbId;
use validator::Validate;

use helioguard_db::models::alert_config::{AlertConfig, UpdateAlertConfig};
use helioguard_db::repositories::{AlertConfigRepo, InstallationRepo};
use helioguard_db::DbPool;

use crate::error::{DetectionError, DetectionResult};
use crate::security_log::SecurityLogService;

#[derive(Clone)]
pub struct AlertConfigService {
    pool: DbPool,
    security_logs: SecurityLogService,
}

impl AlertConfigService {
    pub fn new(pool: DbPool) -> Self {
        let security_logs = SecurityLogService::new(pool.clone());
        Self {
            pool,
            security_logs,
        }
    }

    /// Return the installation's config, creating the default row if none
    /// exists yet.
    pub async fn get_or_create_default(&self, installation_id: DbId) -> DetectionResult<AlertConfig> {
        if !InstallationRepo::exists(&self.pool, installation_id).await? {
            return Err(CoreError::NotFound {
                entity: "Installation",
                id: installation_id,
            }
            .into());
        }

        if let Some(config) = AlertConfigRepo::find_by_installation(&self.pool, installation_id).await? {
            return Ok(config);
        }

        match AlertConfigRepo::insert_default(&self.pool, installation_id).await? {
            Some(created) => {
                tracing::info!(installation_id, "Default alert configuration created");
                self.security_logs
                    .log_config_change(
                        installation_id,
                        "Default alert configuration created".to_string(),
                        None,
                    )
                    .await?;
                Ok(created)
            }
            // Lost a first-access race; the winner's row is authoritative.
            None => {
                let config = AlertConfigRepo::find_by_installation(&self.pool, installation_id)
                    .await?
                    .ok_or_else(|| {
                        DetectionError::Core(CoreError::Internal(format!(
                            "Alert config for installation {installation_id} vanished after \
                             conflicting insert"
                        )))
                    })?;
                Ok(config)
            }
        }
    }

    /// Overwrite all mutable fields of an installation's configuration.
    pub async fn update(
        &self,
        installation_id: DbId,
        dto: UpdateAlertConfig,
        actor: Option<&str>,
    ) -> DetectionResult<AlertConfig> {
        dto.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        // Reject unknown levels before they reach the row.
        AlertLevel::parse(&dto.alert_level)?;

        // Make sure a row exists to overwrite.
        self.get_or_create_default(installation_id).await?;

        let updated = AlertConfigRepo::update(&self.pool, installation_id, &dto)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "AlertConfig",
                id: installation_id,
            })?;

        self.security_logs
            .log_config_change(
                installation_id,
                format!(
                    "Alert configuration updated: alert level={}, auto response={}",
                    dto.alert_level, dto.auto_response_enabled
                ),
                actor,
            )
            .await?;

        Ok(updated)
    }

    /// Resolve the detection threshold for an event type.
    ///
    /// Movement, voltage, and connection map to their config fields; other
    /// event types use the fixed fallback.
    pub async fn threshold_for(
        &self,
        installation_id: DbId,
        event_type: TamperEventType,
    ) -> DetectionResult<f64> {
        let config = self.get_or_create_default(installation_id).await?;
        let threshold = match event_type {
            TamperEventType::PhysicalMovement => config.movement_threshold,
            TamperEventType::VoltageFluctuation => config.voltage_threshold,
            TamperEventType::ConnectionTampering => config.connection_threshold,
            TamperEventType::LocationChange | TamperEventType::Generic => FALLBACK_THRESHOLD,
        };
        Ok(threshold)
    }

    /// Whether automatic responses are enabled. Defaults to `true` when no
    /// config row exists.
    pub async fn is_auto_response_enabled(&self, installation_id: DbId) -> DetectionResult<bool> {
        let config = AlertConfigRepo::find_by_installation(&self.pool, installation_id).await?;
        Ok(config.map(|c| c.auto_response_enabled).unwrap_or(true))
    }

    /// The configured sampling interval. Defaults to 60s when no row.
    pub async fn sampling_rate_secs(&self, installation_id: DbId) -> DetectionResult<i32> {
        let config = AlertConfigRepo::find_by_installation(&self.pool, installation_id).await?;
        Ok(config
            .map(|c| c.sampling_rate_secs)
            .unwrap_or(DEFAULT_SAMPLING_RATE_SECS))
    }

    /// Rewrite a single event type's threshold, keeping everything else.
    pub async fn adjust_sensitivity(
        &self,
        installation_id: DbId,
        event_type: TamperEventType,
        new_threshold: f64,
        actor: Option<&str>,
    ) -> DetectionResult<AlertConfig> {
        if !new_threshold.is_finite() || new_threshold < 0.0 {
            return Err(CoreError::Validation(format!(
                "Threshold must be a non-negative number, got {new_threshold}"
            ))
            .into());
        }

        let current = self.get_or_create_default(installation_id).await?;
        let mut dto = UpdateAlertConfig {
            alert_level: current.alert_level.clone(),
            notification_channels: current.channels(),
            auto_response_enabled: current.auto_response_enabled,
            movement_threshold: current.movement_threshold,
            voltage_threshold: current.voltage_threshold,
            connection_threshold: current.connection_threshold,
            sampling_rate_secs: current.sampling_rate_secs,
        };

        match event_type {
            TamperEventType::PhysicalMovement => dto.movement_threshold = new_threshold,
            TamperEventType::VoltageFluctuation => dto.voltage_threshold = new_threshold,
            TamperEventType::ConnectionTampering => dto.connection_threshold = new_threshold,
            TamperEventType::LocationChange | TamperEventType::Generic => {
                return Err(CoreError::Validation(format!(
                    "Event type {event_type} has no configurable threshold"
                ))
                .into());
            }
        }

        let updated = AlertConfigRepo::update(&self.pool, installation_id, &dto)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "AlertConfig",
                id: installation_id,
            })?;

        self.security_logs
            .log_sensitivity_change(
                installation_id,
                format!(
                    "Tamper detection sensitivity adjusted for {event_type} to {new_threshold}"
                ),
                actor,
            )
            .await?;

        Ok(updated)
    }
}
