//! Repository for the `alert_configs` table.

use sqlx::PgPool;

use helioguard_core::alerting::{
    default_channels, AlertLevel, DEFAULT_CONNECTION_THRESHOLD, DEFAULT_MOVEMENT_THRESHOLD,
    DEFAULT_SAMPLING_RATE_SECS, DEFAULT_VOLTAGE_THRESHOLD,
};
use helioguard_core::types::DbId;

use crate::models::alert_config::{AlertConfig, UpdateAlertConfig};

/// Column list for `alert_configs` SELECT queries.
const COLUMNS: &str = "\
    id, installation_id, alert_level, notification_channels, \
    auto_response_enabled, movement_threshold, voltage_threshold, \
    connection_threshold, sampling_rate_secs, created_at, updated_at";

/// Provides CRUD operations for per-installation alert configurations.
pub struct AlertConfigRepo;

impl AlertConfigRepo {
    /// Find the config for an installation.
    pub async fn find_by_installation(
        pool: &PgPool,
        installation_id: DbId,
    ) -> Result<Option<AlertConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alert_configs WHERE installation_id = $1");
        sqlx::query_as::<_, AlertConfig>(&query)
            .bind(installation_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert the default configuration for an installation.
    ///
    /// Returns `None` when a config already exists (the unique constraint
    /// on `installation_id` makes concurrent first-access races harmless).
    pub async fn insert_default(
        pool: &PgPool,
        installation_id: DbId,
    ) -> Result<Option<AlertConfig>, sqlx::Error> {
        let channels = serde_json::json!(default_channels());
        let query = format!(
            "INSERT INTO alert_configs \
                 (installation_id, alert_level, notification_channels, \
                  auto_response_enabled, movement_threshold, voltage_threshold, \
                  connection_threshold, sampling_rate_secs) \
             VALUES ($1, $2, $3, true, $4, $5, $6, $7) \
             ON CONFLICT (installation_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertConfig>(&query)
            .bind(installation_id)
            .bind(AlertLevel::Medium.as_str())
            .bind(channels)
            .bind(DEFAULT_MOVEMENT_THRESHOLD)
            .bind(DEFAULT_VOLTAGE_THRESHOLD)
            .bind(DEFAULT_CONNECTION_THRESHOLD)
            .bind(DEFAULT_SAMPLING_RATE_SECS)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite all mutable fields of an installation's config.
    ///
    /// Returns `None` when no config row exists yet.
    pub async fn update(
        pool: &PgPool,
        installation_id: DbId,
        dto: &UpdateAlertConfig,
    ) -> Result<Option<AlertConfig>, sqlx::Error> {
        let channels = serde_json::json!(dto.notification_channels);
        let query = format!(
            "UPDATE alert_configs \
             SET alert_level = $2, notification_channels = $3, \
                 auto_response_enabled = $4, movement_threshold = $5, \
                 voltage_threshold = $6, connection_threshold = $7, \
                 sampling_rate_secs = $8, updated_at = NOW() \
             WHERE installation_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertConfig>(&query)
            .bind(installation_id)
            .bind(&dto.alert_level)
            .bind(channels)
            .bind(dto.auto_response_enabled)
            .bind(dto.movement_threshold)
            .bind(dto.voltage_threshold)
            .bind(dto.connection_threshold)
            .bind(dto.sampling_rate_secs)
            .fetch_optional(pool)
            .await
    }
}
