//! Repository for the `monitoring_statuses` table.

use sqlx::PgPool;

use helioguard_core::types::DbId;

use crate::models::monitoring_status::MonitoringStatus;

/// Column list for `monitoring_statuses` SELECT queries.
const COLUMNS: &str = "id, installation_id, monitoring, updated_at";

/// Provides the monitoring on/off toggle per installation.
pub struct MonitoringStatusRepo;

impl MonitoringStatusRepo {
    /// Find the status row for an installation.
    pub async fn find_by_installation(
        pool: &PgPool,
        installation_id: DbId,
    ) -> Result<Option<MonitoringStatus>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM monitoring_statuses WHERE installation_id = $1"
        );
        sqlx::query_as::<_, MonitoringStatus>(&query)
            .bind(installation_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the monitoring flag, creating the row if absent. Idempotent.
    pub async fn set_monitoring(
        pool: &PgPool,
        installation_id: DbId,
        monitoring: bool,
    ) -> Result<MonitoringStatus, sqlx::Error> {
        let query = format!(
            "INSERT INTO monitoring_statuses (installation_id, monitoring) \
             VALUES ($1, $2) \
             ON CONFLICT (installation_id) \
             DO UPDATE SET monitoring = $2, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MonitoringStatus>(&query)
            .bind(installation_id)
            .bind(monitoring)
            .fetch_one(pool)
            .await
    }

    /// Whether an installation is actively monitored. `false` when no row.
    pub async fn is_monitoring(pool: &PgPool, installation_id: DbId) -> Result<bool, sqlx::Error> {
        let flag: Option<bool> = sqlx::query_scalar(
            "SELECT monitoring FROM monitoring_statuses WHERE installation_id = $1",
        )
        .bind(installation_id)
        .fetch_optional(pool)
        .await?;
        Ok(flag.unwrap_or(false))
    }

    /// Ids of all installations with monitoring switched on.
    pub async fn list_monitored_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT installation_id FROM monitoring_statuses \
             WHERE monitoring = true \
             ORDER BY installation_id",
        )
        .fetch_all(pool)
        .await
    }
}
