//! Security audit trail service.
//!
//! Thin wrapper over [`SecurityLogRepo`] providing the well-known entry
//! shapes the rest of the pipeline writes. Entries that must be atomic
//! with other writes (event creation, status changes) are appended by
//! their owning service inside its transaction via the repo directly;
//! this service covers the standalone appends and the query surface.

use helioguard_core::audit::{activity_types, SYSTEM_ACTOR};
use helioguard_core::types::{DbId, Timestamp};
use helioguard_db::models::security_log::{CreateSecurityLog, SecurityLog};
use helioguard_db::repositories::SecurityLogRepo;
use helioguard_db::DbPool;

use crate::error::DetectionResult;

/// Default page size for log listings.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for log listings.
const MAX_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct SecurityLogService {
    pool: DbPool,
}

impl SecurityLogService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append an arbitrary entry.
    pub async fn create(
        &self,
        installation_id: DbId,
        activity_type: &str,
        details: String,
        actor: Option<&str>,
    ) -> DetectionResult<SecurityLog> {
        let dto = CreateSecurityLog {
            installation_id,
            activity_type: activity_type.to_string(),
            details,
            ip_address: None,
            location: None,
            actor: actor.unwrap_or(SYSTEM_ACTOR).to_string(),
        };
        let log = SecurityLogRepo::create(&self.pool, &dto).await?;
        tracing::debug!(
            installation_id,
            activity_type,
            log_id = log.id,
            "Security log entry appended"
        );
        Ok(log)
    }

    /// Record a configuration change.
    pub async fn log_config_change(
        &self,
        installation_id: DbId,
        details: String,
        actor: Option<&str>,
    ) -> DetectionResult<SecurityLog> {
        self.create(
            installation_id,
            activity_types::CONFIGURATION_CHANGE,
            details,
            actor,
        )
        .await
    }

    /// Record a sensitivity (threshold) adjustment.
    pub async fn log_sensitivity_change(
        &self,
        installation_id: DbId,
        details: String,
        actor: Option<&str>,
    ) -> DetectionResult<SecurityLog> {
        self.create(
            installation_id,
            activity_types::SENSITIVITY_CHANGE,
            details,
            actor,
        )
        .await
    }

    /// Record a diagnostic/system activity.
    pub async fn log_diagnostic(
        &self,
        installation_id: DbId,
        details: String,
    ) -> DetectionResult<SecurityLog> {
        self.create(
            installation_id,
            activity_types::SYSTEM_DIAGNOSTIC,
            details,
            None,
        )
        .await
    }

    /// List entries for an installation, most recent first.
    pub async fn list_for_installation(
        &self,
        installation_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> DetectionResult<Vec<SecurityLog>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        Ok(SecurityLogRepo::list_for_installation(&self.pool, installation_id, limit, offset)
            .await?)
    }

    /// List entries for an installation with a given activity type.
    pub async fn list_by_activity(
        &self,
        installation_id: DbId,
        activity_type: &str,
    ) -> DetectionResult<Vec<SecurityLog>> {
        Ok(SecurityLogRepo::list_by_activity(&self.pool, installation_id, activity_type).await?)
    }

    /// List entries for an installation within a time range.
    pub async fn list_in_range(
        &self,
        installation_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> DetectionResult<Vec<SecurityLog>> {
        Ok(SecurityLogRepo::list_in_range(&self.pool, installation_id, from, to).await?)
    }
}
