//! Monitoring status entity model.

use serde::Serialize;
use sqlx::FromRow;

use helioguard_core::types::{DbId, Timestamp};

/// A row from the `monitoring_statuses` table. At most one per
/// installation; absence means monitoring is off.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonitoringStatus {
    pub id: DbId,
    pub installation_id: DbId,
    pub monitoring: bool,
    pub updated_at: Timestamp,
}
