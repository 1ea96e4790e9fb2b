//! Tamper event entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use helioguard_core::types::{DbId, Timestamp};

/// A row from the `tamper_events` table.
///
/// Invariant: `resolved` is `true` exactly when `status` is `"resolved"`.
/// Rows are never deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TamperEvent {
    pub id: DbId,
    pub installation_id: DbId,
    pub event_type: String,
    pub severity: String,
    pub confidence_score: f64,
    pub description: String,
    /// Opaque raw sensor payload as reported by the device.
    pub raw_sensor_data: Option<String>,
    pub status: String,
    pub resolved: bool,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<String>,
    pub resolution_notes: Option<String>,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for inserting a new tamper event.
///
/// Events are always inserted with `new` status and an unset resolution;
/// only the detection-time fields are supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTamperEvent {
    pub installation_id: DbId,
    pub event_type: String,
    pub severity: String,
    pub confidence_score: f64,
    pub description: String,
    pub raw_sensor_data: Option<String>,
}
