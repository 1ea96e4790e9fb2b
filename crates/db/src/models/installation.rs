//! Solar installation entity model (collaborator projection).
//!
//! Installation CRUD and ownership belong to the fleet service; the
//! detection pipeline only checks existence, reads `status` for monitoring
//! reconciliation, and owns the aggregate tamper flag pair
//! (`tamper_detected`, `last_tamper_check`).

use serde::Serialize;
use sqlx::FromRow;

use helioguard_core::types::{DbId, Timestamp};

/// Well-known installation status values.
pub mod statuses {
    pub const ACTIVE: &str = "active";
    pub const SUSPENDED: &str = "suspended";
    pub const MAINTENANCE: &str = "maintenance";
}

/// A row from the `installations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Installation {
    pub id: DbId,
    pub name: String,
    pub location: Option<String>,
    pub status: String,
    /// Aggregate "has at least one unresolved tamper event" flag.
    pub tamper_detected: bool,
    pub last_tamper_check: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
