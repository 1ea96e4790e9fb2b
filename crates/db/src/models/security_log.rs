//! Security log entity model and DTO.
//!
//! The security log is the per-installation audit trail: append-only,
//! never mutated or deleted, with a chained integrity hash per entry.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use helioguard_core::types::{DbId, Timestamp};

/// A row from the `security_logs` table. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SecurityLog {
    pub id: DbId,
    pub installation_id: DbId,
    pub occurred_at: Timestamp,
    pub activity_type: String,
    pub details: String,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub actor: String,
    /// SHA-256 chained over the previous entry's hash and this entry's data.
    pub integrity_hash: String,
}

/// DTO for appending a security log entry.
///
/// The integrity hash is computed at insert time from the previous entry,
/// so it is not part of the DTO.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSecurityLog {
    pub installation_id: DbId,
    pub activity_type: String,
    pub details: String,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub actor: String,
}
