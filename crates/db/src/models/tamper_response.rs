//! Tamper response entity model.
//!
//! Response rows are immutable once created (no updated_at). A single
//! event may accumulate many responses: the automatic one plus any later
//! manual interventions.

use serde::Serialize;
use sqlx::FromRow;

use helioguard_core::types::{DbId, Timestamp};

/// A row from the `tamper_responses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TamperResponse {
    pub id: DbId,
    pub tamper_event_id: DbId,
    pub response_type: String,
    pub executed_at: Timestamp,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub executed_by: String,
    pub details: Option<String>,
}
