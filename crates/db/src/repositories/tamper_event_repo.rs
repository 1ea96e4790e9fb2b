//! Repository for the `tamper_events` table.

use sqlx::PgPool;

use helioguard_core::types::{DbId, Timestamp};

use crate::models::tamper_event::{CreateTamperEvent, TamperEvent};

/// Column list for `tamper_events` SELECT queries.
const COLUMNS: &str = "\
    id, installation_id, event_type, severity, confidence_score, \
    description, raw_sensor_data, status, resolved, resolved_at, \
    resolved_by, resolution_notes, occurred_at, created_at";

/// Severity is stored as text; this expression ranks it for ordering.
const SEVERITY_RANK: &str = "\
    CASE severity \
        WHEN 'critical' THEN 4 \
        WHEN 'high' THEN 3 \
        WHEN 'medium' THEN 2 \
        ELSE 1 \
    END";

/// Provides insert, lifecycle, and query operations for tamper events.
pub struct TamperEventRepo;

impl TamperEventRepo {
    /// Insert a new event with `new` status.
    ///
    /// Runs inside the detection transaction together with the tamper flag
    /// update and the security log entry.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        dto: &CreateTamperEvent,
    ) -> Result<TamperEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO tamper_events \
                 (installation_id, event_type, severity, confidence_score, \
                  description, raw_sensor_data, status) \
             VALUES ($1, $2, $3, $4, $5, $6, 'new') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TamperEvent>(&query)
            .bind(dto.installation_id)
            .bind(&dto.event_type)
            .bind(&dto.severity)
            .bind(dto.confidence_score)
            .bind(&dto.description)
            .bind(&dto.raw_sensor_data)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find an event by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TamperEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tamper_events WHERE id = $1");
        sqlx::query_as::<_, TamperEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List events for an installation, most recent first.
    pub async fn list_for_installation(
        pool: &PgPool,
        installation_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TamperEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tamper_events \
             WHERE installation_id = $1 \
             ORDER BY occurred_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, TamperEvent>(&query)
            .bind(installation_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List unresolved events, optionally restricted to a severity set,
    /// ordered by severity then recency.
    pub async fn list_unresolved(
        pool: &PgPool,
        severities: Option<&[String]>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TamperEvent>, sqlx::Error> {
        match severities {
            Some(set) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM tamper_events \
                     WHERE resolved = false AND severity = ANY($1) \
                     ORDER BY {SEVERITY_RANK} DESC, occurred_at DESC \
                     LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, TamperEvent>(&query)
                    .bind(set)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM tamper_events \
                     WHERE resolved = false \
                     ORDER BY {SEVERITY_RANK} DESC, occurred_at DESC \
                     LIMIT $1 OFFSET $2"
                );
                sqlx::query_as::<_, TamperEvent>(&query)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// List events for an installation within a time range, most recent first.
    pub async fn list_for_installation_in_range(
        pool: &PgPool,
        installation_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<TamperEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tamper_events \
             WHERE installation_id = $1 AND occurred_at BETWEEN $2 AND $3 \
             ORDER BY occurred_at DESC"
        );
        sqlx::query_as::<_, TamperEvent>(&query)
            .bind(installation_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// List unresolved events in the given severity set older than `cutoff`.
    ///
    /// Used by the escalation loop.
    pub async fn list_unresolved_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
        severities: &[String],
    ) -> Result<Vec<TamperEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tamper_events \
             WHERE resolved = false AND severity = ANY($1) AND occurred_at < $2 \
             ORDER BY occurred_at ASC"
        );
        sqlx::query_as::<_, TamperEvent>(&query)
            .bind(severities)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Count unresolved events for an installation.
    pub async fn count_unresolved(
        pool: &PgPool,
        installation_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tamper_events \
             WHERE installation_id = $1 AND resolved = false",
        )
        .bind(installation_id)
        .fetch_one(pool)
        .await
    }

    /// Update an event's status without touching resolution metadata.
    pub async fn set_status(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        status: &str,
    ) -> Result<TamperEvent, sqlx::Error> {
        let query = format!(
            "UPDATE tamper_events SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TamperEvent>(&query)
            .bind(id)
            .bind(status)
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark an event resolved, setting the full resolution metadata.
    pub async fn mark_resolved(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        resolved_by: &str,
        resolution_notes: Option<&str>,
    ) -> Result<TamperEvent, sqlx::Error> {
        let query = format!(
            "UPDATE tamper_events \
             SET status = 'resolved', resolved = true, resolved_at = NOW(), \
                 resolved_by = $2, resolution_notes = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TamperEvent>(&query)
            .bind(id)
            .bind(resolved_by)
            .bind(resolution_notes)
            .fetch_one(&mut **tx)
            .await
    }
}
