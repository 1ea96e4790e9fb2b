//! Repository for the `tamper_responses` table.

use sqlx::PgPool;

use helioguard_core::types::{DbId, Timestamp};

use crate::models::tamper_response::TamperResponse;

/// Column list for `tamper_responses` SELECT queries.
const COLUMNS: &str = "\
    id, tamper_event_id, response_type, executed_at, success, \
    failure_reason, executed_by, details";

/// Provides insert and query operations for tamper responses.
pub struct TamperResponseRepo;

impl TamperResponseRepo {
    /// Record a response action for an event.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        pool: &PgPool,
        tamper_event_id: DbId,
        response_type: &str,
        success: bool,
        failure_reason: Option<&str>,
        executed_by: &str,
        details: Option<&str>,
    ) -> Result<TamperResponse, sqlx::Error> {
        let query = format!(
            "INSERT INTO tamper_responses \
                 (tamper_event_id, response_type, success, failure_reason, \
                  executed_by, details) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TamperResponse>(&query)
            .bind(tamper_event_id)
            .bind(response_type)
            .bind(success)
            .bind(failure_reason)
            .bind(executed_by)
            .bind(details)
            .fetch_one(pool)
            .await
    }

    /// Find a response by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TamperResponse>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tamper_responses WHERE id = $1");
        sqlx::query_as::<_, TamperResponse>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List responses for an event, most recent first.
    pub async fn list_for_event(
        pool: &PgPool,
        tamper_event_id: DbId,
    ) -> Result<Vec<TamperResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tamper_responses \
             WHERE tamper_event_id = $1 \
             ORDER BY executed_at DESC"
        );
        sqlx::query_as::<_, TamperResponse>(&query)
            .bind(tamper_event_id)
            .fetch_all(pool)
            .await
    }

    /// List responses for an event with the given type.
    pub async fn list_for_event_by_type(
        pool: &PgPool,
        tamper_event_id: DbId,
        response_type: &str,
    ) -> Result<Vec<TamperResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tamper_responses \
             WHERE tamper_event_id = $1 AND response_type = $2 \
             ORDER BY executed_at DESC"
        );
        sqlx::query_as::<_, TamperResponse>(&query)
            .bind(tamper_event_id)
            .bind(response_type)
            .fetch_all(pool)
            .await
    }

    /// Whether a response of the given type already exists for an event.
    ///
    /// Backs the notification idempotence check.
    pub async fn exists_for_event_and_type(
        pool: &PgPool,
        tamper_event_id: DbId,
        response_type: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(\
                 SELECT 1 FROM tamper_responses \
                 WHERE tamper_event_id = $1 AND response_type = $2)",
        )
        .bind(tamper_event_id)
        .bind(response_type)
        .fetch_one(pool)
        .await
    }

    /// List responses executed within a time range.
    pub async fn list_in_range(
        pool: &PgPool,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<TamperResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tamper_responses \
             WHERE executed_at BETWEEN $1 AND $2 \
             ORDER BY executed_at DESC"
        );
        sqlx::query_as::<_, TamperResponse>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Count successful responses recorded for an event.
    pub async fn count_successful(
        pool: &PgPool,
        tamper_event_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tamper_responses \
             WHERE tamper_event_id = $1 AND success = true",
        )
        .bind(tamper_event_id)
        .fetch_one(pool)
        .await
    }
}
