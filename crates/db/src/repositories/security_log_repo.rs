//! Repository for the `security_logs` table.
//!
//! Entries are append-only. Every insert computes a SHA-256 integrity hash
//! chained from the previous entry, so appends go through a transaction
//! even when the caller has no larger atomic unit.

use sqlx::PgPool;

use helioguard_core::audit;
use helioguard_core::types::{DbId, Timestamp};

use crate::models::security_log::{CreateSecurityLog, SecurityLog};

/// Column list for `security_logs` SELECT queries.
const COLUMNS: &str = "\
    id, installation_id, occurred_at, activity_type, details, \
    ip_address, location, actor, integrity_hash";

/// Provides append and query operations for the security audit trail.
pub struct SecurityLogRepo;

impl SecurityLogRepo {
    /// Append an entry within an existing transaction.
    ///
    /// Reads the previous entry's hash and chains the new one inside the
    /// same transaction as the caller's other writes.
    pub async fn append(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        dto: &CreateSecurityLog,
    ) -> Result<SecurityLog, sqlx::Error> {
        let prev_hash: Option<String> = sqlx::query_scalar(
            "SELECT integrity_hash FROM security_logs ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut **tx)
        .await?;

        let entry = audit::entry_data(
            dto.installation_id,
            &dto.activity_type,
            &dto.details,
            &dto.actor,
        );
        let hash = audit::compute_integrity_hash(prev_hash.as_deref(), &entry);

        let query = format!(
            "INSERT INTO security_logs \
                 (installation_id, activity_type, details, ip_address, \
                  location, actor, integrity_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SecurityLog>(&query)
            .bind(dto.installation_id)
            .bind(&dto.activity_type)
            .bind(&dto.details)
            .bind(&dto.ip_address)
            .bind(&dto.location)
            .bind(&dto.actor)
            .bind(hash)
            .fetch_one(&mut **tx)
            .await
    }

    /// Append a standalone entry in its own transaction.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateSecurityLog,
    ) -> Result<SecurityLog, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let log = Self::append(&mut tx, dto).await?;
        tx.commit().await?;
        Ok(log)
    }

    /// List entries for an installation, most recent first.
    pub async fn list_for_installation(
        pool: &PgPool,
        installation_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SecurityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM security_logs \
             WHERE installation_id = $1 \
             ORDER BY occurred_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, SecurityLog>(&query)
            .bind(installation_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List entries for an installation with the given activity type.
    pub async fn list_by_activity(
        pool: &PgPool,
        installation_id: DbId,
        activity_type: &str,
    ) -> Result<Vec<SecurityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM security_logs \
             WHERE installation_id = $1 AND activity_type = $2 \
             ORDER BY occurred_at DESC"
        );
        sqlx::query_as::<_, SecurityLog>(&query)
            .bind(installation_id)
            .bind(activity_type)
            .fetch_all(pool)
            .await
    }

    /// List entries for an installation within a time range.
    pub async fn list_in_range(
        pool: &PgPool,
        installation_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<SecurityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM security_logs \
             WHERE installation_id = $1 AND occurred_at BETWEEN $2 AND $3 \
             ORDER BY occurred_at DESC"
        );
        sqlx::query_as::<_, SecurityLog>(&query)
            .bind(installation_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }
}
