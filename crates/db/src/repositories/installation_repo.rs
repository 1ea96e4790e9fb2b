//! Repository for the `installations` table.
//!
//! The pipeline does not own installation CRUD; it reads rows for
//! existence/status checks and maintains the aggregate tamper flag pair.

use sqlx::PgPool;

use helioguard_core::types::DbId;

use crate::models::installation::Installation;

/// Column list for `installations` SELECT queries.
const COLUMNS: &str = "\
    id, name, location, status, tamper_detected, \
    last_tamper_check, created_at, updated_at";

/// Provides lookups and tamper flag maintenance for installations.
pub struct InstallationRepo;

impl InstallationRepo {
    /// Find an installation by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Installation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM installations WHERE id = $1");
        sqlx::query_as::<_, Installation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether an installation with the given id exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM installations WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// List all installations, oldest first.
    ///
    /// Used by the monitoring reconciliation loop; fleets are small enough
    /// that no pagination is needed there.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Installation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM installations ORDER BY id");
        sqlx::query_as::<_, Installation>(&query).fetch_all(pool).await
    }

    /// Raise the aggregate tamper flag and stamp the last check time.
    ///
    /// Runs inside the event-creation transaction so the flag is never
    /// visible without its triggering event.
    pub async fn flag_tampering(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE installations \
             SET tamper_detected = true, last_tamper_check = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Recompute the aggregate tamper flag from the unresolved event count.
    ///
    /// The flag is derived in a single statement so two concurrent
    /// resolutions cannot both act on a stale count. Returns the new flag
    /// value.
    pub async fn recompute_tamper_flag(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "UPDATE installations \
             SET tamper_detected = EXISTS(\
                     SELECT 1 FROM tamper_events \
                     WHERE installation_id = $1 AND resolved = false), \
                 last_tamper_check = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING tamper_detected",
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await
    }
}
