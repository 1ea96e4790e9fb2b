//! Tamper event lifecycle service.
//!
//! Event creation and resolution are the two points where the aggregate
//! tamper flag on the installation must stay consistent with the event
//! rows, so both run as single transactions together with their security
//! log entries: a reader never observes an event without its audit trail,
//! or a tamper flag disagreeing with the unresolved set.

use helioguard_core::audit::{activity_types, SYSTEM_ACTOR};
use helioguard_core::error::CoreError;
use helioguard_core::severity;
use helioguard_core::tamper::{TamperEventStatus, TamperEventType, TamperSeverity};
use helioguard_core::types::{DbId, Timestamp};

use helioguard_db::models::security_log::CreateSecurityLog;
use helioguard_db::models::tamper_event::{CreateTamperEvent, TamperEvent};
use helioguard_db::repositories::{InstallationRepo, SecurityLogRepo, TamperEventRepo};
use helioguard_db::DbPool;

use crate::error::DetectionResult;

/// Default page size for event listings.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for event listings.
const MAX_LIMIT: i64 = 500;

/// Detection-time fields for a new tamper event.
#[derive(Debug, Clone)]
pub struct NewTamperEvent {
    pub installation_id: DbId,
    pub event_type: TamperEventType,
    pub severity: TamperSeverity,
    pub confidence: f64,
    pub description: String,
    pub raw_sensor_data: Option<String>,
}

#[derive(Clone)]
pub struct TamperEventService {
    pool: DbPool,
}

impl TamperEventService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist a detection as a `new` event.
    ///
    /// Validates the confidence score, applies the false-positive filter
    /// (filtered readings return `Ok(None)` with no side effects at all),
    /// then atomically inserts the event, raises the installation's tamper
    /// flag, and appends the audit entry.
    pub async fn create(&self, new_event: NewTamperEvent) -> DetectionResult<Option<TamperEvent>> {
        severity::validate_confidence(new_event.confidence)?;

        if severity::is_likely_false_positive(new_event.confidence) {
            tracing::info!(
                installation_id = new_event.installation_id,
                event_type = %new_event.event_type,
                confidence = new_event.confidence,
                "Detection discarded as likely false positive"
            );
            return Ok(None);
        }

        if !InstallationRepo::exists(&self.pool, new_event.installation_id).await? {
            return Err(CoreError::NotFound {
                entity: "Installation",
                id: new_event.installation_id,
            }
            .into());
        }

        let dto = CreateTamperEvent {
            installation_id: new_event.installation_id,
            event_type: new_event.event_type.as_str().to_string(),
            severity: new_event.severity.as_str().to_string(),
            confidence_score: new_event.confidence,
            description: new_event.description,
            raw_sensor_data: new_event.raw_sensor_data,
        };

        let mut tx = self.pool.begin().await?;
        let event = TamperEventRepo::insert(&mut tx, &dto).await?;
        InstallationRepo::flag_tampering(&mut tx, event.installation_id).await?;
        SecurityLogRepo::append(
            &mut tx,
            &CreateSecurityLog {
                installation_id: event.installation_id,
                activity_type: activity_types::ALERT_GENERATED.to_string(),
                details: format!(
                    "Tamper event created: {} with severity {} (event id {})",
                    event.event_type, event.severity, event.id
                ),
                ip_address: None,
                location: None,
                actor: SYSTEM_ACTOR.to_string(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            event_id = event.id,
            installation_id = event.installation_id,
            event_type = %event.event_type,
            severity = %event.severity,
            confidence = event.confidence_score,
            "Tamper event created"
        );

        Ok(Some(event))
    }

    /// Fetch an event by id.
    pub async fn get(&self, event_id: DbId) -> DetectionResult<TamperEvent> {
        TamperEventRepo::find_by_id(&self.pool, event_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "TamperEvent",
                    id: event_id,
                }
                .into()
            })
    }

    /// Move an event from `new` to `acknowledged`.
    pub async fn acknowledge(&self, event_id: DbId, actor: &str) -> DetectionResult<TamperEvent> {
        let event = self.get(event_id).await?;
        self.check_transition(&event, TamperEventStatus::Acknowledged)?;

        let mut tx = self.pool.begin().await?;
        let updated =
            TamperEventRepo::set_status(&mut tx, event_id, TamperEventStatus::Acknowledged.as_str())
                .await?;
        SecurityLogRepo::append(
            &mut tx,
            &CreateSecurityLog {
                installation_id: updated.installation_id,
                activity_type: activity_types::ALERT_ACKNOWLEDGED.to_string(),
                details: format!(
                    "Tamper event status updated to: acknowledged (event id {event_id})"
                ),
                ip_address: None,
                location: None,
                actor: actor.to_string(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(event_id, actor, "Tamper event acknowledged");
        Ok(updated)
    }

    /// Resolve an event, recomputing the installation's aggregate flag.
    ///
    /// The recount happens in the same transaction as the resolve itself,
    /// derived directly from the unresolved set, so concurrent resolutions
    /// for the same installation cannot leave the flag stale in either
    /// direction.
    pub async fn resolve(
        &self,
        event_id: DbId,
        actor: &str,
        resolution_notes: Option<&str>,
    ) -> DetectionResult<TamperEvent> {
        let event = self.get(event_id).await?;
        self.check_transition(&event, TamperEventStatus::Resolved)?;

        let mut tx = self.pool.begin().await?;
        let resolved =
            TamperEventRepo::mark_resolved(&mut tx, event_id, actor, resolution_notes).await?;
        let flag_still_set =
            InstallationRepo::recompute_tamper_flag(&mut tx, resolved.installation_id).await?;
        SecurityLogRepo::append(
            &mut tx,
            &CreateSecurityLog {
                installation_id: resolved.installation_id,
                activity_type: activity_types::ALERT_ACKNOWLEDGED.to_string(),
                details: format!("Tamper event status updated to: resolved (event id {event_id})"),
                ip_address: None,
                location: None,
                actor: actor.to_string(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            event_id,
            installation_id = resolved.installation_id,
            actor,
            tamper_flag = flag_still_set,
            "Tamper event resolved"
        );
        Ok(resolved)
    }

    /// List events for an installation, most recent first.
    pub async fn list_for_installation(
        &self,
        installation_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> DetectionResult<Vec<TamperEvent>> {
        if !InstallationRepo::exists(&self.pool, installation_id).await? {
            return Err(CoreError::NotFound {
                entity: "Installation",
                id: installation_id,
            }
            .into());
        }
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        Ok(
            TamperEventRepo::list_for_installation(&self.pool, installation_id, limit, offset)
                .await?,
        )
    }

    /// List unresolved events, optionally filtered by a severity set,
    /// highest severity first.
    pub async fn list_unresolved(
        &self,
        severities: Option<&[TamperSeverity]>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> DetectionResult<Vec<TamperEvent>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let names: Option<Vec<String>> =
            severities.map(|set| set.iter().map(|s| s.as_str().to_string()).collect());
        Ok(
            TamperEventRepo::list_unresolved(&self.pool, names.as_deref(), limit, offset)
                .await?,
        )
    }

    /// List events for an installation within a time range.
    pub async fn list_in_range(
        &self,
        installation_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> DetectionResult<Vec<TamperEvent>> {
        Ok(
            TamperEventRepo::list_for_installation_in_range(&self.pool, installation_id, from, to)
                .await?,
        )
    }

    /// Count unresolved events for an installation.
    pub async fn count_unresolved(&self, installation_id: DbId) -> DetectionResult<i64> {
        Ok(TamperEventRepo::count_unresolved(&self.pool, installation_id).await?)
    }

    /// Reject illegal lifecycle transitions with a conflict error.
    fn check_transition(
        &self,
        event: &TamperEvent,
        to: TamperEventStatus,
    ) -> Result<(), CoreError> {
        let current = TamperEventStatus::parse(&event.status)?;
        if !current.can_transition_to(to) {
            return Err(CoreError::Conflict(format!(
                "Tamper event {} cannot move from {} to {}",
                event.id, current, to
            )));
        }
        Ok(())
    }
}
