//! Tamper response orchestration.
//!
//! Maps event severity to an automatic action through the core response
//! plan table, records every action as a `TamperResponse` row, and pushes
//! notifications through the delivery boundary. A delivery failure is data
//! (`success = false` + `failure_reason`), never an error: a failed
//! notification must not undo or block a real detection.

use std::sync::Arc;

use helioguard_core::audit::{activity_types, SYSTEM_ACTOR};
use helioguard_core::error::CoreError;
use helioguard_core::response_plan;
use helioguard_core::tamper::{ResponseType, TamperSeverity};
use helioguard_core::types::{DbId, Timestamp};

use helioguard_db::models::tamper_event::TamperEvent;
use helioguard_db::models::tamper_response::TamperResponse;
use helioguard_db::repositories::{TamperEventRepo, TamperResponseRepo};
use helioguard_db::DbPool;

use crate::alert_config::AlertConfigService;
use crate::error::DetectionResult;
use crate::notify::NotificationDispatcher;
use crate::security_log::SecurityLogService;

#[derive(Clone)]
pub struct TamperResponseService {
    pool: DbPool,
    alert_configs: AlertConfigService,
    security_logs: SecurityLogService,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl TamperResponseService {
    pub fn new(pool: DbPool, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        let alert_configs = AlertConfigService::new(pool.clone());
        let security_logs = SecurityLogService::new(pool.clone());
        Self {
            pool,
            alert_configs,
            security_logs,
            notifier,
        }
    }

    /// Execute the severity-mapped automatic response for an event.
    ///
    /// A no-op (logged, `Ok(None)`) when the installation has opted out of
    /// automatic responses. Otherwise records exactly one planned response
    /// and then attempts the notification.
    pub async fn execute_automatic_response(
        &self,
        event_id: DbId,
    ) -> DetectionResult<Option<TamperResponse>> {
        let event = self.find_event(event_id).await?;

        if !self
            .alert_configs
            .is_auto_response_enabled(event.installation_id)
            .await?
        {
            tracing::info!(
                event_id,
                installation_id = event.installation_id,
                "Auto-response disabled, skipping"
            );
            return Ok(None);
        }

        let severity = TamperSeverity::parse(&event.severity)?;
        let plan = response_plan::automatic_response(severity);

        let response = self
            .record(
                &event,
                plan.response_type,
                true,
                None,
                SYSTEM_ACTOR,
                Some(plan.details),
            )
            .await?;

        self.send_notification(event_id, plan.response_type.as_str())
            .await?;

        Ok(Some(response))
    }

    /// Send (and record) the notification for an event.
    ///
    /// Idempotent per `(event, notification_sent)`: a second call finds the
    /// existing response row and does nothing.
    pub async fn send_notification(
        &self,
        event_id: DbId,
        notification_type: &str,
    ) -> DetectionResult<()> {
        let event = self.find_event(event_id).await?;

        let already_sent = TamperResponseRepo::exists_for_event_and_type(
            &self.pool,
            event_id,
            ResponseType::NotificationSent.as_str(),
        )
        .await?;
        if already_sent {
            tracing::debug!(event_id, "Notification already recorded, skipping");
            return Ok(());
        }

        let channels = self
            .alert_configs
            .get_or_create_default(event.installation_id)
            .await?
            .channels();

        // Best-effort fan-out; the first failure is captured on the row.
        let mut failure: Option<String> = None;
        for channel in &channels {
            if let Err(e) = self.notifier.send(&event, channel).await {
                tracing::warn!(
                    event_id,
                    channel = channel.as_str(),
                    error = %e,
                    "Notification delivery failed"
                );
                failure.get_or_insert_with(|| format!("{channel}: {e}"));
            }
        }

        let details = format!(
            "Notification sent: {notification_type} for tamper event: {} with severity: {}",
            event.event_type, event.severity
        );
        self.record(
            &event,
            ResponseType::NotificationSent,
            failure.is_none(),
            failure.as_deref(),
            SYSTEM_ACTOR,
            Some(&details),
        )
        .await?;

        Ok(())
    }

    /// Record an administrator-invoked response. No severity mapping, no
    /// idempotence guard.
    pub async fn create_manual_response(
        &self,
        event_id: DbId,
        response_type: ResponseType,
        executed_by: &str,
        details: Option<&str>,
    ) -> DetectionResult<TamperResponse> {
        let event = self.find_event(event_id).await?;
        self.record(&event, response_type, true, None, executed_by, details)
            .await
    }

    /// Fetch a response by id.
    pub async fn get(&self, response_id: DbId) -> DetectionResult<TamperResponse> {
        TamperResponseRepo::find_by_id(&self.pool, response_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "TamperResponse",
                    id: response_id,
                }
                .into()
            })
    }

    /// List responses for an event, most recent first.
    pub async fn list_for_event(&self, event_id: DbId) -> DetectionResult<Vec<TamperResponse>> {
        self.find_event(event_id).await?;
        Ok(TamperResponseRepo::list_for_event(&self.pool, event_id).await?)
    }

    /// List responses for an event with the given type.
    pub async fn list_for_event_by_type(
        &self,
        event_id: DbId,
        response_type: ResponseType,
    ) -> DetectionResult<Vec<TamperResponse>> {
        Ok(TamperResponseRepo::list_for_event_by_type(
            &self.pool,
            event_id,
            response_type.as_str(),
        )
        .await?)
    }

    /// List responses executed within a time range.
    pub async fn list_in_range(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> DetectionResult<Vec<TamperResponse>> {
        Ok(TamperResponseRepo::list_in_range(&self.pool, from, to).await?)
    }

    /// Count successful responses recorded for an event.
    pub async fn count_successful(&self, event_id: DbId) -> DetectionResult<i64> {
        Ok(TamperResponseRepo::count_successful(&self.pool, event_id).await?)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn find_event(&self, event_id: DbId) -> DetectionResult<TamperEvent> {
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

    /// Insert the response row and append its audit entry.
    ///
    /// Notification responses log as alert activity; everything else is
    /// system activity.
    async fn record(
        &self,
        event: &TamperEvent,
        response_type: ResponseType,
        success: bool,
        failure_reason: Option<&str>,
        executed_by: &str,
        details: Option<&str>,
    ) -> DetectionResult<TamperResponse> {
        let response = TamperResponseRepo::insert(
            &self.pool,
            event.id,
            response_type.as_str(),
            success,
            failure_reason,
            executed_by,
            details,
        )
        .await?;

        let activity = if response_type == ResponseType::NotificationSent {
            activity_types::ALERT_GENERATED
        } else {
            activity_types::SYSTEM_DIAGNOSTIC
        };
        self.security_logs
            .create(
                event.installation_id,
                activity,
                format!(
                    "Tamper response executed: {} for tamper event id {}",
                    response_type, event.id
                ),
                Some(executed_by),
            )
            .await?;

        tracing::info!(
            event_id = event.id,
            response_id = response.id,
            response_type = %response_type,
            success,
            "Tamper response recorded"
        );
        Ok(response)
    }
}
