//! Periodic maintenance loops.
//!
//! Each loop is a long-running async function intended to be spawned via
//! `tokio::spawn` by the daemon binary. All loops accept a
//! [`CancellationToken`] for graceful shutdown and log (rather than
//! propagate) per-cycle failures so one bad cycle never kills the loop.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use helioguard_core::audit::activity_types;
use helioguard_core::tamper::TamperSeverity;
use helioguard_db::models::installation::statuses;
use helioguard_db::repositories::{InstallationRepo, MonitoringStatusRepo, TamperEventRepo};
use helioguard_db::DbPool;

use crate::pipeline::TamperDetection;
use crate::security_log::SecurityLogService;

/// How often the escalation check runs, and how old an unresolved event
/// must be before it escalates.
const ESCALATION_INTERVAL: Duration = Duration::from_secs(4 * 3600);
const ESCALATION_AGE_HOURS: i64 = 4;

/// How often monitoring state is reconciled against installation status.
const RECONCILE_INTERVAL: Duration = Duration::from_secs(3600);

/// How often diagnostics run across the monitored fleet.
const DIAGNOSTICS_INTERVAL: Duration = Duration::from_secs(24 * 3600);

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

/// Escalate long-unresolved high and critical events.
///
/// Appends an `alert_generated` ESCALATION entry to the security log for
/// every unresolved high/critical event older than four hours.
pub async fn escalate_unresolved(pool: DbPool, cancel: CancellationToken) {
    let security_logs = SecurityLogService::new(pool.clone());
    let severities: Vec<String> = [TamperSeverity::High, TamperSeverity::Critical]
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();

    tracing::info!(
        interval_secs = ESCALATION_INTERVAL.as_secs(),
        "Escalation loop started"
    );
    let mut interval = tokio::time::interval(ESCALATION_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Escalation loop stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::hours(ESCALATION_AGE_HOURS);
                let stale = match TamperEventRepo::list_unresolved_older_than(
                    &pool, cutoff, &severities,
                )
                .await
                {
                    Ok(events) => events,
                    Err(e) => {
                        tracing::error!(error = %e, "Escalation query failed");
                        continue;
                    }
                };

                for event in stale {
                    tracing::info!(
                        event_id = event.id,
                        severity = %event.severity,
                        "Escalating unresolved tamper event"
                    );
                    let details = format!(
                        "ESCALATION: Unresolved {} tamper event from {} - {}",
                        event.severity, event.occurred_at, event.description
                    );
                    if let Err(e) = security_logs
                        .create(
                            event.installation_id,
                            activity_types::ALERT_GENERATED,
                            details,
                            None,
                        )
                        .await
                    {
                        tracing::error!(
                            event_id = event.id,
                            error = %e,
                            "Failed to record escalation"
                        );
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Monitoring reconciliation
// ---------------------------------------------------------------------------

/// Keep monitoring state aligned with installation status.
///
/// Active installations should be monitored; suspended or maintenance
/// installations should not. Runs hourly.
pub async fn reconcile_monitoring(pipeline: TamperDetection, pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = RECONCILE_INTERVAL.as_secs(),
        "Monitoring reconciliation loop started"
    );
    let mut interval = tokio::time::interval(RECONCILE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Monitoring reconciliation loop stopping");
                break;
            }
            _ = interval.tick() => {
                let installations = match InstallationRepo::list_all(&pool).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to list installations");
                        continue;
                    }
                };

                for installation in installations {
                    let should_monitor = installation.status == statuses::ACTIVE;
                    let is_monitored = match pipeline.is_monitoring(installation.id).await {
                        Ok(flag) => flag,
                        Err(e) => {
                            tracing::error!(
                                installation_id = installation.id,
                                error = %e,
                                "Monitoring status check failed"
                            );
                            continue;
                        }
                    };

                    let result = if should_monitor && !is_monitored {
                        tracing::info!(
                            installation_id = installation.id,
                            "Active installation unmonitored, starting monitoring"
                        );
                        pipeline.start_monitoring(installation.id).await
                    } else if !should_monitor && is_monitored {
                        tracing::info!(
                            installation_id = installation.id,
                            status = %installation.status,
                            "Inactive installation monitored, stopping monitoring"
                        );
                        pipeline.stop_monitoring(installation.id).await
                    } else {
                        Ok(())
                    };

                    if let Err(e) = result {
                        tracing::error!(
                            installation_id = installation.id,
                            error = %e,
                            "Monitoring reconciliation failed"
                        );
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Daily diagnostics
// ---------------------------------------------------------------------------

/// Run diagnostics for every monitored installation once a day.
pub async fn daily_diagnostics(pipeline: TamperDetection, pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = DIAGNOSTICS_INTERVAL.as_secs(),
        "Diagnostics loop started"
    );
    let mut interval = tokio::time::interval(DIAGNOSTICS_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Diagnostics loop stopping");
                break;
            }
            _ = interval.tick() => {
                let monitored = match MonitoringStatusRepo::list_monitored_ids(&pool).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to list monitored installations");
                        continue;
                    }
                };

                for installation_id in monitored {
                    if let Err(e) = pipeline.run_diagnostics(installation_id).await {
                        tracing::error!(
                            installation_id,
                            error = %e,
                            "Diagnostics failed"
                        );
                    }
                }
            }
        }
    }
}
