//! Tamper detection daemon.
//!
//! Wires the detection pipeline together: database pool + migrations,
//! notification dispatcher selection, the automatic-response worker pool,
//! and the periodic maintenance loops. Shuts down gracefully on ctrl-c.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helioguard_detection::notify::{EmailConfig, LogNotifier, NotificationDispatcher, SmtpNotifier};
use helioguard_detection::{scheduler, ResponseQueue, TamperDetection, TamperResponseService};

mod config;

use config::SentinelConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel=debug,helioguard_detection=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = SentinelConfig::from_env();
    tracing::info!(
        response_workers = config.response_workers,
        queue_capacity = config.response_queue_capacity,
        "Loaded daemon configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = helioguard_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    helioguard_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    helioguard_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Notification dispatcher ---
    let notifier: Arc<dyn NotificationDispatcher> = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(host = %email_config.smtp_host, "SMTP notifier configured");
            Arc::new(SmtpNotifier::new(email_config))
        }
        None => {
            tracing::info!("SMTP not configured, notifications will be logged only");
            Arc::new(LogNotifier)
        }
    };

    // --- Response worker pool ---
    let cancel = CancellationToken::new();
    let responses = TamperResponseService::new(pool.clone(), notifier);
    let (queue, mut handles) = ResponseQueue::start(
        responses,
        config.response_workers,
        config.response_queue_capacity,
        cancel.clone(),
    );

    // --- Pipeline + maintenance loops ---
    let pipeline = TamperDetection::new(pool.clone(), queue);

    if config.maintenance_enabled {
        handles.push(tokio::spawn(scheduler::escalate_unresolved(
            pool.clone(),
            cancel.clone(),
        )));
        handles.push(tokio::spawn(scheduler::reconcile_monitoring(
            pipeline.clone(),
            pool.clone(),
            cancel.clone(),
        )));
        handles.push(tokio::spawn(scheduler::daily_diagnostics(
            pipeline.clone(),
            pool.clone(),
            cancel.clone(),
        )));
        tracing::info!("Maintenance loops started (escalation, reconciliation, diagnostics)");
    }

    tracing::info!("Tamper detection daemon running");

    // --- Shutdown ---
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl-c");
    tracing::info!("Shutdown signal received");

    cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("Tamper detection daemon stopped");
}
