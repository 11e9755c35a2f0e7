use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_core::clock::SystemClock;
use atelier_db::PgStore;
use atelier_events::{EmailConfig, EmailDelivery, EventBus, EventPersistence, NotificationRouter};
use atelier_scheduler::{ReminderConfig, ReminderSweep};
use atelier_worker::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "atelier_worker=debug,atelier_scheduler=debug,atelier_events=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env()?;
    let reminder_config = ReminderConfig::from_env();
    tracing::info!(
        max_connections = config.max_connections,
        reminder_horizon_minutes = reminder_config.horizon.num_minutes(),
        reminder_interval_secs = reminder_config.interval.as_secs(),
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = atelier_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    atelier_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    atelier_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Spawn event persistence (writes all events to the database).
    let persistence_handle = tokio::spawn(EventPersistence::run(pool.clone(), event_bus.subscribe()));

    // Spawn notification router (in-app rows, plus email when SMTP is configured).
    let email = EmailConfig::from_env().map(EmailDelivery::new);
    if email.is_none() {
        tracing::info!("SMTP_HOST not set, email notifications disabled");
    }
    let router = NotificationRouter::new(pool.clone(), email);
    let router_handle = tokio::spawn(router.run(event_bus.subscribe()));

    // Spawn the reminder sweep.
    let cancel = CancellationToken::new();
    let sweep = ReminderSweep::new(
        Arc::new(PgStore::new(pool.clone())),
        event_bus.clone(),
        Arc::new(SystemClock),
        reminder_config,
    );
    let sweep_cancel = cancel.clone();
    let sweep_handle = tokio::spawn(async move {
        sweep.run(sweep_cancel).await;
    });

    tracing::info!("Worker started (persistence, notification router, reminder sweep)");

    shutdown_signal().await;

    // Stop producers first so the bus drains before its consumers exit.
    cancel.cancel();
    let _ = tokio::time::timeout(config.shutdown_timeout, sweep_handle).await;
    tracing::info!("Reminder sweep stopped");

    // Dropping the last sender closes the channel and ends both consumers.
    drop(event_bus);
    let _ = tokio::time::timeout(config.shutdown_timeout, persistence_handle).await;
    let _ = tokio::time::timeout(config.shutdown_timeout, router_handle).await;
    tracing::info!("Event services shut down");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
