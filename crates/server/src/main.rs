mod audit;
mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use balloonbot_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use balloonbot_core::config::LogFormat::*;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.trim().to_ascii_lowercase()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            return Err(error.into());
        }
    }

    // Config first so logging follows its level and format.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let polling = health::PollingStatus::default();

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.sessions.clone(),
        polling.clone(),
    )
    .await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        transport_mode = health::TRANSPORT_MODE,
        bot_username = app.bot.username.as_deref().unwrap_or("unknown"),
        "balloonbot-server started"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let runner = app.runner;
    let mut runner_task = tokio::spawn(async move {
        runner
            .run_until(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        joined = &mut runner_task => {
            polling.mark_stopped();
            let stats = joined??;
            tracing::warn!(
                event_name = "system.server.polling_ended",
                correlation_id = "runtime",
                updates_received = stats.updates_received,
                "telegram update stream ended unexpectedly"
            );
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "balloonbot-server stopping"
            );
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(grace, &mut runner_task).await {
                Ok(joined) => {
                    let stats = joined??;
                    tracing::info!(
                        event_name = "system.server.stopped",
                        correlation_id = "shutdown",
                        updates_received = stats.updates_received,
                        replies_sent = stats.replies_sent,
                        "polling loop drained"
                    );
                }
                Err(_) => {
                    runner_task.abort();
                    tracing::warn!(
                        event_name = "system.server.stopped",
                        correlation_id = "shutdown",
                        "polling loop did not drain in time; aborted"
                    );
                }
            }
            polling.mark_stopped();
        }
    }

    Ok(())
}
