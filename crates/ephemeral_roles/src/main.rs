//! Ephemeral Roles bot binary.
//!
//! Startup order: configuration, logging, metrics, platform client, reconciler,
//! gateway client, monitors, admin server. Any failure before the gateway connects
//! exits non-zero. A termination signal closes the gateway, stops the monitors and
//! drains the admin server.

mod observability;
mod webhook;

use clap::Parser;
use ephemeral_bot::{
    AdminState, BotConfig, GuildsMonitor, ListingClient, MembersMonitor, Monitor, MonitorMetrics,
    admin_router, serve_admin, spawn_monitor,
};
use ephemeral_core::StateCache;
use ephemeral_error::{ConfigError, EphemeralResult, HttpError, PlatformError, PlatformErrorKind};
use ephemeral_reconcile::{CommandHandler, OperationsGateway, ReconcileMetrics, Reconciler};
use ephemeral_social::{EphemeralBot, EphemeralHandler, SerenityPlatform};
use observability::{ObservabilityConfig, init_observability, parse_timezone};
use prometheus::Registry;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use webhook::{WEBHOOK_QUEUE, WebhookLayer, forward_to_webhook};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal in production.
    let _ = dotenvy::dotenv();

    let config = BotConfig::parse();
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Ephemeral Roles stopped with an error");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: BotConfig) -> EphemeralResult<()> {
    let webhook = match config.webhook_url() {
        Some(url) => {
            let (layer, rx) = WebhookLayer::channel(WEBHOOK_QUEUE);
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| HttpError::new(format!("Failed to build webhook client: {e}")))?;
            tokio::spawn(forward_to_webhook(client, url.to_string(), rx));
            Some(layer)
        }
        None => None,
    };
    let log_control = init_observability(
        &ObservabilityConfig {
            level: config.log_level,
            json: config.log_json,
            timezone: parse_timezone(config.log_timezone_location.as_deref())?,
        },
        webhook,
    )?;
    info!(?config, version = env!("CARGO_PKG_VERSION"), "Starting Ephemeral Roles");

    let mut signals = ShutdownSignals::install()?;

    let registry = Registry::new();
    let reconcile_metrics = ReconcileMetrics::new(&registry)?;
    let monitor_metrics = MonitorMetrics::new(&registry)?;

    let cache = Arc::new(StateCache::new());
    let platform = Arc::new(SerenityPlatform::new(&config.bot_token));
    let gateway = Arc::new(OperationsGateway::new(
        platform,
        Arc::clone(&cache),
        config.role_settings(),
        config.request_timeout(),
        reconcile_metrics,
    ));
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&gateway),
        config.bot_keyword.clone(),
    ));
    let commands = Arc::new(CommandHandler::new(
        gateway,
        config.command_settings(env!("CARGO_PKG_VERSION")),
        Arc::new(log_control),
    ));

    let mut bot = EphemeralBot::new(
        &config.bot_token,
        EphemeralHandler::new(reconciler, commands),
    )
    .await?;
    let shards = bot.shard_manager();

    let (stop, shutdown) = watch::channel(false);

    let listing = config.listing().map(ListingClient::new).transpose()?;
    let monitors: Vec<Arc<dyn Monitor>> = vec![
        Arc::new(GuildsMonitor::new(
            Arc::clone(&cache),
            monitor_metrics.clone(),
            listing,
        )),
        Arc::new(MembersMonitor::new(Arc::clone(&cache), monitor_metrics)),
    ];
    let monitor_tasks: Vec<_> = monitors
        .into_iter()
        .map(|m| spawn_monitor(m, config.monitor_interval(), shutdown.clone()))
        .collect();

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| HttpError::new(format!("Failed to bind admin port {}: {e}", config.port)))?;
    let admin = tokio::spawn(serve_admin(
        listener,
        admin_router(AdminState::new(cache, registry)),
        shutdown,
        config.shutdown_grace(),
    ));

    let shard_count = config.shards;
    let mut gateway_task = tokio::spawn(async move { bot.start(shard_count).await });

    let outcome: EphemeralResult<()> = tokio::select! {
        signal = signals.recv() => {
            info!(signal, "Shutdown signal received");
            shards.shutdown_all().await;
            match (&mut gateway_task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Gateway closed with an error during shutdown"),
                Err(e) => warn!(error = %e, "Gateway task ended abnormally"),
            }
            Ok(())
        }
        joined = &mut gateway_task => match joined {
            Ok(Ok(())) => {
                warn!("Gateway connection closed without a shutdown signal");
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(e) => Err(PlatformError::new(PlatformErrorKind::Gateway(format!(
                "Gateway task failed: {e}"
            )))
            .into()),
        },
    };

    // Receivers are gone only if every task already exited.
    let _ = stop.send(true);
    for task in monitor_tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "Monitor task ended abnormally");
        }
    }
    match admin.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Admin server stopped with an error"),
        Err(e) => warn!(error = %e, "Admin server task ended abnormally"),
    }

    info!("Ephemeral Roles stopped");
    outcome
}

/// The termination signals the process reacts to.
struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    quit: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn install() -> Result<Self, ConfigError> {
        use tokio::signal::unix::{SignalKind, signal};

        let install = |name: &str, kind: SignalKind| {
            signal(kind)
                .map_err(|e| ConfigError::new(format!("Failed to install {name} handler: {e}")))
        };
        Ok(Self {
            interrupt: install("SIGINT", SignalKind::interrupt())?,
            terminate: install("SIGTERM", SignalKind::terminate())?,
            quit: install("SIGQUIT", SignalKind::quit())?,
            hangup: install("SIGHUP", SignalKind::hangup())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> Result<Self, ConfigError> {
        Ok(Self {})
    }

    /// Name of the first signal received.
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.quit.recv() => "SIGQUIT",
            _ = self.hangup.recv() => "SIGHUP",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
}
