use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, error, info, warn};

use crime_oracle::{
    CrimeOracle, MemoryDatabase, Notification, OracleConfig, SystemClock, spawn_sweepers,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - invalid values abort startup
    let config = OracleConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check CRIME_ORACLE_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting Crime Oracle");
    info!(
        "Crime points: destroy={}, theft={}, attack={}, harvest={}",
        config.crime.destroy_points,
        config.crime.theft_points,
        config.crime.attack_points,
        config.crime.harvest_points
    );

    // Initialize components
    let database = MemoryDatabase::new();
    let oracle = Arc::new(CrimeOracle::new(
        config,
        database.stores(),
        Arc::new(SystemClock),
    ));

    let notifications = tokio::spawn(log_notifications(oracle.clone()));
    let sweepers = spawn_sweepers(oracle.clone());

    info!("Crime oracle running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    sweepers.shutdown().await;
    notifications.abort();

    // Final pass so nothing pending is lost on exit
    match oracle.tick() {
        Ok(report) => info!(
            "Final sweep: {} crimes confirmed, {} tags expired",
            report.confirmed_crimes, report.expired_tags
        ),
        Err(e) => error!("Final sweep failed: {}", e),
    }

    let saved = oracle.reputation().save_all()?;
    info!("Saved {} loaded standings", saved);

    Ok(())
}

/// Initialize logging at the configured level
fn init_logging(config: &OracleConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

/// Mirror every notification into the log
async fn log_notifications(oracle: Arc<CrimeOracle>) {
    let mut receiver = oracle.subscribe();

    loop {
        match receiver.recv().await {
            Ok(Notification::TierChanged { actor, old, new }) => {
                info!("Tier changed for {}: {} -> {}", actor, old, new);
            }
            Ok(Notification::CrimeCommitted {
                actor,
                kind,
                points,
                ..
            }) => {
                info!("Crime committed by {}: {} (+{})", actor, kind.description(), points);
            }
            Ok(Notification::PlayerKillResolved {
                killer,
                victim,
                outcome,
                ..
            }) => {
                info!("Kill resolved: {} killed {} ({:?})", killer, victim, outcome);
            }
            Ok(Notification::GoodDeed { .. }) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Notification log lagged, {} skipped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
