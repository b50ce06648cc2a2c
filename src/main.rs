//! Curator - capability registry and discovery
//!
//! "Every capability in its place"

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator::{
    config::{Args, LogFormat},
    manifest, Curator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("curator={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Curator - Capability Registry");
    info!("  \"Every capability in its place\"");
    info!("======================================");
    info!("Heartbeat interval: {}s", args.heartbeat_interval_seconds);
    info!(
        "Degraded after {} missed beats, evicted after {}",
        args.degraded_after_missed_beats, args.evicted_after_missed_beats
    );
    info!("Shared realm: {}", args.shared_realm);
    match &args.access_map_path {
        Some(path) => info!("Access map: {}", path.display()),
        None => warn!("No access map configured; mapped consumers are denied everything"),
    }
    info!("======================================");

    let access_map = args.access_map()?;
    let curator = Curator::new(args.curator_config(), access_map)?;
    curator.start().await?;

    if let Some(path) = &args.manifest_path {
        let records = manifest::load_manifest(path)?;
        let total = records.len();
        let accepted = manifest::register_all(&curator, records);
        info!("Manifest: registered {}/{} capabilities", accepted, total);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    curator.shutdown().await;

    if let Some(path) = &args.snapshot_path {
        if let Err(e) = manifest::write_snapshot(path, &curator.snapshot()) {
            error!("Failed to write snapshot: {}", e);
        }
    }

    info!("Curator exited cleanly");
    Ok(())
}
