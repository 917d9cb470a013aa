//! Media tracking demo entry point
//!
//! Tracks the given files, marks the ones named with `--fail` as failed and
//! prints the resulting summary.

use actor_runtime::{ActorSystem, RuntimeConfig};
use clap::Parser;
use media_tracking::{spawn_tracking_actor, MediaTrackingFacade, TrackingEvent};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Runtime configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay, e.g. `test` loads `<config>.test.toml`
    #[arg(short, long)]
    env: Option<String>,

    /// Files that should be reported as failed
    #[arg(long)]
    fail: Vec<String>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Media files to track
    #[arg(required = true)]
    files: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_tracking=info,actor_runtime=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting media tracking demo");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = RuntimeConfig::load(args.config.as_deref(), args.env.as_deref())?;
    let system = ActorSystem::with_config("media-tracking", config)?;
    spawn_tracking_actor(&system)?;

    let tracking = MediaTrackingFacade::from_system(&system);
    let failing: HashSet<&str> = args.fail.iter().map(String::as_str).collect();

    for file in &args.files {
        let id = tracking.create_entry(file.as_str()).await?;
        if failing.contains(file.as_str()) {
            tracking.notify_event(&id, TrackingEvent::failure("PROCESSING_FAILED", "marked as failed"));
        } else {
            let destination = format!("/library/{}", file.trim_start_matches('/'));
            tracking.notify_event(
                &id,
                TrackingEvent::new("DESTINATION", "moved to library").with_destination(destination),
            );
        }
    }

    let summary = tracking.summary().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "tracked {} files: {} succeeded, {} failed",
            summary.total(),
            summary.successes.len(),
            summary.failures.len()
        );
        for id in &summary.failures {
            if let Some(info) = tracking.lookup(id).await? {
                println!("  failed: {}", info.media_file.source_path);
            }
        }
    }

    let stats = system.stats();
    if stats.undeliverable_messages > 0 {
        warn!(undeliverable = stats.undeliverable_messages, "Some messages were not delivered");
    }

    system.shutdown().await?;
    Ok(())
}
