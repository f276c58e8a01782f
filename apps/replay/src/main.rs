use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use presence_client::{DiscordIpcConnector, LogOnlyConnector, PresenceConnector};
use presence_core::{
    load_settings, load_settings_from, PresencePlugin, PresenceService, SystemClock,
    TokioTimers, PLUGIN_INFO,
};
use shared::domain::Address;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod trace;

use trace::{load_trace, TraceEvent, TraceHost};

/// Replays a recorded navigation trace through the presence controller.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    trace: PathBuf,
    /// Settings file; defaults to ./ida_presence.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log payloads instead of talking to Discord.
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    client_id: Option<String>,
    /// How long to keep running after the last event; defaults to the throttle plus one second.
    #[arg(long)]
    linger_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    if let Some(client_id) = args.client_id {
        settings.client_id = client_id;
    }
    let linger = args
        .linger_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.throttle_interval() + Duration::from_secs(1));

    let trace = load_trace(&args.trace)?;
    info!(
        plugin = PLUGIN_INFO.name,
        version = PLUGIN_INFO.version,
        binary = %trace.binary,
        events = trace.events.len(),
        dry_run = args.dry_run,
        "replaying trace"
    );

    let connector: Arc<dyn PresenceConnector> = if args.dry_run {
        Arc::new(LogOnlyConnector)
    } else {
        Arc::new(DiscordIpcConnector)
    };
    let host = Arc::new(TraceHost::new(&trace));
    let service = PresenceService::new(
        settings,
        connector,
        host.clone(),
        Arc::new(TokioTimers::new()),
        Arc::new(SystemClock),
    );

    let mut plugin = PresencePlugin::new(service);
    plugin.init();
    let service = plugin.into_service();
    let handle = service.handle();

    let feeder = tokio::spawn(async move {
        let origin = Instant::now();
        for event in trace.events {
            sleep_until(origin + event.at()).await;
            match event {
                TraceEvent::Focus { address, .. } => host.navigate(Address(address)),
                TraceEvent::Toggle { .. } => {
                    handle.toggle();
                }
            }
        }
        sleep(linger).await;
        handle.shutdown();
    });

    service.run().await;
    feeder.await?;
    info!("replay finished");
    Ok(())
}
