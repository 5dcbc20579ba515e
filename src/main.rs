//! lumatone-link - find a Lumatone keyboard and keep the link alive

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumatone_link::config::{AppConfig, ConfigWatcher};
use lumatone_link::monitor::{ConnectionMonitor, MonitorEvent, StatusBoard};
use lumatone_link::sniffer;
use lumatone_link::transport::MidirTransport;

/// Lumatone connection monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "lumatone.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// Print SysEx traffic on inputs whose name contains PATTERN (all when empty)
    #[arg(long, value_name = "PATTERN", num_args = 0..=1, default_missing_value = "")]
    sniff: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting lumatone-link v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let (config_watcher, config) = ConfigWatcher::new(args.config.clone()).await?;

    if args.list_ports {
        let mut transport = MidirTransport::new(config.midi.client_name.clone());
        return sniffer::list_ports(&mut transport);
    }

    if let Some(pattern) = args.sniff.as_deref() {
        let mut transport = MidirTransport::new(config.midi.client_name.clone());
        return sniffer::run_cli_sniffer(&mut transport, pattern).await;
    }

    if config_watcher.is_some() {
        info!("Configuration loaded with hot-reload enabled");
    }

    run_monitor(config, config_watcher, shutdown_signal()).await?;

    info!("lumatone-link shutdown complete");
    Ok(())
}

async fn run_monitor(
    config: AppConfig,
    mut config_watcher: Option<ConfigWatcher>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let transport = MidirTransport::new(config.midi.client_name.clone());
    let mut monitor = ConnectionMonitor::new(transport, config.connection.to_monitor_config());
    if let Some((input_id, output_id)) = config.midi.preferred_pair() {
        monitor = monitor.with_preferred_devices(input_id, output_id);
    }

    let status = monitor.status();
    monitor.subscribe(Arc::new(move |event: &MonitorEvent| {
        print_event(&status, event)
    }));

    let mut tick_interval_ms = config.midi.tick_interval_ms;
    let mut ticker = new_ticker(tick_interval_ms);

    monitor.start_detection(Instant::now());
    info!("Looking for a Lumatone...");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                monitor.tick(Instant::now());
            }
            Some(new_config) = next_config(&mut config_watcher) => {
                monitor.apply_config(new_config.connection.to_monitor_config(), Instant::now());

                if new_config.midi.tick_interval_ms != tick_interval_ms {
                    tick_interval_ms = new_config.midi.tick_interval_ms;
                    ticker = new_ticker(tick_interval_ms);
                }
                if new_config.midi.client_name != config.midi.client_name {
                    warn!("midi.client_name changes take effect after a restart");
                }
            }
            _ = &mut shutdown => break,
        }
    }

    monitor.stop_monitoring();
    Ok(())
}

fn new_ticker(interval_ms: u64) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => std::future::pending().await,
    }
}

fn print_event(status: &StatusBoard, event: &MonitorEvent) {
    match event {
        MonitorEvent::ConnectionEstablished { .. } => {
            let current = status.current();
            println!(
                "{} {} / {}",
                "Connected:".bold().green(),
                current.input_name.unwrap_or_default(),
                current.output_name.unwrap_or_default()
            );
        }
        MonitorEvent::FirmwareVersionResolved { version, release } => {
            println!(
                "{} {} (release {})",
                "Firmware:".bold().cyan(),
                version,
                release
            );
        }
        MonitorEvent::ConnectionLost => println!("{}", "Connection lost".bold().red()),
        MonitorEvent::ConnectionFailed | MonitorEvent::StateChanged(_) => {}
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
