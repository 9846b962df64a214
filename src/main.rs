//! Alarmwatch - civil-defense alert feed monitor
//!
//! Polls the upstream alert feed, tracks alert state between polls and fans
//! localized notifications out to the console, the desktop and an MQTT bus.
//!
//! Module structure:
//! - `domain/` - Core types (RawAlert, GroupedAlert, NotificationEvent, catalog)
//! - `io/` - External interfaces (feed parser, HTTP poller, sinks, MQTT)
//! - `services/` - Logic (state tracker, grouper, fan-out, monitor)
//! - `infra/` - Infrastructure (Config, Metrics)

use alarmwatch::domain::{LabelCatalog, Language, NotificationEvent};
use alarmwatch::infra::{CliOverrides, Config, Metrics};
use alarmwatch::io::{
    create_egress_channel, ConsoleOptions, ConsoleSink, DesktopSink, HttpPoller, MqttPublisher,
    MqttSink, NoopSink, NotificationSink,
};
use alarmwatch::services::{
    AlarmMonitor, AlertStateTracker, AreaGrouper, DisplayOptions, NotificationFanout,
    TrackerSettings,
};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

const EGRESS_BUFFER: usize = 256;
const DESKTOP_UNSUPPORTED: &str = "Desktop notifications are not supported on this platform";
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Alarmwatch - live alert feed monitor
#[derive(Parser, Debug)]
#[command(name = "alarmwatch", version = VERSION, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Display language for area names and labels
    #[arg(short, long, value_enum)]
    language: Option<Language>,

    /// Polling delay in seconds
    #[arg(long)]
    polling_delay: Option<f64>,

    /// Routine message delay in seconds
    #[arg(long)]
    routine_delay: Option<u64>,

    /// Print the alarm id under each alert
    #[arg(long)]
    alarm_id: bool,

    /// Repeat unchanged alarms on every poll
    #[arg(long)]
    repeat_alarms: bool,

    /// Hide routine and error messages
    #[arg(short, long)]
    quiet: bool,

    /// Show desktop notifications for alerts
    #[arg(long)]
    desktop_notifications: bool,

    /// Highlight labels and areas containing this text
    #[arg(long)]
    highlight: Option<String>,

    /// Reverse displayed text (for terminals without RTL support)
    #[arg(long)]
    reverse: bool,

    /// MQTT broker host; enables MQTT publishing
    #[arg(long)]
    mqtt_server: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    mqtt_port: Option<u16>,

    /// MQTT topic to publish labels on
    #[arg(long)]
    mqtt_topic: Option<String>,

    /// MQTT client id
    #[arg(long)]
    mqtt_client_id: Option<String>,

    /// Only publish labels or areas containing this text (repeatable)
    #[arg(long)]
    mqtt_filter: Vec<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            language: self.language,
            polling_delay_ms: self
                .polling_delay
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(|secs| (secs * 1000.0).round() as u64),
            routine_delay_secs: self.routine_delay,
            alarm_id: self.alarm_id,
            repeat_alarms: self.repeat_alarms,
            quiet: self.quiet,
            desktop_notifications: self.desktop_notifications,
            highlight: self.highlight.clone(),
            reverse: self.reverse,
            mqtt_server: self.mqtt_server.clone(),
            mqtt_port: self.mqtt_port,
            mqtt_topic: self.mqtt_topic.clone(),
            mqtt_client_id: self.mqtt_client_id.clone(),
            mqtt_filter: self.mqtt_filter.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Structured logging on stderr; stdout belongs to the console sink.
    // Default: INFO, use RUST_LOG=debug for per-poll visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!(version = %VERSION, "alarmwatch starting");

    let config = Config::load_from_path(&args.config).with_overrides(args.overrides());

    info!(
        config_file = %config.config_file(),
        feed_url = %config.feed_url(),
        polling_delay_ms = %config.polling_delay_ms(),
        routine_delay_secs = %config.routine_delay_secs(),
        language = %config.language(),
        desktop = %config.desktop_enabled(),
        mqtt = %config.mqtt_enabled(),
        mqtt_host = %config.mqtt_host(),
        mqtt_port = %config.mqtt_port(),
        mqtt_topic = %config.mqtt_topic(),
        "config_loaded"
    );

    let catalog = match LabelCatalog::from_file(config.labels_file()) {
        Ok(catalog) => {
            info!(path = %config.labels_file(), entries = %catalog.len(), "label_catalog_loaded");
            catalog
        }
        Err(e) => {
            warn!(
                path = %config.labels_file(),
                error = %format!("{:#}", e),
                "label_catalog_fallback_to_empty"
            );
            LabelCatalog::new()
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(Metrics::new());
    let console = Arc::new(ConsoleSink::stdout(ConsoleOptions::from_config(&config)));
    let mut fanout = NotificationFanout::new(console.clone(), metrics.clone());

    // Desktop backend is detected once; unsupported platforms get a disabled sink
    if config.desktop_enabled() {
        let desktop = DesktopSink::detect();
        if !desktop.is_enabled() {
            let notice = NotificationEvent::error(DESKTOP_UNSUPPORTED);
            console.dispatch(&notice).await?;
        }
        fanout.add_sink(desktop);
    }

    // MQTT publisher runs on its own task; the sink only queues
    if config.mqtt_enabled() {
        let (egress_sender, egress_rx) = create_egress_channel(EGRESS_BUFFER);
        let publisher = MqttPublisher::new(&config, egress_rx);
        let publisher_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            publisher.run(publisher_shutdown).await;
        });
        fanout.add_sink(Box::new(MqttSink::new(egress_sender, config.mqtt_filter())));
    } else {
        fanout.add_sink(Box::new(NoopSink::new("mqtt")));
    }

    // Periodic counters summary (0 disables)
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let metrics_clone = metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                metrics_clone.report().log();
            }
        });
    }

    let poller = HttpPoller::new(&config)?;
    info!(url = %poller.url(), "feed_poller_ready");

    let grouper = AreaGrouper::new(
        Arc::new(catalog),
        DisplayOptions {
            language: config.language(),
            reverse: config.reverse(),
            highlight: config.highlight().map(str::to_string),
        },
    );
    let tracker = AlertStateTracker::new(TrackerSettings {
        repeat_alarms: config.repeat_alarms(),
        routine_delay: Duration::from_secs(config.routine_delay_secs()),
    });
    let monitor = AlarmMonitor::new(
        Box::new(poller),
        tracker,
        grouper,
        fanout,
        metrics.clone(),
        Duration::from_millis(config.polling_delay_ms()),
    );

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let exit = match monitor.run(shutdown_rx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "alarmwatch_stopped");
            ExitCode::FAILURE
        }
    };

    metrics.report().log();
    info!("alarmwatch shutdown complete");
    Ok(exit)
}
