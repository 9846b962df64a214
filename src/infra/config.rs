//! Configuration loading from TOML files
//!
//! Config file is selected via `--config <path>` (default: config/dev.toml).
//! Command-line flags are applied on top of the file values with
//! `Config::with_overrides`.

use crate::domain::types::Language;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    #[serde(default = "default_feed_referer")]
    pub referer: String,
    #[serde(default = "default_feed_user_agent")]
    pub user_agent: String,
    /// Per-request timeout; the feed is polled every second so this stays short
    #[serde(default = "default_feed_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            referer: default_feed_referer(),
            user_agent: default_feed_user_agent(),
            timeout_ms: default_feed_timeout_ms(),
        }
    }
}

fn default_feed_url() -> String {
    "https://www.oref.org.il/WarningMessages/alert/alerts.json".to_string()
}

fn default_feed_referer() -> String {
    "https://www.oref.org.il/11226-he/pakar.aspx".to_string()
}

fn default_feed_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/75.0.3770.100 Safari/537.36"
        .to_string()
}

fn default_feed_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_polling_delay_ms")]
    pub delay_ms: u64,
    /// Minimum gap between repeated "no active alarms" lines
    #[serde(default = "default_routine_delay_secs")]
    pub routine_delay_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_polling_delay_ms(),
            routine_delay_secs: default_routine_delay_secs(),
        }
    }
}

fn default_polling_delay_ms() -> u64 {
    1000
}

fn default_routine_delay_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_language")]
    pub language: Language,
    #[serde(default)]
    pub repeat_alarms: bool,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default)]
    pub alarm_id: bool,
    #[serde(default)]
    pub highlight: Option<String>,
    /// Reverse RTL strings for terminals without bidi support
    #[serde(default)]
    pub reverse: bool,
    /// Colored console output (None = only when stdout is a terminal)
    #[serde(default)]
    pub color: Option<bool>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            repeat_alarms: false,
            quiet: false,
            alarm_id: false,
            highlight: None,
            reverse: false,
            color: None,
        }
    }
}

fn default_language() -> Language {
    Language::He
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_labels_file")]
    pub file: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self { file: default_labels_file() }
    }
}

fn default_labels_file() -> String {
    "data/labels.json".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DesktopConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
    /// Defaults to a generated `alarmwatch-<uuid>` id
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Only publish labels whose label or area contains one of these (case-insensitive)
    #[serde(default)]
    pub filter: Vec<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            topic: default_mqtt_topic(),
            client_id: None,
            username: None,
            password: None,
            filter: Vec::new(),
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "alarmwatch/alerts".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Counter summary log interval (0 to disable)
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub desktop: DesktopConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Values supplied on the command line; `None`/`false` leaves the file value alone
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub language: Option<Language>,
    pub polling_delay_ms: Option<u64>,
    pub routine_delay_secs: Option<u64>,
    pub alarm_id: bool,
    pub repeat_alarms: bool,
    pub quiet: bool,
    pub desktop_notifications: bool,
    pub highlight: Option<String>,
    pub reverse: bool,
    pub mqtt_server: Option<String>,
    pub mqtt_port: Option<u16>,
    pub mqtt_topic: Option<String>,
    pub mqtt_client_id: Option<String>,
    pub mqtt_filter: Vec<String>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    config_file: String,
    feed_url: String,
    feed_referer: String,
    feed_user_agent: String,
    feed_timeout_ms: u64,
    polling_delay_ms: u64,
    routine_delay_secs: u64,
    language: Language,
    repeat_alarms: bool,
    quiet: bool,
    show_alarm_id: bool,
    highlight: Option<String>,
    reverse: bool,
    color: Option<bool>,
    labels_file: String,
    desktop_enabled: bool,
    mqtt_enabled: bool,
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_topic: String,
    mqtt_client_id: Option<String>,
    mqtt_username: Option<String>,
    mqtt_password: Option<String>,
    mqtt_filter: Vec<String>,
    metrics_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            config_file,
            feed_url: toml_config.feed.url,
            feed_referer: toml_config.feed.referer,
            feed_user_agent: toml_config.feed.user_agent,
            feed_timeout_ms: toml_config.feed.timeout_ms,
            polling_delay_ms: toml_config.polling.delay_ms,
            routine_delay_secs: toml_config.polling.routine_delay_secs,
            language: toml_config.display.language,
            repeat_alarms: toml_config.display.repeat_alarms,
            quiet: toml_config.display.quiet,
            show_alarm_id: toml_config.display.alarm_id,
            highlight: toml_config.display.highlight.filter(|h| !h.is_empty()),
            reverse: toml_config.display.reverse,
            color: toml_config.display.color,
            labels_file: toml_config.labels.file,
            desktop_enabled: toml_config.desktop.enabled,
            mqtt_enabled: toml_config.mqtt.enabled,
            mqtt_host: toml_config.mqtt.host,
            mqtt_port: toml_config.mqtt.port,
            mqtt_topic: toml_config.mqtt.topic,
            mqtt_client_id: toml_config.mqtt.client_id,
            mqtt_username: toml_config.mqtt.username,
            mqtt_password: toml_config.mqtt.password,
            mqtt_filter: toml_config.mqtt.filter,
            metrics_interval_secs: toml_config.metrics.interval_secs,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "config_fallback_to_defaults");
                Self::default()
            }
        }
    }

    /// Apply command-line flags on top of file values
    pub fn with_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(language) = cli.language {
            self.language = language;
        }
        if let Some(ms) = cli.polling_delay_ms {
            self.polling_delay_ms = ms;
        }
        if let Some(secs) = cli.routine_delay_secs {
            self.routine_delay_secs = secs;
        }
        self.show_alarm_id |= cli.alarm_id;
        self.repeat_alarms |= cli.repeat_alarms;
        self.quiet |= cli.quiet;
        self.desktop_enabled |= cli.desktop_notifications;
        self.reverse |= cli.reverse;
        if let Some(highlight) = cli.highlight.filter(|h| !h.is_empty()) {
            self.highlight = Some(highlight);
        }
        // Naming a broker on the command line turns the MQTT sink on
        if let Some(server) = cli.mqtt_server {
            self.mqtt_host = server;
            self.mqtt_enabled = true;
        }
        if let Some(port) = cli.mqtt_port {
            self.mqtt_port = port;
        }
        if let Some(topic) = cli.mqtt_topic {
            self.mqtt_topic = topic;
        }
        if let Some(client_id) = cli.mqtt_client_id {
            self.mqtt_client_id = Some(client_id);
        }
        if !cli.mqtt_filter.is_empty() {
            self.mqtt_filter = cli.mqtt_filter;
        }
        self
    }

    // Getters for all config fields
    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    pub fn feed_referer(&self) -> &str {
        &self.feed_referer
    }

    pub fn feed_user_agent(&self) -> &str {
        &self.feed_user_agent
    }

    pub fn feed_timeout_ms(&self) -> u64 {
        self.feed_timeout_ms
    }

    pub fn polling_delay_ms(&self) -> u64 {
        self.polling_delay_ms
    }

    pub fn routine_delay_secs(&self) -> u64 {
        self.routine_delay_secs
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn repeat_alarms(&self) -> bool {
        self.repeat_alarms
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn show_alarm_id(&self) -> bool {
        self.show_alarm_id
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    pub fn reverse(&self) -> bool {
        self.reverse
    }

    pub fn color(&self) -> Option<bool> {
        self.color
    }

    pub fn labels_file(&self) -> &str {
        &self.labels_file
    }

    pub fn desktop_enabled(&self) -> bool {
        self.desktop_enabled
    }

    pub fn mqtt_enabled(&self) -> bool {
        self.mqtt_enabled
    }

    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    pub fn mqtt_topic(&self) -> &str {
        &self.mqtt_topic
    }

    pub fn mqtt_client_id(&self) -> Option<&str> {
        self.mqtt_client_id.as_deref()
    }

    pub fn mqtt_username(&self) -> Option<&str> {
        self.mqtt_username.as_deref()
    }

    pub fn mqtt_password(&self) -> Option<&str> {
        self.mqtt_password.as_deref()
    }

    pub fn mqtt_filter(&self) -> &[String] {
        &self.mqtt_filter
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }
}
