//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_core::{BackoffPolicy, ClientConfig, Protocol};
use tether_transport::{ProxySetting, WsDialer};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Connection settings.
    #[serde(default)]
    pub connection: ConnectionSettings,
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug output.
    Debug,
    /// Lifecycle transitions.
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Fatal problems only.
    Error,
}

impl LogLevel {
    /// Returns the level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line compact output.
    #[default]
    Compact,
    /// Default `fmt` output.
    Full,
    /// Multi-line human-readable output.
    Pretty,
    /// JSON lines (requires the `json-log` feature).
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// The file at `file_path`.
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    /// Span creation.
    #[serde(default)]
    pub new: bool,
    /// Span entry.
    #[serde(default)]
    pub enter: bool,
    /// Span exit.
    #[serde(default)]
    pub exit: bool,
    /// Span close.
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination.
    #[serde(default)]
    pub output: LogOutput,

    /// File path for `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `tether_runtime = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Level for events inside connection epochs (the read, write and
    /// liveness pumps), independent of `level`.
    #[serde(default)]
    pub epoch_level: Option<LogLevel>,

    /// Span lifecycle events.
    #[serde(default)]
    pub span_events: SpanEventConfig,
}

// =============================================================================
// Connection
// =============================================================================

/// Reconnect backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffSettings {
    /// First wait in milliseconds.
    #[serde(default = "default_backoff_min_ms")]
    pub min_ms: u64,

    /// Wait ceiling in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub max_ms: u64,

    /// Growth factor.
    #[serde(default = "default_backoff_factor")]
    pub factor: f64,

    /// Randomize waits.
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            min_ms: default_backoff_min_ms(),
            max_ms: default_backoff_max_ms(),
            factor: default_backoff_factor(),
            jitter: true,
        }
    }
}

impl BackoffSettings {
    /// Converts to the core backoff policy.
    pub fn to_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.min_ms),
            Duration::from_millis(self.max_ms),
            self.factor,
        )
        .with_jitter(self.jitter)
    }
}

fn default_backoff_min_ms() -> u64 {
    100
}

fn default_backoff_max_ms() -> u64 {
    5 * 60 * 1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

/// Connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Protocol variant (`socket-mode` or `rtm`).
    #[serde(default)]
    pub protocol: Protocol,

    /// Credential for the bootstrap call.
    #[serde(default)]
    pub token: String,

    /// Platform API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Explicit forward proxy; overrides environment discovery.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Discover a proxy from `HTTPS_PROXY` / `HTTP_PROXY` when none is set.
    #[serde(default = "default_true")]
    pub proxy_from_env: bool,

    /// Reconnect backoff.
    #[serde(default)]
    pub backoff: BackoffSettings,

    /// Probe interval in milliseconds (rtm).
    #[serde(default = "default_30s")]
    pub ping_interval_ms: u64,

    /// Probe answer deadline in milliseconds (rtm).
    #[serde(default = "default_30s")]
    pub pong_timeout_ms: u64,

    /// Deadman timeout in milliseconds (socket-mode).
    #[serde(default = "default_30s")]
    pub deadman_timeout_ms: u64,

    /// Per-frame write deadline in milliseconds.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Dial deadline in milliseconds.
    #[serde(default = "default_30s")]
    pub connect_timeout_ms: u64,

    /// Closing handshake deadline in milliseconds.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,

    /// Maximum message text length in characters.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Maximum encoded frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Event feed capacity.
    #[serde(default = "default_buffer")]
    pub event_buffer: usize,

    /// Outgoing queue capacity.
    #[serde(default = "default_buffer")]
    pub outgoing_buffer: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            token: String::new(),
            api_base_url: default_api_base_url(),
            proxy: None,
            proxy_from_env: true,
            backoff: BackoffSettings::default(),
            ping_interval_ms: default_30s(),
            pong_timeout_ms: default_30s(),
            deadman_timeout_ms: default_30s(),
            write_timeout_ms: default_write_timeout_ms(),
            connect_timeout_ms: default_30s(),
            close_timeout_ms: default_close_timeout_ms(),
            max_message_len: default_max_message_len(),
            max_frame_bytes: default_max_frame_bytes(),
            event_buffer: default_buffer(),
            outgoing_buffer: default_buffer(),
        }
    }
}

impl ConnectionSettings {
    /// Converts millisecond settings into the core client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig::new(self.protocol)
            .with_backoff(self.backoff.to_policy())
            .with_ping(
                Duration::from_millis(self.ping_interval_ms),
                Duration::from_millis(self.pong_timeout_ms),
            )
            .with_deadman_timeout(Duration::from_millis(self.deadman_timeout_ms))
            .with_write_timeout(Duration::from_millis(self.write_timeout_ms))
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .with_close_timeout(Duration::from_millis(self.close_timeout_ms))
            .with_max_message_len(self.max_message_len)
            .with_max_frame_bytes(self.max_frame_bytes)
            .with_event_buffer(self.event_buffer)
            .with_outgoing_buffer(self.outgoing_buffer)
    }

    /// Proxy selection for the dialer.
    pub fn proxy_setting(&self) -> ProxySetting {
        match (&self.proxy, self.proxy_from_env) {
            (Some(url), _) => ProxySetting::Explicit(url.clone()),
            (None, true) => ProxySetting::FromEnv,
            (None, false) => ProxySetting::Disabled,
        }
    }

    /// Builds the stream dialer described by these settings.
    pub fn dialer(&self) -> WsDialer {
        WsDialer::new(Duration::from_millis(self.connect_timeout_ms))
            .with_proxy(self.proxy_setting())
    }
}

fn default_api_base_url() -> String {
    "https://slack.com/api/".to_string()
}

fn default_30s() -> u64 {
    30_000
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

fn default_close_timeout_ms() -> u64 {
    2_000
}

fn default_max_message_len() -> usize {
    4000
}

fn default_max_frame_bytes() -> usize {
    16 * 1024
}

fn default_buffer() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
logging:
  level: debug
  filters:
    tether_runtime: trace
connection:
  protocol: rtm
  token: xoxb-test
  proxy: http://proxy.test:3128
  backoff:
    min_ms: 250
    jitter: false
  ping_interval_ms: 5000
"#;
        let config: TetherConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filters["tether_runtime"], LogLevel::Trace);

        let conn = &config.connection;
        assert_eq!(conn.protocol, Protocol::Rtm);
        assert_eq!(conn.api_base_url, "https://slack.com/api/");
        assert_eq!(conn.backoff.max_ms, 300_000);
        assert_eq!(
            conn.proxy_setting(),
            ProxySetting::Explicit("http://proxy.test:3128".into())
        );

        let client = conn.to_client_config();
        assert_eq!(client.backoff.min, Duration::from_millis(250));
        assert!(!client.backoff.jitter);
        assert_eq!(client.ping_interval, Duration::from_secs(5));
        assert_eq!(client.max_message_len, 4000);
    }

    #[test]
    fn test_defaults_match_core() {
        let client = ConnectionSettings::default().to_client_config();
        let core = ClientConfig::default();
        assert_eq!(client.protocol, core.protocol);
        assert_eq!(client.backoff, core.backoff);
        assert_eq!(client.deadman_timeout, core.deadman_timeout);
        assert_eq!(client.write_timeout, core.write_timeout);
        assert_eq!(client.close_timeout, core.close_timeout);
        assert_eq!(client.max_frame_bytes, core.max_frame_bytes);
    }

    #[test]
    fn test_proxy_from_env_toggle() {
        let settings = ConnectionSettings {
            proxy_from_env: false,
            ..Default::default()
        };
        assert_eq!(settings.proxy_setting(), ProxySetting::Disabled);
        assert_eq!(
            ConnectionSettings::default().proxy_setting(),
            ProxySetting::FromEnv
        );
    }
}
