//! Typed runtime configuration for a client instance.
//!
//! File and environment loading lives in the runtime crate; this is the
//! validated, `Duration`-typed form the orchestrator consumes.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::BackoffPolicy;
use crate::liveness::LivenessStrategy;
use crate::protocol::{FrameCodec, RtmCodec, SocketModeCodec};

/// Protocol variant spoken on the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Envelope socket with per-envelope acknowledgements.
    #[default]
    SocketMode,
    /// Legacy streaming socket with client-initiated ping/pong.
    Rtm,
}

impl Protocol {
    /// Returns the protocol name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SocketMode => "socket-mode",
            Self::Rtm => "rtm",
        }
    }

    /// API method that opens a session for this protocol.
    pub fn bootstrap_method(&self) -> &'static str {
        match self {
            Self::SocketMode => "apps.connections.open",
            Self::Rtm => "rtm.connect",
        }
    }

    /// Returns the frame codec for this protocol.
    pub fn codec(&self) -> Arc<dyn FrameCodec> {
        match self {
            Self::SocketMode => Arc::new(SocketModeCodec),
            Self::Rtm => Arc::new(RtmCodec),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortest period a liveness timer runs with.
pub const MIN_TIMER: Duration = Duration::from_millis(1);

/// Configuration of one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Protocol variant.
    pub protocol: Protocol,
    /// Reconnect backoff.
    pub backoff: BackoffPolicy,
    /// Interval between client probes (legacy variant).
    pub ping_interval: Duration,
    /// Maximum age of an unanswered probe (legacy variant).
    pub pong_timeout: Duration,
    /// Silence tolerated before the deadman timer fires (envelope variant).
    pub deadman_timeout: Duration,
    /// Deadline for a single frame write.
    pub write_timeout: Duration,
    /// Deadline for dialing the stream, including any proxy tunnel.
    pub connect_timeout: Duration,
    /// Deadline for the closing handshake during teardown.
    pub close_timeout: Duration,
    /// Maximum message text length in characters.
    pub max_message_len: usize,
    /// Maximum encoded frame size in bytes.
    pub max_frame_bytes: usize,
    /// Event feed capacity.
    pub event_buffer: usize,
    /// Outgoing queue capacity.
    pub outgoing_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            backoff: BackoffPolicy::default(),
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(30),
            deadman_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(30),
            close_timeout: Duration::from_secs(2),
            max_message_len: 4000,
            max_frame_bytes: 16 * 1024,
            event_buffer: 256,
            outgoing_buffer: 256,
        }
    }
}

impl ClientConfig {
    /// Creates a default configuration for `protocol`.
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            ..Self::default()
        }
    }

    /// Sets the backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets probe interval and pong timeout.
    pub fn with_ping(mut self, interval: Duration, timeout: Duration) -> Self {
        self.ping_interval = interval;
        self.pong_timeout = timeout;
        self
    }

    /// Sets the deadman timeout.
    pub fn with_deadman_timeout(mut self, timeout: Duration) -> Self {
        self.deadman_timeout = timeout;
        self
    }

    /// Sets the write deadline.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the dial deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the closing handshake deadline.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Sets the message text limit.
    pub fn with_max_message_len(mut self, max: usize) -> Self {
        self.max_message_len = max;
        self
    }

    /// Sets the frame size limit.
    pub fn with_max_frame_bytes(mut self, max: usize) -> Self {
        self.max_frame_bytes = max;
        self
    }

    /// Sets the event feed capacity.
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Sets the outgoing queue capacity.
    pub fn with_outgoing_buffer(mut self, capacity: usize) -> Self {
        self.outgoing_buffer = capacity;
        self
    }

    /// Liveness strategy for the configured protocol. Zero durations are
    /// raised to [`MIN_TIMER`].
    pub fn liveness(&self) -> LivenessStrategy {
        match self.protocol {
            Protocol::Rtm => LivenessStrategy::Probe {
                interval: self.ping_interval.max(MIN_TIMER),
                timeout: self.pong_timeout.max(MIN_TIMER),
            },
            Protocol::SocketMode => LivenessStrategy::Deadman {
                timeout: self.deadman_timeout.max(MIN_TIMER),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_follows_protocol() {
        let rtm = ClientConfig::new(Protocol::Rtm)
            .with_ping(Duration::from_secs(5), Duration::from_secs(8));
        assert_eq!(
            rtm.liveness(),
            LivenessStrategy::Probe {
                interval: Duration::from_secs(5),
                timeout: Duration::from_secs(8),
            }
        );

        let socket = ClientConfig::new(Protocol::SocketMode)
            .with_deadman_timeout(Duration::from_secs(12));
        assert_eq!(
            socket.liveness(),
            LivenessStrategy::Deadman {
                timeout: Duration::from_secs(12)
            }
        );
    }

    #[test]
    fn test_zero_liveness_timers_clamped() {
        let rtm = ClientConfig::new(Protocol::Rtm).with_ping(Duration::ZERO, Duration::ZERO);
        assert_eq!(
            rtm.liveness(),
            LivenessStrategy::Probe {
                interval: MIN_TIMER,
                timeout: MIN_TIMER,
            }
        );

        let socket = ClientConfig::new(Protocol::SocketMode).with_deadman_timeout(Duration::ZERO);
        assert_eq!(socket.liveness(), LivenessStrategy::Deadman { timeout: MIN_TIMER });
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(Protocol::Rtm.bootstrap_method(), "rtm.connect");
        assert_eq!(
            Protocol::SocketMode.bootstrap_method(),
            "apps.connections.open"
        );
        assert_eq!(Protocol::Rtm.codec().protocol(), Protocol::Rtm);

        let parsed: Protocol = serde_json::from_str(r#""socket-mode""#).unwrap();
        assert_eq!(parsed, Protocol::SocketMode);
    }
}
