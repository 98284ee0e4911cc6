//! Unified error types for the tether client.
//!
//! Both protocol variants share one failure taxonomy: every error that can
//! end a connection attempt is reduced to a [`FailureClass`] by
//! [`ConnectError::classify`], and only the orchestrator acts on it.

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Failure Classification
// =============================================================================

/// Platform error codes for which a retry can never succeed.
pub const FATAL_PLATFORM_CODES: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
    "token_expired",
    "not_allowed_token_type",
    "missing_scope",
];

/// How the orchestrator must react to a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Credentials were rejected; stop and never retry.
    Fatal,
    /// Retry, but wait at least this long before the next attempt.
    RateLimited(Duration),
    /// Retry with the regular backoff policy.
    Recoverable,
}

/// Returns whether an HTTP status marks an authentication failure.
pub fn is_auth_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

// =============================================================================
// Bootstrap Errors
// =============================================================================

/// Errors returned by the session bootstrap call.
#[derive(Debug, Clone, Error)]
pub enum BootstrapError {
    /// The platform answered with `ok: false`. The code is surfaced verbatim.
    #[error("{code}")]
    Platform {
        /// Platform error code (e.g. `invalid_auth`).
        code: String,
    },

    /// The platform asked us to slow down.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested minimum wait before the next attempt.
        retry_after: Duration,
    },

    /// The HTTP exchange completed with a non-success status.
    #[error("HTTP {status} error: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// No credential was configured.
    #[error("missing credential")]
    MissingCredential,

    /// Network or transport failure while calling the platform.
    #[error("bootstrap request failed: {0}")]
    Transport(String),

    /// The platform response could not be understood.
    #[error("invalid bootstrap response: {0}")]
    InvalidResponse(String),

    /// The returned stream endpoint cannot be dialed.
    #[error("invalid stream endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// The endpoint as returned by the platform.
        url: String,
        /// Reason it was rejected.
        reason: String,
    },
}

impl From<serde_json::Error> for BootstrapError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

// =============================================================================
// Dial Errors
// =============================================================================

/// Errors raised while establishing the duplex stream.
#[derive(Debug, Clone, Error)]
pub enum DialError {
    /// The endpoint URL is unusable.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The stream handshake was answered with a non-upgrade HTTP status.
    #[error("handshake with {url} rejected with HTTP {status}")]
    Rejected {
        /// The URL that rejected the upgrade.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The forward proxy refused or broke the tunnel.
    #[error("proxy {proxy} failed: {reason}")]
    Proxy {
        /// Proxy address.
        proxy: String,
        /// Reason for failure.
        reason: String,
    },

    /// Connection failed.
    #[error("connection to {url} failed: {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The dial did not complete in time.
    #[error("connection to {url} timed out after {after:?}")]
    Timeout {
        /// The URL being dialed.
        url: String,
        /// Configured connect timeout.
        after: Duration,
    },
}

// =============================================================================
// Connect Errors
// =============================================================================

/// Any failure of one connection attempt (bootstrap followed by dial).
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    /// Session bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// Dialing the stream endpoint failed.
    #[error(transparent)]
    Dial(#[from] DialError),
}

impl ConnectError {
    /// Reduces this error to the canonical failure class.
    pub fn classify(&self) -> FailureClass {
        match self {
            Self::Bootstrap(BootstrapError::Platform { code })
                if FATAL_PLATFORM_CODES.contains(&code.as_str()) =>
            {
                FailureClass::Fatal
            }
            Self::Bootstrap(BootstrapError::MissingCredential) => FailureClass::Fatal,
            Self::Bootstrap(BootstrapError::Http { status, .. })
            | Self::Dial(DialError::Rejected { status, .. })
                if is_auth_status(*status) =>
            {
                FailureClass::Fatal
            }
            Self::Bootstrap(BootstrapError::RateLimited { retry_after }) => {
                FailureClass::RateLimited(*retry_after)
            }
            _ => FailureClass::Recoverable,
        }
    }
}

// =============================================================================
// Teardown Reasons
// =============================================================================

/// Why a connected epoch ended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeardownReason {
    /// The caller asked to disconnect.
    #[error("disconnect requested")]
    Requested,

    /// The peer sent a close frame.
    #[error("peer closed the connection ({code}): {reason}")]
    PeerClosed {
        /// Close code.
        code: u16,
        /// Close reason text.
        reason: String,
    },

    /// The stream ended without a close frame.
    #[error("stream ended unexpectedly")]
    EndOfStream,

    /// Receiving a frame failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Sending a frame failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A send did not complete before the write deadline.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// A keepalive probe went unanswered.
    #[error("no pong received within {0:?}")]
    PongTimeout(Duration),

    /// No liveness signal arrived before the deadman timer fired.
    #[error("no liveness signal within {0:?}")]
    DeadmanExpired(Duration),

    /// The peer announced it is about to drop the connection.
    #[error("peer requested reconnect: {0}")]
    ReconnectRequested(String),

    /// A worker of the epoch stopped before the epoch was torn down.
    #[error("{0} pump stopped unexpectedly")]
    PumpStopped(&'static str),
}

impl TeardownReason {
    /// Returns true if the caller initiated the teardown.
    pub fn is_intentional(&self) -> bool {
        matches!(self, Self::Requested)
    }
}

// =============================================================================
// Client Errors
// =============================================================================

/// Errors returned synchronously to callers of the client handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Message text exceeds the configured limit.
    #[error("message text is {len} characters, limit is {max}")]
    MessageTooLong {
        /// Actual length in characters.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Encoded frame exceeds the configured limit.
    #[error("frame is {len} bytes, limit is {max}")]
    FrameTooLarge {
        /// Encoded size in bytes.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// The active protocol cannot carry this kind of frame.
    #[error("{what} is not supported by the {protocol} protocol")]
    Unsupported {
        /// Description of the rejected frame.
        what: &'static str,
        /// Protocol name.
        protocol: &'static str,
    },

    /// Serialization failed.
    #[error("failed to encode outgoing frame: {0}")]
    Encode(String),

    /// The client has terminated and accepts no more messages.
    #[error("client is terminated")]
    Closed,
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for bootstrap calls.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Result type for dialing.
pub type DialResult<T> = Result<T, DialError>;

/// Result type for caller-facing operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_codes_are_fatal() {
        for code in ["invalid_auth", "account_inactive", "not_authed"] {
            let err = ConnectError::from(BootstrapError::Platform { code: code.into() });
            assert_eq!(err.classify(), FailureClass::Fatal, "{code}");
        }
        assert_eq!(
            ConnectError::from(BootstrapError::MissingCredential).classify(),
            FailureClass::Fatal
        );
    }

    #[test]
    fn test_auth_statuses_are_fatal_for_both_stages() {
        let bootstrap = ConnectError::from(BootstrapError::Http {
            status: 401,
            body: String::new(),
        });
        let dial = ConnectError::from(DialError::Rejected {
            url: "wss://example.test:443/".into(),
            status: 403,
        });
        assert_eq!(bootstrap.classify(), FailureClass::Fatal);
        assert_eq!(dial.classify(), FailureClass::Fatal);
    }

    #[test]
    fn test_rate_limit_carries_floor() {
        let err = ConnectError::from(BootstrapError::RateLimited {
            retry_after: Duration::from_secs(7),
        });
        assert_eq!(
            err.classify(),
            FailureClass::RateLimited(Duration::from_secs(7))
        );
    }

    #[test]
    fn test_everything_else_is_recoverable() {
        let cases = [
            ConnectError::from(BootstrapError::Platform {
                code: "internal_error".into(),
            }),
            ConnectError::from(BootstrapError::Http {
                status: 503,
                body: String::new(),
            }),
            ConnectError::from(BootstrapError::Transport("reset".into())),
            ConnectError::from(DialError::ConnectionFailed {
                url: "wss://example.test:443/".into(),
                reason: "refused".into(),
            }),
            ConnectError::from(DialError::Rejected {
                url: "wss://example.test:443/".into(),
                status: 500,
            }),
        ];
        for err in cases {
            assert_eq!(err.classify(), FailureClass::Recoverable, "{err}");
        }
    }

    #[test]
    fn test_platform_code_displayed_verbatim() {
        let err = BootstrapError::Platform {
            code: "team_access_not_granted".into(),
        };
        assert_eq!(err.to_string(), "team_access_not_granted");
    }

    #[test]
    fn test_only_requested_teardown_is_intentional() {
        assert!(TeardownReason::Requested.is_intentional());
        assert!(!TeardownReason::EndOfStream.is_intentional());
        assert!(!TeardownReason::ReconnectRequested("refresh_requested".into()).is_intentional());
        assert!(!TeardownReason::PumpStopped("liveness").is_intentional());
    }
}
