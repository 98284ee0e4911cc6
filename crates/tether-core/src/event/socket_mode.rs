//! Envelope shapes of the acknowledgement-based socket.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::rtm::UserRef;

/// An inbound envelope. Every envelope except the handshake carries an
/// `envelope_id` that the client acknowledges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Correlation id to acknowledge.
    #[serde(default)]
    pub envelope_id: Option<String>,
    /// Whether the acknowledgement may carry a response payload.
    #[serde(default)]
    pub accepts_response_payload: bool,
    /// Redelivery counter.
    #[serde(default)]
    pub retry_attempt: Option<u32>,
    /// Why the envelope was redelivered.
    #[serde(default)]
    pub retry_reason: Option<String>,
    /// Decoded payload.
    pub payload: T,
}

/// The event wrapped in an `events_api` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackEvent {
    /// Inner event type (`app_mention`, `message`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Fields of the inner event.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of an `events_api` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsApiPayload {
    /// Workspace ID.
    #[serde(default)]
    pub team_id: Option<String>,
    /// App ID.
    #[serde(default)]
    pub api_app_id: Option<String>,
    /// Unique event ID.
    #[serde(default)]
    pub event_id: Option<String>,
    /// Event time (unix seconds).
    #[serde(default)]
    pub event_time: Option<i64>,
    /// The wrapped event.
    pub event: CallbackEvent,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of an `interactive` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractivePayload {
    /// Interaction type (`block_actions`, `view_submission`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Trigger for opening modals.
    #[serde(default)]
    pub trigger_id: Option<String>,
    /// Interacting user.
    #[serde(default)]
    pub user: Option<UserRef>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `slash_commands` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// The command, including its leading slash.
    pub command: String,
    /// Arguments typed after the command.
    #[serde(default)]
    pub text: String,
    /// Invoking user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Channel the command was typed in.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Workspace ID.
    #[serde(default)]
    pub team_id: Option<String>,
    /// URL for delayed responses.
    #[serde(default)]
    pub response_url: Option<String>,
    /// Trigger for opening modals.
    #[serde(default)]
    pub trigger_id: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The peer announces it will drop this connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisconnectRequest {
    /// `warning`, `refresh_requested`, `link_disabled`, ...
    #[serde(default)]
    pub reason: String,
    /// Diagnostics supplied by the peer.
    #[serde(default)]
    pub debug_info: Option<Value>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Handshake sent once per connection. Handled internally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelloFrame {
    /// Number of open connections for this app.
    #[serde(default)]
    pub num_connections: Option<u32>,
    /// Diagnostics supplied by the peer.
    #[serde(default)]
    pub debug_info: Option<Value>,
}
