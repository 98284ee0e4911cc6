//! Event shapes of the legacy streaming socket.
//!
//! Every shape keeps unmodelled fields in `extra` so nothing the platform
//! sends is lost on the way to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message posted to a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Channel ID.
    #[serde(default)]
    pub channel: Option<String>,
    /// Author user ID.
    #[serde(default)]
    pub user: Option<String>,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Message timestamp (also its ID within the channel).
    #[serde(default)]
    pub ts: Option<String>,
    /// Parent timestamp for thread replies.
    #[serde(default)]
    pub thread_ts: Option<String>,
    /// Message subtype (`bot_message`, `message_changed`, ...).
    #[serde(default)]
    pub subtype: Option<String>,
    /// Bot ID for bot-authored messages.
    #[serde(default)]
    pub bot_id: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user started typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTypingEvent {
    /// Channel ID.
    pub channel: String,
    /// User ID.
    pub user: String,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One or more users changed presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceChangeEvent {
    /// Single user form.
    #[serde(default)]
    pub user: Option<String>,
    /// Batched form.
    #[serde(default)]
    pub users: Vec<String>,
    /// `active` or `away`.
    pub presence: String,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The item a reaction was attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionItem {
    /// Item kind (`message`, `file`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Channel of a message item.
    #[serde(default)]
    pub channel: Option<String>,
    /// Timestamp of a message item.
    #[serde(default)]
    pub ts: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reaction was added or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// User who reacted.
    pub user: String,
    /// Emoji name.
    pub reaction: String,
    /// Author of the reacted item.
    #[serde(default)]
    pub item_user: Option<String>,
    /// The reacted item.
    pub item: ReactionItem,
    /// Event timestamp.
    #[serde(default)]
    pub event_ts: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Minimal channel description embedded in channel events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Channel ID.
    pub id: String,
    /// Channel name.
    #[serde(default)]
    pub name: Option<String>,
    /// Creator user ID.
    #[serde(default)]
    pub creator: Option<String>,
    /// Creation time (unix seconds).
    #[serde(default)]
    pub created: Option<i64>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A channel was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCreatedEvent {
    /// The new channel.
    pub channel: ChannelRef,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The connected user joined a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelJoinedEvent {
    /// The joined channel.
    pub channel: ChannelRef,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A member joined a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberJoinedChannelEvent {
    /// User ID of the new member.
    pub user: String,
    /// Channel ID.
    pub channel: String,
    /// Channel type code.
    #[serde(default)]
    pub channel_type: Option<String>,
    /// Team ID.
    #[serde(default)]
    pub team: Option<String>,
    /// Inviting user, if any.
    #[serde(default)]
    pub inviter: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Minimal user description embedded in team events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    /// User ID.
    pub id: String,
    /// User name.
    #[serde(default)]
    pub name: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A new member joined the team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamJoinEvent {
    /// The new member.
    pub user: UserRef,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The server is about to close the connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodbyeEvent {
    /// Fields sent with the notice.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error body shared by error frames and failed acknowledgements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Numeric error code.
    #[serde(default)]
    pub code: i64,
    /// Human-readable message.
    #[serde(default)]
    pub msg: String,
}

/// A server-side error frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerErrorEvent {
    /// Error details.
    pub error: ErrorBody,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Acknowledgement of a previously sent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendAck {
    /// Whether the message was accepted.
    pub ok: bool,
    /// Sequence id of the acknowledged message.
    #[serde(default)]
    pub reply_to: Option<u64>,
    /// Timestamp assigned to an accepted message.
    #[serde(default)]
    pub ts: Option<String>,
    /// Text as stored by the platform.
    #[serde(default)]
    pub text: Option<String>,
    /// Failure details when `ok` is false.
    #[serde(default)]
    pub error: Option<ErrorBody>,
}
