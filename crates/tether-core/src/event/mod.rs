//! The caller-visible event feed element.
//!
//! [`Event`] is a closed set: lifecycle and diagnostic events produced by the
//! client itself, plus [`PlatformEvent`] for translated wire frames. Every
//! variant reports the tag it would carry on the wire via `type_tag()`.

pub mod rtm;
pub mod socket_mode;

use std::fmt;
use std::time::Duration;

use crate::error::{ClientError, ConnectError, TeardownReason};
use crate::session::SessionInfo;

pub use rtm::{
    ChannelCreatedEvent, ChannelJoinedEvent, ChannelRef, ErrorBody, GoodbyeEvent,
    MemberJoinedChannelEvent, MessageEvent, PresenceChangeEvent, ReactionEvent, ReactionItem,
    SendAck, ServerErrorEvent, TeamJoinEvent, UserRef, UserTypingEvent,
};
pub use socket_mode::{
    CallbackEvent, DisconnectRequest, Envelope, EventsApiPayload, HelloFrame, InteractivePayload,
    SlashCommandPayload,
};

// =============================================================================
// Platform Events
// =============================================================================

/// A translated wire frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// `message`
    Message(MessageEvent),
    /// `user_typing`
    UserTyping(UserTypingEvent),
    /// `presence_change`
    PresenceChange(PresenceChangeEvent),
    /// `reaction_added`
    ReactionAdded(ReactionEvent),
    /// `reaction_removed`
    ReactionRemoved(ReactionEvent),
    /// `channel_created`
    ChannelCreated(ChannelCreatedEvent),
    /// `channel_joined`
    ChannelJoined(ChannelJoinedEvent),
    /// `member_joined_channel`
    MemberJoinedChannel(MemberJoinedChannelEvent),
    /// `team_join`
    TeamJoin(TeamJoinEvent),
    /// `goodbye`
    Goodbye(GoodbyeEvent),
    /// `error`
    ServerError(ServerErrorEvent),
    /// `events_api`
    EventsApi(Envelope<EventsApiPayload>),
    /// `interactive`
    Interactive(Envelope<InteractivePayload>),
    /// `slash_commands`
    SlashCommand(Envelope<SlashCommandPayload>),
    /// `disconnect`
    Disconnect(DisconnectRequest),
}

impl PlatformEvent {
    /// Wire discriminator of this event.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::UserTyping(_) => "user_typing",
            Self::PresenceChange(_) => "presence_change",
            Self::ReactionAdded(_) => "reaction_added",
            Self::ReactionRemoved(_) => "reaction_removed",
            Self::ChannelCreated(_) => "channel_created",
            Self::ChannelJoined(_) => "channel_joined",
            Self::MemberJoinedChannel(_) => "member_joined_channel",
            Self::TeamJoin(_) => "team_join",
            Self::Goodbye(_) => "goodbye",
            Self::ServerError(_) => "error",
            Self::EventsApi(_) => "events_api",
            Self::Interactive(_) => "interactive",
            Self::SlashCommand(_) => "slash_commands",
            Self::Disconnect(_) => "disconnect",
        }
    }

    /// Returns the peer's reason when this event announces that the
    /// connection is about to be dropped.
    pub fn reconnect_reason(&self) -> Option<&str> {
        match self {
            Self::Goodbye(_) => Some("goodbye"),
            Self::Disconnect(req) if req.reason.is_empty() => Some("disconnect"),
            Self::Disconnect(req) => Some(&req.reason),
            _ => None,
        }
    }
}

// =============================================================================
// Send Failures
// =============================================================================

/// Why an outgoing message did not make it.
#[derive(Debug, Clone, PartialEq)]
pub enum SendFailure {
    /// Rejected before reaching the wire.
    Local(ClientError),
    /// Refused by the platform in its acknowledgement.
    Remote(ErrorBody),
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(err) => write!(f, "{err}"),
            Self::Remote(body) => write!(f, "platform error {}: {}", body.code, body.msg),
        }
    }
}

// =============================================================================
// Event Feed Element
// =============================================================================

/// An element of the event feed.
#[derive(Debug, Clone)]
pub enum Event {
    /// A connection attempt is starting.
    Connecting {
        /// Attempt number since the last successful connect, starting at 1.
        attempt: u32,
        /// Epoch the attempt would open.
        epoch: u64,
    },
    /// The stream is up and the pumps are about to start.
    Connected {
        /// Epoch ordinal.
        epoch: u64,
        /// Session snapshot, when the protocol provides one.
        session: Option<SessionInfo>,
    },
    /// A connection attempt failed and will be retried.
    ConnectionError {
        /// The failed attempt.
        attempt: u32,
        /// Wait before the next attempt.
        backoff: Duration,
        /// What went wrong.
        error: ConnectError,
    },
    /// An epoch ended.
    Disconnected {
        /// Epoch ordinal.
        epoch: u64,
        /// Whether the caller asked for it.
        intentional: bool,
        /// Why the epoch ended.
        reason: TeardownReason,
    },
    /// Credentials were rejected. The client terminates after this.
    InvalidAuth {
        /// The rejecting error.
        error: ConnectError,
    },
    /// Round-trip time of a keepalive probe.
    LatencyReport {
        /// Epoch ordinal.
        epoch: u64,
        /// Measured round trip.
        rtt: Duration,
    },
    /// An outgoing message failed.
    OutgoingError {
        /// Sequence id of the message, when known.
        id: Option<u64>,
        /// The failure.
        error: SendFailure,
    },
    /// A frame could not be decoded. The connection stays up.
    DecodeError {
        /// Discriminator of the frame, empty if none could be read.
        type_tag: String,
        /// Decoder message.
        error: String,
        /// The frame as received.
        raw: String,
    },
    /// A translated platform event.
    Platform(PlatformEvent),
}

impl Event {
    /// Tag of this event.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Connecting { .. } => "connecting",
            Self::Connected { .. } => "connected",
            Self::ConnectionError { .. } => "connection_error",
            Self::Disconnected { .. } => "disconnected",
            Self::InvalidAuth { .. } => "invalid_auth",
            Self::LatencyReport { .. } => "latency_report",
            Self::OutgoingError { .. } => "outgoing_error",
            Self::DecodeError { .. } => "decode_error",
            Self::Platform(event) => event.type_tag(),
        }
    }

    /// Returns the platform event, if this is one.
    pub fn as_platform(&self) -> Option<&PlatformEvent> {
        match self {
            Self::Platform(event) => Some(event),
            _ => None,
        }
    }
}

impl From<PlatformEvent> for Event {
    fn from(event: PlatformEvent) -> Self {
        Self::Platform(event)
    }
}
