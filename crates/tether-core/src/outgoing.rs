//! Caller-submitted messages and the items the write pump serializes.

use serde_json::Value;

/// Payload of a caller-submitted message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// A chat message posted to a channel.
    Message {
        /// Target channel ID.
        channel: String,
        /// Message text.
        text: String,
        /// Parent message timestamp when replying in a thread.
        thread_ts: Option<String>,
    },
    /// A typing indicator for a channel.
    Typing {
        /// Target channel ID.
        channel: String,
    },
    /// A raw JSON frame, sent as-is apart from protocol framing.
    Json(Value),
}

impl Outgoing {
    /// Creates a chat message.
    pub fn message(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message {
            channel: channel.into(),
            text: text.into(),
            thread_ts: None,
        }
    }

    /// Creates a typing indicator.
    pub fn typing(channel: impl Into<String>) -> Self {
        Self::Typing {
            channel: channel.into(),
        }
    }

    /// Turns a chat message into a thread reply. Other payloads are unchanged.
    pub fn in_thread(mut self, ts: impl Into<String>) -> Self {
        if let Self::Message { thread_ts, .. } = &mut self {
            *thread_ts = Some(ts.into());
        }
        self
    }

    /// Length of the message text in characters, if this payload carries text.
    pub fn text_len(&self) -> Option<usize> {
        match self {
            Self::Message { text, .. } => Some(text.chars().count()),
            _ => None,
        }
    }
}

/// A caller message tagged with its sequence id. Consumed exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    /// Sequence id, unique per client instance.
    pub id: u64,
    /// The payload.
    pub payload: Outgoing,
}

/// Anything the write pump puts on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteItem {
    /// A caller message.
    Outgoing(OutgoingMessage),
    /// A keepalive probe carrying its sequence id.
    Probe {
        /// Sequence id echoed back in the probe response.
        id: u64,
    },
    /// Acknowledgement of an inbound envelope.
    Ack {
        /// Correlation id of the envelope being acknowledged.
        envelope_id: String,
    },
}

impl WriteItem {
    /// Sequence id of the item, when it has one.
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Outgoing(msg) => Some(msg.id),
            Self::Probe { id } => Some(*id),
            Self::Ack { .. } => None,
        }
    }
}
