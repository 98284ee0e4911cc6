//! Wire framing for both protocol variants behind one [`FrameCodec`].
//!
//! A codec turns one inbound text frame into a [`Frame`] and one
//! [`WriteItem`] into outbound text. It never touches the stream and never
//! decides whether to reconnect.

mod rtm;
mod socket_mode;

use std::fmt;

use serde_json::Value;

use crate::config::Protocol;
use crate::error::ClientResult;
use crate::event::{HelloFrame, PlatformEvent, SendAck};
use crate::outgoing::{Outgoing, WriteItem};

pub use rtm::RtmCodec;
pub use socket_mode::SocketModeCodec;

/// Protocol-specific encoding and decoding.
pub trait FrameCodec: Send + Sync + fmt::Debug {
    /// The protocol this codec speaks.
    fn protocol(&self) -> Protocol;

    /// Classifies one inbound text frame. Never fails; undecodable input is
    /// reported as [`Frame::Malformed`].
    fn decode(&self, text: &str) -> Decoded;

    /// Serializes one outbound item.
    fn encode(&self, item: &WriteItem) -> ClientResult<String>;

    /// Checks whether a caller payload can be carried at all.
    fn accepts(&self, payload: &Outgoing) -> ClientResult<()>;
}

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Correlation id that must be acknowledged, if any.
    pub envelope_id: Option<String>,
    /// What the frame means.
    pub frame: Frame,
}

impl Decoded {
    /// A frame without a correlation id.
    pub fn bare(frame: Frame) -> Self {
        Self {
            envelope_id: None,
            frame,
        }
    }
}

/// Meaning of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Blank keepalive artifact.
    Empty,
    /// Connection handshake.
    Handshake(HelloFrame),
    /// Answer to a client probe.
    Pong {
        /// Sequence id of the probe.
        reply_to: u64,
    },
    /// Acknowledgement of a previously sent message.
    Ack(SendAck),
    /// A translated event for the caller.
    Event(PlatformEvent),
    /// A known discriminator whose payload failed to decode.
    Malformed {
        /// Discriminator, empty if none could be read.
        type_tag: String,
        /// Decoder message.
        error: String,
    },
    /// An unrecognized discriminator.
    Unknown {
        /// The discriminator.
        type_tag: String,
    },
    /// A recognized frame with no meaning for this client.
    Ignored {
        /// The discriminator.
        type_tag: &'static str,
    },
}

/// Parses a frame into a JSON object and reads its `type` discriminator.
///
/// The discriminator is removed from the object so payload shapes that use
/// `type` for something else can still decode.
pub(crate) fn split_type(
    text: &str,
) -> Result<(Option<String>, serde_json::Map<String, Value>), Frame> {
    let value: Value = serde_json::from_str(text).map_err(|e| Frame::Malformed {
        type_tag: String::new(),
        error: e.to_string(),
    })?;
    let Value::Object(mut object) = value else {
        return Err(Frame::Malformed {
            type_tag: String::new(),
            error: "frame is not a JSON object".to_string(),
        });
    };

    let type_tag = match object.remove("type") {
        Some(Value::String(tag)) => Some(tag),
        Some(other) => {
            return Err(Frame::Malformed {
                type_tag: other.to_string(),
                error: "type discriminator is not a string".to_string(),
            });
        }
        None => None,
    };
    Ok((type_tag, object))
}

/// Decodes `$object` into `$ty` and wraps it in `PlatformEvent::$variant`,
/// turning decode errors into [`Frame::Malformed`].
macro_rules! decode_event {
    ($object:expr, $tag:expr, $variant:ident) => {
        match serde_json::from_value(serde_json::Value::Object($object)) {
            Ok(event) => $crate::protocol::Frame::Event($crate::event::PlatformEvent::$variant(event)),
            Err(e) => $crate::protocol::Frame::Malformed {
                type_tag: $tag.to_string(),
                error: e.to_string(),
            },
        }
    };
}

pub(crate) use decode_event;
