//! Legacy streaming socket framing.

use serde_json::{Value, json};

use super::{Decoded, Frame, FrameCodec, decode_event, split_type};
use crate::config::Protocol;
use crate::error::{ClientError, ClientResult};
use crate::event::{HelloFrame, SendAck};
use crate::outgoing::{Outgoing, WriteItem};

/// Codec for the legacy streaming socket.
///
/// Frames are typed by a `type` field. An untyped frame carrying `ok` is the
/// acknowledgement of an earlier send, correlated by `reply_to`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtmCodec;

impl FrameCodec for RtmCodec {
    fn protocol(&self) -> Protocol {
        Protocol::Rtm
    }

    fn decode(&self, text: &str) -> Decoded {
        if text.trim().is_empty() {
            return Decoded::bare(Frame::Empty);
        }
        let (type_tag, object) = match split_type(text) {
            Ok(parts) => parts,
            Err(frame) => return Decoded::bare(frame),
        };

        let Some(type_tag) = type_tag else {
            if !object.contains_key("ok") {
                return Decoded::bare(Frame::Unknown {
                    type_tag: String::new(),
                });
            }
            return Decoded::bare(
                match serde_json::from_value::<SendAck>(Value::Object(object)) {
                    Ok(ack) => Frame::Ack(ack),
                    Err(e) => Frame::Malformed {
                        type_tag: "ack".to_string(),
                        error: e.to_string(),
                    },
                },
            );
        };

        let frame = match type_tag.as_str() {
            "hello" => Frame::Handshake(HelloFrame::default()),
            "pong" => match object.get("reply_to").and_then(Value::as_u64) {
                Some(reply_to) => Frame::Pong { reply_to },
                None => Frame::Malformed {
                    type_tag,
                    error: "pong without numeric reply_to".to_string(),
                },
            },
            "reconnect_url" => Frame::Ignored {
                type_tag: "reconnect_url",
            },
            "message" => decode_event!(object, type_tag, Message),
            "user_typing" => decode_event!(object, type_tag, UserTyping),
            "presence_change" => decode_event!(object, type_tag, PresenceChange),
            "reaction_added" => decode_event!(object, type_tag, ReactionAdded),
            "reaction_removed" => decode_event!(object, type_tag, ReactionRemoved),
            "channel_created" => decode_event!(object, type_tag, ChannelCreated),
            "channel_joined" => decode_event!(object, type_tag, ChannelJoined),
            "member_joined_channel" => decode_event!(object, type_tag, MemberJoinedChannel),
            "team_join" => decode_event!(object, type_tag, TeamJoin),
            "goodbye" => decode_event!(object, type_tag, Goodbye),
            "error" => decode_event!(object, type_tag, ServerError),
            _ => Frame::Unknown { type_tag },
        };
        Decoded::bare(frame)
    }

    fn encode(&self, item: &WriteItem) -> ClientResult<String> {
        let value = match item {
            WriteItem::Probe { id } => json!({ "id": id, "type": "ping" }),
            WriteItem::Outgoing(msg) => match &msg.payload {
                Outgoing::Message {
                    channel,
                    text,
                    thread_ts,
                } => {
                    let mut value = json!({
                        "id": msg.id,
                        "type": "message",
                        "channel": channel,
                        "text": text,
                    });
                    if let Some(ts) = thread_ts {
                        value["thread_ts"] = json!(ts);
                    }
                    value
                }
                Outgoing::Typing { channel } => json!({
                    "id": msg.id,
                    "type": "typing",
                    "channel": channel,
                }),
                Outgoing::Json(Value::Object(object)) => {
                    let mut object = object.clone();
                    object.entry("id").or_insert_with(|| json!(msg.id));
                    Value::Object(object)
                }
                Outgoing::Json(_) => {
                    return Err(ClientError::Encode(
                        "raw frame must be a JSON object".to_string(),
                    ));
                }
            },
            WriteItem::Ack { .. } => {
                return Err(ClientError::Unsupported {
                    what: "envelope acknowledgement",
                    protocol: Protocol::Rtm.as_str(),
                });
            }
        };
        Ok(serde_json::to_string(&value)?)
    }

    fn accepts(&self, payload: &Outgoing) -> ClientResult<()> {
        match payload {
            Outgoing::Json(value) if !value.is_object() => Err(ClientError::Encode(
                "raw frame must be a JSON object".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PlatformEvent;
    use crate::outgoing::OutgoingMessage;

    fn decode(text: &str) -> Frame {
        RtmCodec.decode(text).frame
    }

    #[test]
    fn test_internal_frames() {
        assert_eq!(decode(""), Frame::Empty);
        assert_eq!(
            decode(r#"{"type":"hello"}"#),
            Frame::Handshake(HelloFrame::default())
        );
        assert_eq!(
            decode(r#"{"type":"pong","reply_to":4,"time":1}"#),
            Frame::Pong { reply_to: 4 }
        );
        assert_eq!(
            decode(r#"{"type":"reconnect_url","url":"wss://x"}"#),
            Frame::Ignored {
                type_tag: "reconnect_url"
            }
        );
    }

    #[test]
    fn test_untyped_ok_is_ack() {
        let Frame::Ack(ack) = decode(r#"{"ok":true,"reply_to":3,"ts":"1.2","text":"hi"}"#) else {
            panic!("expected ack");
        };
        assert!(ack.ok);
        assert_eq!(ack.reply_to, Some(3));

        let Frame::Ack(ack) =
            decode(r#"{"ok":false,"reply_to":5,"error":{"code":2,"msg":"no text"}}"#)
        else {
            panic!("expected ack");
        };
        assert!(!ack.ok);
        assert_eq!(ack.error.unwrap().code, 2);
    }

    #[test]
    fn test_message_event() {
        let frame = decode(r#"{"type":"message","channel":"C1","user":"U1","text":"hi","ts":"1.0","client_msg_id":"x"}"#);
        let Frame::Event(PlatformEvent::Message(msg)) = frame else {
            panic!("expected message, got {frame:?}");
        };
        assert_eq!(msg.text.as_deref(), Some("hi"));
        assert!(msg.extra.contains_key("client_msg_id"));
        assert!(!msg.extra.contains_key("type"));
    }

    #[test]
    fn test_reaction_keeps_nested_type() {
        let frame = decode(
            r#"{"type":"reaction_added","user":"U1","reaction":"tada","item":{"type":"message","channel":"C1","ts":"1.0"}}"#,
        );
        let Frame::Event(PlatformEvent::ReactionAdded(reaction)) = frame else {
            panic!("expected reaction, got {frame:?}");
        };
        assert_eq!(reaction.item.kind, "message");
    }

    #[test]
    fn test_malformed_and_unknown() {
        assert!(matches!(
            decode(r#"{"type":"message","text":5}"#),
            Frame::Malformed { ref type_tag, .. } if type_tag == "message"
        ));
        assert!(matches!(decode("{not json"), Frame::Malformed { .. }));
        assert!(matches!(decode("[1,2]"), Frame::Malformed { .. }));
        assert!(matches!(
            decode(r#"{"type":"pong"}"#),
            Frame::Malformed { .. }
        ));
        assert_eq!(
            decode(r#"{"type":"dnd_updated","dnd_status":{}}"#),
            Frame::Unknown {
                type_tag: "dnd_updated".into()
            }
        );
    }

    #[test]
    fn test_encode_items() {
        let probe: Value =
            serde_json::from_str(&RtmCodec.encode(&WriteItem::Probe { id: 9 }).unwrap()).unwrap();
        assert_eq!(probe, json!({"id": 9, "type": "ping"}));

        let reply = WriteItem::Outgoing(OutgoingMessage {
            id: 10,
            payload: Outgoing::message("C1", "hi").in_thread("1.0"),
        });
        let reply: Value = serde_json::from_str(&RtmCodec.encode(&reply).unwrap()).unwrap();
        assert_eq!(
            reply,
            json!({"id": 10, "type": "message", "channel": "C1", "text": "hi", "thread_ts": "1.0"})
        );

        let raw = WriteItem::Outgoing(OutgoingMessage {
            id: 11,
            payload: Outgoing::Json(json!({"type": "typing", "channel": "C2"})),
        });
        let raw: Value = serde_json::from_str(&RtmCodec.encode(&raw).unwrap()).unwrap();
        assert_eq!(raw["id"], 11);
    }

    #[test]
    fn test_rejects_acks_and_non_objects() {
        assert!(matches!(
            RtmCodec.encode(&WriteItem::Ack {
                envelope_id: "e".into()
            }),
            Err(ClientError::Unsupported { .. })
        ));
        assert!(RtmCodec.accepts(&Outgoing::Json(json!([1]))).is_err());
        assert!(RtmCodec.accepts(&Outgoing::typing("C1")).is_ok());
    }
}
