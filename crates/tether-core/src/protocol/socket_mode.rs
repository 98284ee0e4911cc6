//! Envelope socket framing.

use serde_json::{Value, json};

use super::{Decoded, Frame, FrameCodec, decode_event, split_type};
use crate::config::Protocol;
use crate::error::{ClientError, ClientResult};
use crate::event::HelloFrame;
use crate::outgoing::{Outgoing, WriteItem};

/// Codec for the envelope socket.
///
/// Every envelope except `hello` carries an `envelope_id`, returned through
/// [`Decoded::envelope_id`] even when the payload itself fails to decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketModeCodec;

impl FrameCodec for SocketModeCodec {
    fn protocol(&self) -> Protocol {
        Protocol::SocketMode
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
            return Decoded::bare(Frame::Unknown {
                type_tag: String::new(),
            });
        };
        if type_tag == "hello" {
            // A hello that fails to decode still completes the handshake.
            let hello: HelloFrame =
                serde_json::from_value(Value::Object(object)).unwrap_or_default();
            return Decoded::bare(Frame::Handshake(hello));
        }

        let envelope_id = object
            .get("envelope_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let frame = match type_tag.as_str() {
            "events_api" => decode_event!(object, type_tag, EventsApi),
            "interactive" => decode_event!(object, type_tag, Interactive),
            "slash_commands" => decode_event!(object, type_tag, SlashCommand),
            "disconnect" => decode_event!(object, type_tag, Disconnect),
            _ => Frame::Unknown { type_tag },
        };
        Decoded { envelope_id, frame }
    }

    fn encode(&self, item: &WriteItem) -> ClientResult<String> {
        match item {
            WriteItem::Ack { envelope_id } => {
                Ok(serde_json::to_string(&json!({ "envelope_id": envelope_id }))?)
            }
            WriteItem::Outgoing(msg) => match &msg.payload {
                Outgoing::Json(value) => Ok(serde_json::to_string(value)?),
                other => Err(unsupported(other)),
            },
            WriteItem::Probe { .. } => Err(ClientError::Unsupported {
                what: "client keepalive probe",
                protocol: Protocol::SocketMode.as_str(),
            }),
        }
    }

    fn accepts(&self, payload: &Outgoing) -> ClientResult<()> {
        match payload {
            Outgoing::Json(_) => Ok(()),
            other => Err(unsupported(other)),
        }
    }
}

fn unsupported(payload: &Outgoing) -> ClientError {
    let what = match payload {
        Outgoing::Message { .. } => "chat message",
        Outgoing::Typing { .. } => "typing indicator",
        Outgoing::Json(_) => "raw frame",
    };
    ClientError::Unsupported {
        what,
        protocol: Protocol::SocketMode.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PlatformEvent;
    use crate::outgoing::OutgoingMessage;

    #[test]
    fn test_hello_has_no_envelope() {
        let decoded = SocketModeCodec
            .decode(r#"{"type":"hello","num_connections":1,"envelope_id":"ignored"}"#);
        assert_eq!(decoded.envelope_id, None);
        let Frame::Handshake(hello) = decoded.frame else {
            panic!("expected handshake");
        };
        assert_eq!(hello.num_connections, Some(1));
    }

    #[test]
    fn test_events_api_envelope() {
        let decoded = SocketModeCodec.decode(
            r#"{"type":"events_api","envelope_id":"e-1","accepts_response_payload":false,
                "payload":{"team_id":"T1","event":{"type":"app_mention","text":"hi"}}}"#,
        );
        assert_eq!(decoded.envelope_id.as_deref(), Some("e-1"));
        let Frame::Event(PlatformEvent::EventsApi(envelope)) = decoded.frame else {
            panic!("expected events_api");
        };
        assert_eq!(envelope.envelope_id.as_deref(), Some("e-1"));
        assert_eq!(envelope.payload.event.kind, "app_mention");
    }

    #[test]
    fn test_slash_command_and_disconnect() {
        let decoded = SocketModeCodec.decode(
            r#"{"type":"slash_commands","envelope_id":"e-2","payload":{"command":"/deploy","text":"prod"}}"#,
        );
        assert!(matches!(
            decoded.frame,
            Frame::Event(PlatformEvent::SlashCommand(ref env)) if env.payload.command == "/deploy"
        ));

        let decoded =
            SocketModeCodec.decode(r#"{"type":"disconnect","reason":"refresh_requested"}"#);
        assert_eq!(decoded.envelope_id, None);
        assert!(matches!(
            decoded.frame,
            Frame::Event(PlatformEvent::Disconnect(ref req)) if req.reason == "refresh_requested"
        ));
    }

    #[test]
    fn test_malformed_and_unknown_keep_envelope_id() {
        let malformed =
            SocketModeCodec.decode(r#"{"type":"interactive","envelope_id":"e-3","payload":7}"#);
        assert_eq!(malformed.envelope_id.as_deref(), Some("e-3"));
        assert!(matches!(malformed.frame, Frame::Malformed { .. }));

        let unknown = SocketModeCodec.decode(r#"{"type":"brand_new","envelope_id":"e-4"}"#);
        assert_eq!(unknown.envelope_id.as_deref(), Some("e-4"));
        assert_eq!(
            unknown.frame,
            Frame::Unknown {
                type_tag: "brand_new".into()
            }
        );
    }

    #[test]
    fn test_encode_ack_and_json() {
        let ack = SocketModeCodec
            .encode(&WriteItem::Ack {
                envelope_id: "e-1".into(),
            })
            .unwrap();
        assert_eq!(ack, r#"{"envelope_id":"e-1"}"#);

        let raw = WriteItem::Outgoing(OutgoingMessage {
            id: 1,
            payload: Outgoing::Json(json!({"envelope_id": "e-5", "payload": {"text": "ok"}})),
        });
        let raw: Value = serde_json::from_str(&SocketModeCodec.encode(&raw).unwrap()).unwrap();
        assert_eq!(raw, json!({"envelope_id": "e-5", "payload": {"text": "ok"}}));
    }

    #[test]
    fn test_rejects_chat_payloads() {
        let err = SocketModeCodec
            .accepts(&Outgoing::message("C1", "hi"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "chat message is not supported by the socket-mode protocol"
        );
        assert!(SocketModeCodec.encode(&WriteItem::Probe { id: 1 }).is_err());
    }
}
