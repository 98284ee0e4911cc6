//! Read pump: receives frames, acknowledges envelopes and publishes events.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, trace, warn};

use tether_core::{Event, Frame, SendFailure, TeardownReason, WriteItem};

use super::{Epoch, WsSource};

pub(super) async fn run(
    epoch: Arc<Epoch>,
    mut source: WsSource,
    writes: mpsc::Sender<WriteItem>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = epoch.signal.token().cancelled() => break,
            next = source.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                handle_frame(&epoch, &writes, text.as_str()).await;
            }
            Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                Ok(text) => handle_frame(&epoch, &writes, text).await,
                Err(e) => {
                    warn!(len = data.len(), "Dropping non-UTF-8 binary frame");
                    epoch
                        .publish(Event::DecodeError {
                            type_tag: String::new(),
                            error: e.to_string(),
                            raw: String::from_utf8_lossy(&data).into_owned(),
                        })
                        .await;
                }
            },
            Some(Ok(Message::Ping(_))) => {
                // tungstenite queues the pong itself.
                trace!("Peer probe");
                epoch.heartbeat.notify_one();
            }
            Some(Ok(Message::Pong(_))) => trace!("Protocol pong"),
            Some(Ok(Message::Frame(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                let (code, reason) = match frame {
                    Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_string()),
                    None => (u16::from(CloseCode::Status), String::new()),
                };
                info!(code, reason = %reason, "Peer closed the connection");
                epoch
                    .signal
                    .fire(TeardownReason::PeerClosed { code, reason });
                break;
            }
            Some(Err(e)) => {
                epoch.signal.fire(TeardownReason::ReadFailed(e.to_string()));
                break;
            }
            None => {
                epoch.signal.fire(TeardownReason::EndOfStream);
                break;
            }
        }
    }
    debug!("Read pump stopped");
}

async fn handle_frame(epoch: &Epoch, writes: &mpsc::Sender<WriteItem>, text: &str) {
    let decoded = epoch.codec.decode(text);

    if let Some(envelope_id) = decoded.envelope_id {
        trace!(envelope_id = %envelope_id, "Acknowledging envelope");
        if writes.send(WriteItem::Ack { envelope_id }).await.is_err() {
            return;
        }
    }

    match decoded.frame {
        Frame::Empty => {}
        Frame::Handshake(hello) => {
            info!(
                protocol = %epoch.codec.protocol(),
                num_connections = ?hello.num_connections,
                "Handshake received"
            );
            epoch.mark_handshake();
        }
        Frame::Pong { reply_to } => match epoch.probes.resolve(reply_to, Instant::now()) {
            Some(rtt) => {
                debug!(reply_to, rtt = ?rtt, "Probe answered");
                epoch
                    .publish(Event::LatencyReport {
                        epoch: epoch.number,
                        rtt,
                    })
                    .await;
            }
            None => debug!(reply_to, "Pong for unknown probe"),
        },
        Frame::Ack(ack) => {
            if ack.ok {
                trace!(reply_to = ?ack.reply_to, "Message acknowledged");
            } else {
                let error = ack.error.unwrap_or_default();
                warn!(reply_to = ?ack.reply_to, code = error.code, msg = %error.msg, "Message refused");
                epoch
                    .publish(Event::OutgoingError {
                        id: ack.reply_to,
                        error: SendFailure::Remote(error),
                    })
                    .await;
            }
        }
        Frame::Event(event) => {
            let reconnect = event.reconnect_reason().map(str::to_string);
            trace!(kind = event.type_tag(), "Publishing event");
            epoch.publish(Event::Platform(event)).await;
            if let Some(reason) = reconnect {
                info!(reason = %reason, "Peer requested reconnect");
                epoch
                    .signal
                    .fire(TeardownReason::ReconnectRequested(reason));
            }
        }
        Frame::Malformed { type_tag, error } => {
            warn!(type_tag = %type_tag, error = %error, "Dropping malformed frame");
            epoch
                .publish(Event::DecodeError {
                    type_tag,
                    error,
                    raw: text.to_string(),
                })
                .await;
        }
        Frame::Unknown { type_tag } => {
            warn!(type_tag = %type_tag, "Dropping frame of unknown type");
        }
        Frame::Ignored { type_tag } => {
            debug!(type_tag, "Ignoring frame");
        }
    }
}
