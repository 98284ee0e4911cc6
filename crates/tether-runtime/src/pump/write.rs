//! Write pump: the only task that sends on the stream.

use std::sync::Arc;

use futures::SinkExt;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, timeout};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use tether_core::{
    ClientError, Event, OutgoingMessage, SendFailure, TeardownReason, WriteItem,
};

use super::{Epoch, WsSink};

pub(super) async fn run(
    epoch: Arc<Epoch>,
    mut sink: WsSink,
    mut internal: mpsc::Receiver<WriteItem>,
    outgoing: Arc<Mutex<mpsc::Receiver<OutgoingMessage>>>,
) {
    // Held for the whole epoch; the previous epoch's writer has exited.
    let mut outgoing = outgoing.lock().await;

    loop {
        let item = tokio::select! {
            biased;
            _ = epoch.signal.token().cancelled() => break,
            Some(item) = internal.recv() => item,
            Some(msg) = outgoing.recv() => WriteItem::Outgoing(msg),
            else => break,
        };

        if let Err(reason) = write_item(&epoch, &mut sink, item).await {
            epoch.signal.fire(reason);
            break;
        }
    }

    match timeout(epoch.config.close_timeout, sink.close()).await {
        Ok(Ok(())) => trace!("Sent close frame"),
        Ok(Err(e)) => debug!(error = %e, "Close handshake failed"),
        Err(_) => debug!(after = ?epoch.config.close_timeout, "Close handshake timed out"),
    }
    debug!("Write pump stopped");
}

/// Encodes and sends one item. Only stream failures are returned; local
/// rejections are reported on the feed and leave the connection up.
async fn write_item(
    epoch: &Epoch,
    sink: &mut WsSink,
    item: WriteItem,
) -> Result<(), TeardownReason> {
    let text = match encode(epoch, &item) {
        Ok(text) => text,
        Err(error) => {
            match &item {
                WriteItem::Outgoing(msg) => {
                    warn!(id = msg.id, error = %error, "Rejected outgoing message");
                    epoch
                        .publish(Event::OutgoingError {
                            id: Some(msg.id),
                            error: SendFailure::Local(error),
                        })
                        .await;
                }
                other => warn!(item = ?other, error = %error, "Dropping internal frame"),
            }
            return Ok(());
        }
    };

    if let WriteItem::Probe { id } = item {
        epoch.probes.record(id, Instant::now());
    }

    trace!(len = text.len(), id = ?item.id(), "Sending frame");
    let write_timeout = epoch.config.write_timeout;
    match timeout(write_timeout, sink.send(Message::text(text))).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            forget_probe(epoch, &item);
            Err(TeardownReason::WriteFailed(e.to_string()))
        }
        Err(_) => {
            forget_probe(epoch, &item);
            Err(TeardownReason::WriteTimeout(write_timeout))
        }
    }
}

fn encode(epoch: &Epoch, item: &WriteItem) -> Result<String, ClientError> {
    let text = epoch.codec.encode(item)?;
    let max = epoch.config.max_frame_bytes;
    if text.len() > max {
        return Err(ClientError::FrameTooLarge {
            len: text.len(),
            max,
        });
    }
    Ok(text)
}

fn forget_probe(epoch: &Epoch, item: &WriteItem) {
    if let WriteItem::Probe { id } = item {
        epoch.probes.forget(*id);
    }
}
