//! The three workers of one connected epoch.
//!
//! ```text
//!                 ┌────────────┐  WriteItem::Ack  ┌────────────┐
//!   stream ──────▶│ read pump  │─────────────────▶│ write pump │──────▶ stream
//!                 └────────────┘                  └────────────┘
//!                       │ heartbeat / pong              ▲  ▲
//!                       ▼                               │  │ OutgoingMessage
//!                 ┌────────────┐  WriteItem::Probe      │  │ (caller queue)
//!                 │  liveness  │────────────────────────┘
//!                 └────────────┘
//! ```
//!
//! All three watch the epoch's [`ShutdownSignal`]; the first to fail fires
//! it and the others drain. A pump that ends any other way, panics
//! included, fires it on the way out.

mod liveness;
mod read;
mod write;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::StreamExt;
use futures::stream::{SplitSink, SplitStream};
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{Instrument, Span, debug, info_span, warn};

use tether_core::{
    ClientConfig, Event, FrameCodec, OutgoingMessage, PendingProbes, ShutdownSignal,
    TeardownReason, WriteItem,
};
use tether_transport::WsStream;

use crate::logging::EPOCH_SPAN;

pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;

/// Capacity of the per-epoch queue carrying acks and probes.
const INTERNAL_QUEUE: usize = 64;

/// State shared by the pumps of one epoch and dropped with it.
#[derive(Debug)]
pub(crate) struct Epoch {
    pub number: u64,
    pub config: ClientConfig,
    pub codec: Arc<dyn FrameCodec>,
    pub signal: ShutdownSignal,
    pub probes: PendingProbes,
    /// Pinged by the read pump on every peer probe.
    pub heartbeat: Notify,
    handshake: AtomicBool,
    events: mpsc::Sender<Event>,
}

impl Epoch {
    fn new(
        number: u64,
        config: ClientConfig,
        codec: Arc<dyn FrameCodec>,
        events: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            number,
            config,
            codec,
            signal: ShutdownSignal::new(),
            probes: PendingProbes::new(),
            heartbeat: Notify::new(),
            handshake: AtomicBool::new(false),
            events,
        }
    }

    /// Publishes to the feed unless the epoch is already tearing down.
    pub async fn publish(&self, event: Event) {
        let kind = event.type_tag();
        tokio::select! {
            biased;
            _ = self.signal.token().cancelled() => {
                debug!(kind, "Dropping event from a closing epoch");
            }
            result = self.events.send(event) => {
                if result.is_err() {
                    debug!("Event feed receiver dropped");
                }
            }
        }
    }

    pub fn mark_handshake(&self) {
        self.handshake.store(true, Ordering::Release);
    }

    pub fn saw_handshake(&self) -> bool {
        self.handshake.load(Ordering::Acquire)
    }
}

/// How an epoch ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EpochOutcome {
    pub reason: TeardownReason,
    /// Whether the peer's handshake arrived during the epoch.
    pub handshake: bool,
}

/// Inputs of one epoch that outlive it.
pub(crate) struct EpochResources<'a> {
    pub config: &'a ClientConfig,
    pub codec: &'a Arc<dyn FrameCodec>,
    pub events: &'a mpsc::Sender<Event>,
    pub outgoing: &'a Arc<Mutex<mpsc::Receiver<OutgoingMessage>>>,
    pub next_id: &'a Arc<AtomicU64>,
    pub caller: &'a tokio_util::sync::CancellationToken,
}

/// Runs the pumps over `stream` until the epoch is torn down, then waits
/// for all of them to exit.
pub(crate) async fn run_epoch(
    number: u64,
    stream: WsStream,
    res: EpochResources<'_>,
) -> EpochOutcome {
    let epoch = Arc::new(Epoch::new(
        number,
        res.config.clone(),
        Arc::clone(res.codec),
        res.events.clone(),
    ));

    let (sink, source) = stream.split();
    let (writes_tx, writes_rx) = mpsc::channel::<WriteItem>(INTERNAL_QUEUE);

    let span = info_span!(EPOCH_SPAN, epoch = number);
    let reader = spawn_pump(
        &epoch,
        "read",
        span.clone(),
        read::run(Arc::clone(&epoch), source, writes_tx.clone()),
    );
    let writer = spawn_pump(
        &epoch,
        "write",
        span.clone(),
        write::run(
            Arc::clone(&epoch),
            sink,
            writes_rx,
            Arc::clone(res.outgoing),
        ),
    );
    let monitor = spawn_pump(
        &epoch,
        "liveness",
        span,
        liveness::run(Arc::clone(&epoch), writes_tx, Arc::clone(res.next_id)),
    );

    tokio::select! {
        _ = res.caller.cancelled() => {
            epoch.signal.fire(TeardownReason::Requested);
        }
        _ = epoch.signal.token().cancelled() => {}
    }

    for (name, handle) in [("read", reader), ("write", writer), ("liveness", monitor)] {
        if let Err(e) = handle.await {
            warn!(epoch = number, pump = name, error = %e, "Pump task failed");
        }
    }

    let stale = epoch.probes.clear();
    if stale > 0 {
        debug!(epoch = number, stale, "Discarded unanswered probes");
    }

    EpochOutcome {
        reason: epoch.signal.reason().unwrap_or(TeardownReason::Requested),
        handshake: epoch.saw_handshake(),
    }
}

/// Tears the epoch down when its pump ends, whether the pump returned or
/// panicked. No-op if the epoch is already closing.
struct PumpGuard {
    epoch: Arc<Epoch>,
    pump: &'static str,
}

impl Drop for PumpGuard {
    fn drop(&mut self) {
        if self
            .epoch
            .signal
            .fire(TeardownReason::PumpStopped(self.pump))
        {
            warn!(epoch = self.epoch.number, pump = self.pump, "Pump stopped early");
        }
    }
}

fn spawn_pump<F>(epoch: &Arc<Epoch>, pump: &'static str, span: Span, task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let guard = PumpGuard {
        epoch: Arc::clone(epoch),
        pump,
    };
    tokio::spawn(
        async move {
            let _guard = guard;
            task.await;
        }
        .instrument(span),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use tether_core::Protocol;

    fn epoch() -> (Arc<Epoch>, mpsc::Receiver<Event>) {
        let config = ClientConfig::new(Protocol::Rtm);
        let codec = config.protocol.codec();
        let (tx, rx) = mpsc::channel(1);
        (Arc::new(Epoch::new(1, config, codec, tx)), rx)
    }

    #[tokio::test]
    async fn test_panicking_pump_tears_epoch_down() {
        let (epoch, _feed) = epoch();
        let handle = spawn_pump(&epoch, "liveness", Span::none(), async {
            panic!("timer misconfigured");
        });

        let err = handle.await.unwrap_err();
        assert!(err.is_panic());
        assert!(epoch.signal.is_fired());
        assert_eq!(
            epoch.signal.reason(),
            Some(TeardownReason::PumpStopped("liveness"))
        );
    }

    #[tokio::test]
    async fn test_returning_pump_tears_epoch_down() {
        let (epoch, _feed) = epoch();
        spawn_pump(&epoch, "write", Span::none(), async {})
            .await
            .unwrap();
        assert_eq!(
            epoch.signal.reason(),
            Some(TeardownReason::PumpStopped("write"))
        );
    }

    #[tokio::test]
    async fn test_pump_keeps_its_own_teardown_reason() {
        let (epoch, _feed) = epoch();
        let inner = Arc::clone(&epoch);
        spawn_pump(&epoch, "read", Span::none(), async move {
            inner.signal.fire(TeardownReason::EndOfStream);
        })
        .await
        .unwrap();
        assert_eq!(epoch.signal.reason(), Some(TeardownReason::EndOfStream));
    }
}
