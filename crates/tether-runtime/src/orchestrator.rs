//! The reconnection state machine.
//!
//! ```text
//! Idle ──▶ Connecting ──▶ Connected ──▶ Draining ──▶ Connecting ...
//!              │                            │
//!              └──── fatal / caller ───▶ Terminated ◀── intentional
//! ```

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tether_core::{
    Backoff, ClientConfig, ConnectError, Event, FailureClass, FrameCodec, OutgoingMessage,
    Session, SessionBootstrap,
};
use tether_transport::{WsDialer, WsStream};

use crate::pump::{EpochResources, run_epoch};

pub(crate) struct Orchestrator {
    pub config: ClientConfig,
    pub bootstrap: Arc<dyn SessionBootstrap>,
    pub dialer: WsDialer,
    pub events: mpsc::Sender<Event>,
    pub outgoing: Arc<Mutex<mpsc::Receiver<OutgoingMessage>>>,
    pub next_id: Arc<AtomicU64>,
    /// Caller-level cancellation, shared with every handle.
    pub shutdown: CancellationToken,
}

impl Orchestrator {
    pub async fn run(self) {
        let codec: Arc<dyn FrameCodec> = self.config.protocol.codec();
        let mut backoff = Backoff::new(self.config.backoff);
        let mut epoch = 0u64;

        info!(protocol = %self.config.protocol, "Client starting");

        while !self.shutdown.is_cancelled() {
            let attempt = backoff.attempt() + 1;
            info!(attempt, epoch = epoch + 1, "Connecting");
            self.publish(Event::Connecting {
                attempt,
                epoch: epoch + 1,
            })
            .await;

            let connected = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                result = self.connect() => result,
            };

            let (session, stream) = match connected {
                Ok(connected) => connected,
                Err(err) => {
                    let wait = match err.classify() {
                        FailureClass::Fatal => {
                            error!(attempt, error = %err, "Credentials rejected, giving up");
                            self.publish(Event::InvalidAuth { error: err }).await;
                            break;
                        }
                        FailureClass::RateLimited(floor) => backoff.next_delay().max(floor),
                        FailureClass::Recoverable => backoff.next_delay(),
                    };
                    warn!(attempt, backoff = ?wait, error = %err, "Connection attempt failed");
                    self.publish(Event::ConnectionError {
                        attempt,
                        backoff: wait,
                        error: err,
                    })
                    .await;
                    if !self.sleep(wait).await {
                        break;
                    }
                    continue;
                }
            };

            epoch += 1;
            info!(epoch, url = %session.url, "Connected");
            self.publish(Event::Connected {
                epoch,
                session: session.info,
            })
            .await;

            let outcome = run_epoch(
                epoch,
                stream,
                EpochResources {
                    config: &self.config,
                    codec: &codec,
                    events: &self.events,
                    outgoing: &self.outgoing,
                    next_id: &self.next_id,
                    caller: &self.shutdown,
                },
            )
            .await;

            let intentional = outcome.reason.is_intentional();
            if intentional {
                info!(epoch, "Disconnected on request");
            } else {
                warn!(epoch, reason = %outcome.reason, "Disconnected");
            }
            self.publish(Event::Disconnected {
                epoch,
                intentional,
                reason: outcome.reason,
            })
            .await;

            if intentional {
                break;
            }
            if outcome.handshake {
                backoff.reset();
            } else {
                let wait = backoff.next_delay();
                debug!(epoch, backoff = ?wait, "Epoch ended before the handshake");
                if !self.sleep(wait).await {
                    break;
                }
            }
        }

        info!("Client terminated");
    }

    /// One attempt: bootstrap, then dial the normalized endpoint.
    async fn connect(&self) -> Result<(Session, WsStream), ConnectError> {
        let session = self.bootstrap.open_session().await?.normalized()?;
        debug!(url = %session.url, "Session opened");
        let stream = self.dialer.dial(&session.url).await?;
        Ok((session, stream))
    }

    /// Sleeps for `wait`. Returns `false` if the caller disconnected first.
    async fn sleep(&self, wait: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(wait) => true,
        }
    }

    async fn publish(&self, event: Event) {
        if self.events.send(event).await.is_err() {
            debug!("Event feed receiver dropped");
        }
    }
}
