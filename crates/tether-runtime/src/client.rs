//! Caller-facing client: construction, the handle and the event feed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tether_core::{
    ClientConfig, ClientError, ClientResult, Event, FrameCodec, Outgoing, OutgoingMessage,
    SendFailure, SessionBootstrap,
};
use tether_transport::WsDialer;

use crate::orchestrator::Orchestrator;

/// Receiving end of a client's events. Closed once the client terminates.
pub type EventFeed = mpsc::Receiver<Event>;

/// A managed persistent connection.
///
/// Construct it, keep a [`ClientHandle`] for sending and disconnecting,
/// then [`run`](Self::run) or [`start`](Self::start) it. The client keeps
/// reconnecting until the caller disconnects or the credentials are
/// rejected.
///
/// ```rust,ignore
/// let (client, mut events) = Client::new(ClientConfig::new(Protocol::Rtm), bootstrap);
/// let handle = client.handle();
/// client.start();
///
/// while let Some(event) = events.recv().await {
///     if let Some(PlatformEvent::Message(msg)) = event.as_platform() {
///         handle.send(Outgoing::message(msg.channel.clone().unwrap_or_default(), "hi")).await?;
///     }
/// }
/// ```
pub struct Client {
    config: ClientConfig,
    bootstrap: Arc<dyn SessionBootstrap>,
    dialer: WsDialer,
    events: mpsc::Sender<Event>,
    outgoing: Arc<Mutex<mpsc::Receiver<OutgoingMessage>>>,
    handle: ClientHandle,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("protocol", &self.config.protocol)
            .field("dialer", &self.dialer)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client and its event feed.
    pub fn new(
        config: ClientConfig,
        bootstrap: impl SessionBootstrap + 'static,
    ) -> (Self, EventFeed) {
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
        let (outgoing_tx, outgoing_rx) = mpsc::channel(config.outgoing_buffer.max(1));

        let handle = ClientHandle {
            outgoing: outgoing_tx,
            events: events_tx.downgrade(),
            shutdown: CancellationToken::new(),
            next_id: Arc::new(AtomicU64::new(1)),
            codec: config.protocol.codec(),
            max_message_len: config.max_message_len,
        };

        let client = Self {
            dialer: WsDialer::new(config.connect_timeout),
            config,
            bootstrap: Arc::new(bootstrap),
            events: events_tx,
            outgoing: Arc::new(Mutex::new(outgoing_rx)),
            handle,
        };
        (client, events_rx)
    }

    /// Builds a validated client talking to the platform API described by
    /// `config`.
    #[cfg(feature = "http-client")]
    pub fn from_config(
        config: &crate::config::TetherConfig,
    ) -> crate::error::RuntimeResult<(Self, EventFeed)> {
        use tether_transport::HttpBootstrap;

        crate::config::validate_config(config)?;
        let conn = &config.connection;
        let bootstrap = HttpBootstrap::new(conn.token.as_str(), conn.protocol)?
            .with_base_url(conn.api_base_url.as_str());
        let (client, feed) = Self::new(conn.to_client_config(), bootstrap);
        Ok((client.with_dialer(conn.dialer()), feed))
    }

    /// Replaces the stream dialer (proxy and TLS settings).
    pub fn with_dialer(mut self, dialer: WsDialer) -> Self {
        self.dialer = dialer;
        self
    }

    /// Returns a handle for sending and disconnecting.
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// The configuration this client runs with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs the connect/reconnect loop until the client terminates. The
    /// event feed closes when this returns.
    pub async fn run(self) {
        Orchestrator {
            config: self.config,
            bootstrap: self.bootstrap,
            dialer: self.dialer,
            events: self.events,
            outgoing: self.outgoing,
            next_id: self.handle.next_id,
            shutdown: self.handle.shutdown,
        }
        .run()
        .await;
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Cloneable handle to a running client.
#[derive(Clone)]
pub struct ClientHandle {
    outgoing: mpsc::Sender<OutgoingMessage>,
    events: mpsc::WeakSender<Event>,
    shutdown: CancellationToken,
    next_id: Arc<AtomicU64>,
    codec: Arc<dyn FrameCodec>,
    max_message_len: usize,
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("protocol", &self.codec.protocol())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl ClientHandle {
    /// Queues a message and returns its sequence id.
    ///
    /// Messages the protocol cannot carry or whose text is too long are
    /// rejected here and never reach the wire. The rejection is also
    /// published as [`Event::OutgoingError`] if the feed has room; this
    /// call never waits on the feed. Messages queued while disconnected
    /// are sent once the next epoch is up.
    pub async fn send(&self, payload: Outgoing) -> ClientResult<u64> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Err(error) = self.validate(&payload) {
            warn!(id, error = %error, "Rejected outgoing message");
            self.report_rejection(id, &error);
            return Err(error);
        }

        self.outgoing
            .send(OutgoingMessage { id, payload })
            .await
            .map_err(|_| ClientError::Closed)?;
        Ok(id)
    }

    /// Sends a chat message to `channel`.
    pub async fn send_message(
        &self,
        channel: impl Into<String>,
        text: impl Into<String>,
    ) -> ClientResult<u64> {
        self.send(Outgoing::message(channel, text)).await
    }

    /// Asks the client to disconnect and terminate. Safe to call repeatedly.
    pub fn disconnect(&self) {
        self.shutdown.cancel();
    }

    /// Whether the client has stopped accepting messages.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.outgoing.is_closed()
    }

    /// Mirrors a local rejection on the feed without waiting for room; the
    /// caller already has the error.
    fn report_rejection(&self, id: u64, error: &ClientError) {
        let Some(events) = self.events.upgrade() else {
            return;
        };
        let event = Event::OutgoingError {
            id: Some(id),
            error: SendFailure::Local(error.clone()),
        };
        match events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(id, "Event feed full, rejection not published");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn validate(&self, payload: &Outgoing) -> ClientResult<()> {
        self.codec.accepts(payload)?;
        if let Some(len) = payload.text_len()
            && len > self.max_message_len
        {
            return Err(ClientError::MessageTooLong {
                len,
                max: self.max_message_len,
            });
        }
        Ok(())
    }
}
