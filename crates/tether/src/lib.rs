//! # Tether
//!
//! A managed persistent connection to a chat platform's real-time stream,
//! speaking either the legacy RTM socket or the Socket Mode envelope socket.
//!
//! ## Overview
//!
//! A [`Client`](runtime::Client) bootstraps a session over HTTP, dials the
//! returned websocket endpoint, keeps it alive and reconnects with
//! exponential backoff whenever it drops. Everything it observes arrives on
//! one ordered event feed: lifecycle transitions, diagnostics and decoded
//! platform events.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  bootstrap  ┌────────────┐   dial   ┌──────────────────────────┐
//! │ Orchestrator │───────────▶│ HTTP API   │         │ read / write / liveness  │──▶ Event feed
//! │  (runtime)   │─────────────────────────────────────▶│ pumps (one epoch)        │
//! └──────────────┘                                      └──────────────────────────┘
//! ```
//!
//! - **Core**: events, codecs, errors, backoff, configuration types
//! - **Transport**: session bootstrap over reqwest, websocket dialer with
//!   proxy support
//! - **Runtime**: the reconnect loop, the pumps, config loading, logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tether::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = tether::runtime::config::load_config()?;
//!     tether::runtime::logging::init_from_config(&config.logging);
//!
//!     let (client, mut events) = Client::from_config(&config)?;
//!     let handle = client.handle();
//!     client.start();
//!
//!     while let Some(event) = events.recv().await {
//!         if let Event::Platform(PlatformEvent::Message(msg)) = event {
//!             if let (Some(channel), Some(text)) = (msg.channel, msg.text) {
//!                 handle.send(Outgoing::message(channel, text)).await?;
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `http-client`: HTTP session bootstrap and `Client::from_config` (default)
//! - `toml-config`: `tether.toml` configuration files (default)
//! - `yaml-config`: `tether.yaml` configuration files
//! - `json-log`: JSON log lines

pub use tether_core as core;
pub use tether_runtime as runtime;
pub use tether_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use tether::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use tether_runtime::{Client, ClientHandle, EventFeed, TetherConfig};

    // Events and outgoing messages
    pub use tether_core::{Event, Outgoing, PlatformEvent, SendFailure, TeardownReason};

    // Configuration and errors
    pub use tether_core::{BackoffPolicy, ClientConfig, ClientError, ConnectError, Protocol};

    // Collaborators for custom setups
    pub use tether_core::{Session, SessionBootstrap};
    pub use tether_transport::{ProxySetting, WsDialer};
}
