//! Tether Runtime - the reconnecting client for the tether stack.
//!
//! This crate provides:
//! - The caller-facing [`Client`], its [`ClientHandle`] and [`EventFeed`]
//! - The reconnection orchestrator and the read, write and liveness pumps
//!   that run inside each connected epoch
//! - Figment-based configuration loading and validation ([`config`])
//! - Logging setup on top of `tracing-subscriber` ([`logging`])
//!
//! # Lifecycle
//!
//! Every connection attempt publishes `Connecting`, then either
//! `Connected` or `ConnectionError` (or `InvalidAuth`, after which the
//! client terminates). Each connected epoch ends with exactly one
//! `Disconnected`, whose `intentional` flag tells caller-requested
//! teardowns apart from failures. The feed closes when the client
//! terminates.
//!
//! ```ignore
//! use tether_runtime::config::load_config;
//! use tether_runtime::{Client, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let (client, mut events) = Client::from_config(&config)?;
//!     let handle = client.handle();
//!     client.start();
//!
//!     while let Some(event) = events.recv().await {
//!         tracing::info!(kind = event.type_tag(), "event");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
mod orchestrator;
mod pump;


pub use client::{Client, ClientHandle, EventFeed};
pub use config::{ConfigError, ConfigLoader, ConfigResult, TetherConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::{Client, ClientHandle, EventFeed};
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
