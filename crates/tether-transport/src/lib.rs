//! # Tether Transport
//!
//! Network collaborators for the tether persistent connection client.
//!
//! This crate provides the concrete pieces that touch the network, each
//! behind a feature flag:
//!
//! - `ws-client`: [`websocket::WsDialer`], which dials a stream endpoint,
//!   optionally through an HTTP CONNECT proxy discovered from the
//!   environment, and performs the websocket upgrade
//! - `http-client`: [`http::HttpBootstrap`], the reqwest implementation of
//!   [`tether_core::SessionBootstrap`]
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  tether-runtime     │  (orchestrator and pumps)
//! ├─────────────────────┤
//! │  tether-transport   │  <- This crate (bootstrap call, dialer)
//! ├─────────────────────┤
//! │  tether-core        │  (errors, codecs, events)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use tether_core::{Protocol, SessionBootstrap};
//! use tether_transport::http::HttpBootstrap;
//! use tether_transport::websocket::WsDialer;
//!
//! let bootstrap = HttpBootstrap::new("xapp-...", Protocol::SocketMode)?;
//! let session = bootstrap.open_session().await?;
//! let stream = WsDialer::new(Duration::from_secs(30)).dial(&session.url).await?;
//! ```

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod websocket;

#[cfg(feature = "http-client")]
pub use http::HttpBootstrap;

#[cfg(feature = "ws-client")]
pub use websocket::{ProxySetting, WsDialer, WsStream};
