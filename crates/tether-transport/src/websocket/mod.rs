//! Websocket stream dialing.
//!
//! [`WsDialer`] turns a normalized stream endpoint into a live [`WsStream`],
//! tunnelling through an HTTP forward proxy when one is configured.

mod dialer;
mod proxy;

pub use dialer::{WsDialer, WsStream};
pub use proxy::{ProxyAddr, ProxySetting, proxy_for, tunnel};

pub use tokio_tungstenite::Connector;
