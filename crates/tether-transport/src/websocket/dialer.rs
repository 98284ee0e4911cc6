//! Stream dialer: TCP (optionally through a proxy tunnel), TLS, then the
//! websocket upgrade.

use std::fmt;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream, client_async_tls_with_config,
};
use tracing::{debug, info};
use url::Url;

use tether_core::{DialError, DialResult};

use super::proxy::{ProxyAddr, ProxySetting, tunnel};

/// A live duplex stream.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Establishes websocket connections to normalized stream endpoints.
///
/// The returned stream answers peer pings on its own; peer close frames
/// surface as `Message::Close` to whoever reads it.
#[derive(Clone)]
pub struct WsDialer {
    connect_timeout: Duration,
    proxy: ProxySetting,
    connector: Option<Connector>,
}

impl fmt::Debug for WsDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsDialer")
            .field("connect_timeout", &self.connect_timeout)
            .field("proxy", &self.proxy)
            .field("custom_tls", &self.connector.is_some())
            .finish()
    }
}

impl Default for WsDialer {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl WsDialer {
    /// Creates a dialer that discovers proxies from the environment.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            proxy: ProxySetting::default(),
            connector: None,
        }
    }

    /// Overrides proxy discovery.
    pub fn with_proxy(mut self, proxy: ProxySetting) -> Self {
        self.proxy = proxy;
        self
    }

    /// Overrides the TLS connector used for `wss` endpoints.
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Dials `url` and performs the websocket handshake.
    pub async fn dial(&self, url: &str) -> DialResult<WsStream> {
        let target = Target::parse(url)?;

        tokio::time::timeout(self.connect_timeout, self.dial_inner(url, &target))
            .await
            .map_err(|_| DialError::Timeout {
                url: url.to_string(),
                after: self.connect_timeout,
            })?
    }

    async fn dial_inner(&self, url: &str, target: &Target) -> DialResult<WsStream> {
        let failed = |reason: String| DialError::ConnectionFailed {
            url: url.to_string(),
            reason,
        };

        let stream = match self.proxy.resolve(target.tls, &target.host) {
            Some(proxy_url) => {
                let proxy = ProxyAddr::parse(&proxy_url)?;
                info!(proxy = %proxy.addr, url = %url, "Dialing through proxy");
                tunnel(&proxy, &target.authority(), self.connect_timeout).await?
            }
            None => TcpStream::connect((target.bare_host(), target.port))
                .await
                .map_err(|e| failed(e.to_string()))?,
        };
        stream.set_nodelay(true).map_err(|e| failed(e.to_string()))?;

        debug!(url = %url, "Performing websocket handshake");
        let (ws, _response) =
            client_async_tls_with_config(url, stream, None, self.connector.clone())
                .await
                .map_err(|e| match e {
                    WsError::Http(response) => DialError::Rejected {
                        url: url.to_string(),
                        status: response.status().as_u16(),
                    },
                    WsError::Url(e) => DialError::InvalidUrl {
                        url: url.to_string(),
                        reason: e.to_string(),
                    },
                    other => failed(other.to_string()),
                })?;
        Ok(ws)
    }
}

/// Where a stream URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    tls: bool,
    host: String,
    port: u16,
}

impl Target {
    fn parse(url: &str) -> DialResult<Self> {
        let invalid = |reason: String| DialError::InvalidUrl {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        let tls = match parsed.scheme() {
            "wss" => true,
            "ws" => false,
            other => return Err(invalid(format!("unsupported scheme {other:?}"))),
        };
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".to_string()))?
            .to_string();
        let port = parsed.port_or_known_default().unwrap_or(if tls { 443 } else { 80 });
        Ok(Self { tls, host, port })
    }

    /// Host without IPv6 brackets, for socket address resolution.
    fn bare_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// `host:port` as used in a CONNECT request.
    fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    use super::*;

    fn dialer() -> WsDialer {
        WsDialer::new(Duration::from_secs(5)).with_proxy(ProxySetting::Disabled)
    }

    #[test]
    fn test_target_parse() {
        let target = Target::parse("wss://example.test:8443/link?x=1").unwrap();
        assert!(target.tls);
        assert_eq!(target.authority(), "example.test:8443");

        let target = Target::parse("ws://[::1]/socket").unwrap();
        assert_eq!(target.port, 80);
        assert_eq!(target.bare_host(), "::1");

        assert!(matches!(
            Target::parse("https://example.test/"),
            Err(DialError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_dial_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(socket).await.unwrap();
            ws.send(Message::text(r#"{"type":"hello"}"#)).await.unwrap();
            let _ = ws.next().await;
        });

        let mut ws = dialer().dial(&format!("ws://{addr}/link")).await.unwrap();
        let first = ws.next().await.unwrap().unwrap();
        assert_eq!(first.into_text().unwrap().as_str(), r#"{"type":"hello"}"#);
    }

    #[tokio::test]
    async fn test_handshake_status_is_captured() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 2048];
            let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\n\r\n")
                .await;
        });

        let err = dialer()
            .dial(&format!("ws://{addr}/link"))
            .await
            .unwrap_err();
        assert!(matches!(err, DialError::Rejected { status: 401, .. }), "{err}");
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = dialer()
            .dial(&format!("ws://{addr}/link"))
            .await
            .unwrap_err();
        assert!(matches!(err, DialError::ConnectionFailed { .. }), "{err}");
    }
}
