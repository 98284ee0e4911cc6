//! Session bootstrap over the platform's request/response API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use tether_core::{
    BootstrapError, BootstrapResult, Protocol, Session, SessionBootstrap, SessionInfo,
};

/// Default API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api/";

/// Wait assumed when a rate-limit response carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Calls the session-opening API method for one protocol variant.
///
/// The base URL is per instance, so several clients against different
/// hosts can coexist in one process.
#[derive(Debug, Clone)]
pub struct HttpBootstrap {
    client: Client,
    base_url: String,
    token: String,
    protocol: Protocol,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(flatten)]
    info: SessionInfo,
}

impl HttpBootstrap {
    /// Creates a bootstrap with its own HTTP client.
    pub fn new(token: impl Into<String>, protocol: Protocol) -> BootstrapResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BootstrapError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, token, protocol))
    }

    /// Creates a bootstrap sharing an existing HTTP client.
    pub fn with_client(client: Client, token: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            client,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            token: token.into(),
            protocol,
        }
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Full URL of the session-opening method.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.protocol.bootstrap_method())
    }
}

#[async_trait]
impl SessionBootstrap for HttpBootstrap {
    async fn open_session(&self) -> BootstrapResult<Session> {
        if self.token.trim().is_empty() {
            return Err(BootstrapError::MissingCredential);
        }

        let endpoint = self.endpoint();
        debug!(url = %endpoint, "Opening session");
        let resp = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await
            .map_err(|e| BootstrapError::Transport(e.to_string()))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
            warn!(retry_after = ?retry_after, "Session bootstrap rate limited");
            return Err(BootstrapError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BootstrapError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: ConnectResponse = resp
            .json()
            .await
            .map_err(|e| BootstrapError::InvalidResponse(e.to_string()))?;

        if !body.ok {
            let code = body.error.unwrap_or_else(|| "unknown_error".to_string());
            if code == "ratelimited" {
                return Err(BootstrapError::RateLimited {
                    retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
                });
            }
            return Err(BootstrapError::Platform { code });
        }

        let url = body
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BootstrapError::InvalidResponse("response has no url".to_string()))?;

        let session = match self.protocol {
            Protocol::Rtm => Session::new(url).with_info(body.info),
            Protocol::SocketMode => Session::new(url),
        };
        session.normalized()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Serves one canned HTTP response and returns the request head.
    async fn respond_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (base, handle)
    }

    fn bootstrap(token: &str, protocol: Protocol, base: String) -> HttpBootstrap {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpBootstrap::with_client(client, token, protocol).with_base_url(base)
    }

    fn http(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n{headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_rtm_session() {
        let (base, server) = respond_once(http(
            "200 OK",
            "",
            r#"{"ok":true,"url":"wss://wss-primary.example.test/websocket/abc","self":{"id":"U1","name":"bot"},"team":{"id":"T1","domain":"acme"}}"#,
        ))
        .await;

        let bootstrap = bootstrap("xoxb-test", Protocol::Rtm, base);
        let session = bootstrap.open_session().await.unwrap();
        assert_eq!(
            session.url,
            "wss://wss-primary.example.test:443/websocket/abc"
        );
        let info = session.info.unwrap();
        assert_eq!(info.user.unwrap().id, "U1");
        assert_eq!(info.team.unwrap().domain.as_deref(), Some("acme"));

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("post /api/rtm.connect http/1.1"));
        assert!(request.contains("authorization: bearer xoxb-test"));
    }

    #[tokio::test]
    async fn test_socket_mode_session_has_no_info() {
        let (base, _server) = respond_once(http(
            "200 OK",
            "",
            r#"{"ok":true,"url":"wss://wss-primary.example.test/link/?ticket=1"}"#,
        ))
        .await;

        let session = bootstrap("xapp-test", Protocol::SocketMode, base)
            .open_session()
            .await
            .unwrap();
        assert_eq!(session.info, None);
        assert!(session.url.starts_with("wss://wss-primary.example.test:443/"));
    }

    #[tokio::test]
    async fn test_platform_error_verbatim() {
        let (base, _server) = respond_once(http(
            "200 OK",
            "",
            r#"{"ok":false,"error":"invalid_auth"}"#,
        ))
        .await;

        let err = bootstrap("xoxb-bad", Protocol::Rtm, base)
            .open_session()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid_auth");
    }

    #[tokio::test]
    async fn test_rate_limit_and_http_errors() {
        let (base, _server) =
            respond_once(http("429 Too Many Requests", "Retry-After: 3\r\n", "{}")).await;
        let err = bootstrap("xoxb-test", Protocol::Rtm, base)
            .open_session()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::RateLimited { retry_after } if retry_after == Duration::from_secs(3)
        ));

        let (base, _server) = respond_once(http("503 Service Unavailable", "", "down")).await;
        let err = bootstrap("xoxb-test", Protocol::Rtm, base)
            .open_session()
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let err = HttpBootstrap::new("  ", Protocol::SocketMode)
            .unwrap()
            .open_session()
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::MissingCredential));
    }
}
