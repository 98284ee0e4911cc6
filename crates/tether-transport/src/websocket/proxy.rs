//! HTTP forward proxy discovery and CONNECT tunnelling.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use tether_core::{DialError, DialResult};

/// Upper bound on the size of a CONNECT response header.
const MAX_RESPONSE_HEAD: usize = 8 * 1024;

/// How the dialer picks a forward proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProxySetting {
    /// Read `HTTPS_PROXY` / `HTTP_PROXY` and `NO_PROXY` from the environment.
    #[default]
    FromEnv,
    /// Always use this proxy.
    Explicit(String),
    /// Never use a proxy.
    Disabled,
}

impl ProxySetting {
    /// Resolves the proxy URL for a target, if any.
    pub fn resolve(&self, tls: bool, host: &str) -> Option<String> {
        match self {
            Self::Disabled => None,
            Self::Explicit(url) => Some(url.clone()),
            Self::FromEnv => proxy_for(tls, host, |key| std::env::var(key).ok()),
        }
    }
}

/// Picks a proxy for `host` using `lookup` to read environment variables.
///
/// Upper-case names win over lower-case ones. `NO_PROXY` is a comma-separated
/// list of host suffixes; `*` disables proxying entirely.
pub fn proxy_for(
    tls: bool,
    host: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let read = |upper: &str, lower: &str| {
        lookup(upper)
            .or_else(|| lookup(lower))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(no_proxy) = read("NO_PROXY", "no_proxy")
        && bypasses(&no_proxy, host)
    {
        return None;
    }

    if tls {
        read("HTTPS_PROXY", "https_proxy")
    } else {
        read("HTTP_PROXY", "http_proxy")
    }
}

fn bypasses(no_proxy: &str, host: &str) -> bool {
    let host = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase();
    no_proxy
        .split(',')
        .map(|entry| entry.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .any(|entry| {
            entry == "*"
                || host == entry
                || host
                    .strip_suffix(entry.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
}

/// A parsed `http://[user:pass@]host[:port]` proxy address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddr {
    /// `host:port` to open the TCP connection to.
    pub addr: String,
    /// Ready-made `Proxy-Authorization` header value.
    pub authorization: Option<String>,
}

impl ProxyAddr {
    /// Parses a proxy URL. A missing scheme means `http`.
    pub fn parse(url: &str) -> DialResult<Self> {
        let invalid = |reason: &str| DialError::Proxy {
            proxy: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = if url.contains("://") {
            Url::parse(url)
        } else {
            Url::parse(&format!("http://{url}"))
        }
        .map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != "http" {
            return Err(invalid("only http proxies are supported"));
        }
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?;
        let port = parsed.port_or_known_default().unwrap_or(80);

        let authorization = (!parsed.username().is_empty()).then(|| {
            let credentials = format!("{}:{}", parsed.username(), parsed.password().unwrap_or(""));
            format!("Basic {}", STANDARD.encode(credentials))
        });
        Ok(Self {
            addr: format!("{host}:{port}"),
            authorization,
        })
    }
}

/// Opens a TCP connection to `proxy` and asks it to tunnel to `target`
/// (`host:port`). Returns the stream positioned after the proxy's response.
pub async fn tunnel(proxy: &ProxyAddr, target: &str, timeout: Duration) -> DialResult<TcpStream> {
    let proxy_err = |reason: String| DialError::Proxy {
        proxy: proxy.addr.clone(),
        reason,
    };

    debug!(proxy = %proxy.addr, target = %target, "Opening proxy tunnel");
    let mut stream = tokio::time::timeout(timeout, TcpStream::connect(&proxy.addr))
        .await
        .map_err(|_| proxy_err(format!("connect timed out after {timeout:?}")))?
        .map_err(|e| proxy_err(e.to_string()))?;

    let mut request = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n");
    if let Some(auth) = &proxy.authorization {
        request.push_str(&format!("Proxy-Authorization: {auth}\r\n"));
    }
    request.push_str("\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| proxy_err(e.to_string()))?;

    let mut head = Vec::with_capacity(256);
    let mut buf = [0u8; 512];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        if head.len() > MAX_RESPONSE_HEAD {
            return Err(proxy_err("response header too large".to_string()));
        }
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| proxy_err(e.to_string()))?;
        if n == 0 {
            return Err(proxy_err("closed before answering CONNECT".to_string()));
        }
        head.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&head);
    let status_line = head.lines().next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok());
    match status {
        Some(200) => Ok(stream),
        _ => Err(proxy_err(format!("CONNECT refused: {status_line}"))),
    }
}
