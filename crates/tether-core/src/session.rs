//! Session bootstrap: the single request/response call the stream needs.
//!
//! The platform hands out a short-lived stream URL through an ordinary API
//! call. The URL may omit its port; [`Session::normalized`] makes it directly
//! dialable before the dialer ever sees it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{BootstrapError, BootstrapResult};

/// Opens a session and returns where to connect.
///
/// Implemented by the HTTP transport in production and by scripted fakes in
/// tests. Calls are idempotent and may be retried by the orchestrator.
#[async_trait]
pub trait SessionBootstrap: Send + Sync {
    /// Requests a fresh stream endpoint.
    async fn open_session(&self) -> BootstrapResult<Session>;
}

/// Result of a successful bootstrap call.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Stream endpoint URL.
    pub url: String,
    /// Session snapshot (legacy variant only).
    pub info: Option<SessionInfo>,
}

impl Session {
    /// Creates a session without metadata.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            info: None,
        }
    }

    /// Attaches session metadata.
    pub fn with_info(mut self, info: SessionInfo) -> Self {
        self.info = Some(info);
        self
    }

    /// Validates the endpoint and rewrites it with an explicit port.
    pub fn normalized(mut self) -> BootstrapResult<Self> {
        self.url = normalize_endpoint(&self.url)?;
        Ok(self)
    }
}

/// Identity snapshot returned by the legacy bootstrap call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// The authenticated user.
    #[serde(rename = "self", default)]
    pub user: Option<Identity>,
    /// The workspace the user belongs to.
    #[serde(default)]
    pub team: Option<TeamIdentity>,
}

/// A user identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A workspace identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamIdentity {
    /// Team ID.
    pub id: String,
    /// Team name.
    #[serde(default)]
    pub name: Option<String>,
    /// Team domain.
    #[serde(default)]
    pub domain: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rewrites a stream endpoint into `scheme://host:port/path?query` form.
///
/// `https`/`http` are mapped to `wss`/`ws`, and the scheme's default port
/// (443 or 80) is inserted when the authority carries none.
pub fn normalize_endpoint(url: &str) -> BootstrapResult<String> {
    let invalid = |reason: &str| BootstrapError::InvalidEndpoint {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    let (scheme, default_port) = match parsed.scheme() {
        "wss" | "https" => ("wss", 443),
        "ws" | "http" => ("ws", 80),
        _ => return Err(invalid("scheme must be ws or wss")),
    };
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host"))?;
    // `Url` hides the scheme's default port, so it is rendered by hand.
    let port = parsed.port().unwrap_or(default_port);

    let mut normalized = format!("{scheme}://{host}:{port}{}", parsed.path());
    if let Some(query) = parsed.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inserts_default_port() {
        assert_eq!(
            normalize_endpoint("wss://wss-primary.example.test/link/?ticket=abc").unwrap(),
            "wss://wss-primary.example.test:443/link/?ticket=abc"
        );
        assert_eq!(
            normalize_endpoint("ws://127.0.0.1/socket").unwrap(),
            "ws://127.0.0.1:80/socket"
        );
    }

    #[test]
    fn test_keeps_explicit_port() {
        assert_eq!(
            normalize_endpoint("ws://127.0.0.1:9001/socket").unwrap(),
            "ws://127.0.0.1:9001/socket"
        );
    }

    #[test]
    fn test_maps_http_schemes() {
        assert_eq!(
            normalize_endpoint("https://example.test").unwrap(),
            "wss://example.test:443/"
        );
        assert_eq!(
            normalize_endpoint("http://example.test?x=1").unwrap(),
            "ws://example.test:80/?x=1"
        );
    }

    #[test]
    fn test_ipv6_hosts() {
        assert_eq!(
            normalize_endpoint("wss://[::1]/ws").unwrap(),
            "wss://[::1]:443/ws"
        );
        assert_eq!(
            normalize_endpoint("wss://[::1]:8443/ws").unwrap(),
            "wss://[::1]:8443/ws"
        );
    }

    #[test]
    fn test_rejects_garbage() {
        for url in ["", "example.test/ws", "ftp://example.test", "wss://", "wss://host:abc/"] {
            assert!(
                matches!(normalize_endpoint(url), Err(BootstrapError::InvalidEndpoint { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn test_session_info_decodes_self_and_team() {
        let info: SessionInfo = serde_json::from_str(
            r#"{"self":{"id":"U1","name":"bot","prefs":{}},"team":{"id":"T1","domain":"acme"}}"#,
        )
        .unwrap();
        let user = info.user.unwrap();
        assert_eq!(user.id, "U1");
        assert_eq!(user.name.as_deref(), Some("bot"));
        assert!(user.extra.contains_key("prefs"));
        assert_eq!(info.team.unwrap().domain.as_deref(), Some("acme"));
    }
}
