//! Configuration validation utilities.

use tether_transport::websocket::ProxyAddr;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BackoffSettings, ConnectionSettings, LogOutput, LoggingConfig, TetherConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &TetherConfig) -> ConfigResult<()> {
    validate_logging(&config.logging)?;
    validate_connection(&config.connection)?;
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates connection settings.
pub fn validate_connection(conn: &ConnectionSettings) -> ConfigResult<()> {
    if conn.token.trim().is_empty() {
        return Err(ConfigError::missing_field("connection.token"));
    }

    let url = &conn.api_base_url;
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ConfigError::invalid_url(
            url,
            "API base URL must start with http:// or https://",
        ));
    }

    if let Some(proxy) = &conn.proxy {
        ProxyAddr::parse(proxy).map_err(|e| ConfigError::invalid_url(proxy, e.to_string()))?;
    }

    validate_backoff(&conn.backoff)?;

    let timeouts = [
        ("ping_interval_ms", conn.ping_interval_ms),
        ("pong_timeout_ms", conn.pong_timeout_ms),
        ("deadman_timeout_ms", conn.deadman_timeout_ms),
        ("write_timeout_ms", conn.write_timeout_ms),
        ("connect_timeout_ms", conn.connect_timeout_ms),
        ("close_timeout_ms", conn.close_timeout_ms),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::validation(format!(
                "connection.{name} must be greater than 0"
            )));
        }
    }

    let sizes = [
        ("max_message_len", conn.max_message_len),
        ("max_frame_bytes", conn.max_frame_bytes),
        ("event_buffer", conn.event_buffer),
        ("outgoing_buffer", conn.outgoing_buffer),
    ];
    for (name, value) in sizes {
        if value == 0 {
            return Err(ConfigError::validation(format!(
                "connection.{name} must be greater than 0"
            )));
        }
    }

    Ok(())
}

fn validate_backoff(backoff: &BackoffSettings) -> ConfigResult<()> {
    if backoff.min_ms == 0 {
        return Err(ConfigError::validation(
            "Backoff minimum must be greater than 0",
        ));
    }

    if backoff.max_ms < backoff.min_ms {
        return Err(ConfigError::validation(
            "Backoff maximum must be greater than or equal to the minimum",
        ));
    }

    if !backoff.factor.is_finite() || backoff.factor < 1.0 {
        return Err(ConfigError::validation(
            "Backoff factor must be at least 1.0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TetherConfig {
        TetherConfig {
            connection: ConnectionSettings {
                token: "xapp-1-test".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_token() {
        let mut config = valid();
        config.connection.token = "   ".into();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "connection.token"));
    }

    #[test]
    fn test_invalid_api_base_url() {
        let mut config = valid();
        config.connection.api_base_url = "ftp://slack.com/api/".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_invalid_proxy() {
        let mut config = valid();
        config.connection.proxy = Some("socks5://proxy.test:1080".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_backoff_bounds() {
        let mut config = valid();
        config.connection.backoff.max_ms = 10;
        config.connection.backoff.min_ms = 100;
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.connection.backoff.factor = 0.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = valid();
        config.connection.write_timeout_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("write_timeout_ms"));
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = valid();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
    }
}
