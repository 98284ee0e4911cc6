//! Configuration for the tether runtime.
//!
//! Loading is layered through figment (see [`loader`]); the result is a
//! [`TetherConfig`] that converts into the typed [`tether_core::ClientConfig`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BackoffSettings, ConnectionSettings, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig, TetherConfig,
};
pub use validation::{validate_config, validate_connection};
