//! Runtime error types.

use thiserror::Error;

use tether_core::BootstrapError;

use crate::config::ConfigError;

/// Errors raised while assembling a client from configuration.
///
/// Failures of a running client are never returned; they arrive as events
/// on the feed.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The bootstrap collaborator could not be built.
    #[error("Failed to build session bootstrap: {0}")]
    Bootstrap(#[from] BootstrapError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
