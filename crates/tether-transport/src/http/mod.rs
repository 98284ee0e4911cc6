//! HTTP collaborators.
//!
//! This module provides the session bootstrap call over reqwest.

mod bootstrap;

pub use bootstrap::{DEFAULT_API_BASE_URL, HttpBootstrap};
