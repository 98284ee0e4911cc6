//! Single-fire shutdown signal shared by the pumps of one epoch.

use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

use crate::error::TeardownReason;

/// A one-shot teardown indicator. The first caller of [`fire`](Self::fire)
/// decides the reason; later calls are no-ops.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    reason: OnceLock<TeardownReason>,
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Creates an unfired signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Returns `true` if this call won.
    pub fn fire(&self, reason: TeardownReason) -> bool {
        if self.reason.set(reason).is_ok() {
            self.token.cancel();
            true
        } else {
            false
        }
    }

    /// Returns whether the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.reason.get().is_some()
    }

    /// The winning reason, once fired.
    pub fn reason(&self) -> Option<TeardownReason> {
        self.reason.get().cloned()
    }

    /// Token cancelled when the signal fires, for use in `select!`.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Waits until the signal fires and returns the winning reason.
    pub async fn wait(&self) -> TeardownReason {
        self.token.cancelled().await;
        // `fire` stores the reason before it cancels the token.
        self.reason().unwrap_or(TeardownReason::Requested)
    }
}
