//! Liveness strategies and the outstanding-probe table.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// How a connection is judged alive. One strategy is active per protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessStrategy {
    /// Send a numbered probe every `interval` and expect a matching reply.
    /// A probe left unanswered for `timeout` kills the connection.
    Probe {
        /// Probe period.
        interval: Duration,
        /// Maximum age of an unanswered probe.
        timeout: Duration,
    },
    /// Expect the peer to probe us; a timer reset by every inbound probe
    /// kills the connection when it fires.
    Deadman {
        /// Silence tolerated before the timer fires.
        timeout: Duration,
    },
}

/// Probes sent and not yet answered, keyed by sequence id.
///
/// One table exists per epoch, so entries of a torn-down epoch can never
/// match a reply from a later one.
#[derive(Debug, Default)]
pub struct PendingProbes {
    sent: Mutex<HashMap<u64, Instant>>,
}

impl PendingProbes {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that probe `id` was sent at `at`.
    pub fn record(&self, id: u64, at: Instant) {
        self.sent.lock().insert(id, at);
    }

    /// Forgets probe `id` without measuring it (e.g. its send failed).
    pub fn forget(&self, id: u64) {
        self.sent.lock().remove(&id);
    }

    /// Matches a reply to probe `reply_to`, removing exactly that entry.
    ///
    /// Returns the round-trip time, or `None` if no such probe is pending.
    pub fn resolve(&self, reply_to: u64, now: Instant) -> Option<Duration> {
        let sent = self.sent.lock().remove(&reply_to)?;
        Some(now.saturating_duration_since(sent))
    }

    /// Age of the oldest unanswered probe.
    pub fn oldest_age(&self, now: Instant) -> Option<Duration> {
        self.sent
            .lock()
            .values()
            .map(|sent| now.saturating_duration_since(*sent))
            .max()
    }

    /// Number of unanswered probes.
    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    /// Returns true if no probe is outstanding.
    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }

    /// Drops every entry, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut sent = self.sent.lock();
        let count = sent.len();
        sent.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_removes_only_matching_entry() {
        let table = PendingProbes::new();
        let start = Instant::now();
        table.record(1, start);
        table.record(2, start);

        let rtt = table.resolve(2, start + Duration::from_millis(35));
        assert_eq!(rtt, Some(Duration::from_millis(35)));
        assert_eq!(table.len(), 1);

        assert_eq!(table.resolve(2, start), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_latency_never_negative() {
        let table = PendingProbes::new();
        let now = Instant::now();
        table.record(7, now + Duration::from_secs(1));
        assert_eq!(table.resolve(7, now), Some(Duration::ZERO));
    }

    #[test]
    fn test_oldest_age_and_clear() {
        let table = PendingProbes::new();
        let start = Instant::now();
        assert_eq!(table.oldest_age(start), None);

        table.record(1, start);
        table.record(2, start + Duration::from_millis(500));
        assert_eq!(
            table.oldest_age(start + Duration::from_secs(1)),
            Some(Duration::from_secs(1))
        );

        assert_eq!(table.clear(), 2);
        assert!(table.is_empty());
    }
}
