//! Liveness monitor. Runs the strategy the protocol selects.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use tether_core::{LivenessStrategy, TeardownReason, WriteItem};

use super::Epoch;

pub(super) async fn run(
    epoch: Arc<Epoch>,
    writes: mpsc::Sender<WriteItem>,
    next_id: Arc<AtomicU64>,
) {
    match epoch.config.liveness() {
        LivenessStrategy::Probe { interval, timeout } => {
            probe(&epoch, &writes, &next_id, interval, timeout).await;
        }
        LivenessStrategy::Deadman { timeout } => deadman(&epoch, timeout).await,
    }
    debug!("Liveness monitor stopped");
}

/// Sends a numbered probe every `interval`; gives up on the connection once
/// the oldest unanswered probe is `timeout` old.
async fn probe(
    epoch: &Epoch,
    writes: &mpsc::Sender<WriteItem>,
    next_id: &AtomicU64,
    interval: Duration,
    timeout: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = epoch.signal.token().cancelled() => return,
            _ = ticker.tick() => {}
        }

        if let Some(age) = epoch.probes.oldest_age(Instant::now())
            && age >= timeout
        {
            warn!(age = ?age, outstanding = epoch.probes.len(), "Probe unanswered");
            epoch.signal.fire(TeardownReason::PongTimeout(timeout));
            return;
        }

        let id = next_id.fetch_add(1, Ordering::Relaxed);
        trace!(id, "Queueing probe");
        if writes.send(WriteItem::Probe { id }).await.is_err() {
            return;
        }
    }
}

/// Fires unless a peer probe resets the timer within `timeout`.
async fn deadman(epoch: &Epoch, timeout: Duration) {
    loop {
        tokio::select! {
            biased;
            _ = epoch.signal.token().cancelled() => return,
            _ = epoch.heartbeat.notified() => continue,
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout = ?timeout, "No peer probe received");
                epoch.signal.fire(TeardownReason::DeadmanExpired(timeout));
                return;
            }
        }
    }
}
