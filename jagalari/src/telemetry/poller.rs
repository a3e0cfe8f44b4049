//! Snapshot poller - the periodic telemetry task.
//!
//! # Design
//!
//! - `new()` + `start(cancel)` spawns the async loop
//! - `tokio::time::interval` with [`MissedTickBehavior::Delay`]; the first
//!   tick fires immediately
//! - each fetch is awaited before the next tick, so polls never overlap
//! - the loop stops on cancellation or when the session's channel closes

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::source::{fetch_snapshot, SnapshotSource};
use crate::session::SessionEvent;

/// Time between polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct SnapshotPoller<S: SnapshotSource> {
    source: Arc<S>,
    events: mpsc::Sender<SessionEvent>,
    interval: Duration,
}

impl<S: SnapshotSource> SnapshotPoller<S> {
    pub fn new(source: Arc<S>, events: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            source,
            events,
            interval: POLL_INTERVAL,
        }
    }

    /// Start polling as an async task.
    pub fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cancel).await;
        })
    }

    async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.interval.as_secs(),
            "Telemetry poller started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = fetch_snapshot(self.source.as_ref()) => result,
            };
            polls += 1;

            match &result {
                Ok(snapshot) => tracing::debug!(
                    poll = polls,
                    devices = snapshot.devices.len(),
                    positions = snapshot.positions.len(),
                    "Snapshot fetched"
                ),
                Err(e) => tracing::warn!(poll = polls, error = %e, "Snapshot fetch failed"),
            }

            if self.events.send(SessionEvent::Poll(result)).await.is_err() {
                tracing::debug!("Session channel closed, stopping poller");
                break;
            }
        }

        tracing::info!(polls, "Telemetry poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::fleet::fixtures::{device, position};
    use crate::telemetry::source::mock::MockSource;

    fn source() -> MockSource {
        MockSource::new(vec![device(1, "A", "online")], vec![position(1, 1.0, 1.0)])
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_is_immediate_then_every_interval() {
        let source = Arc::new(source());
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = SnapshotPoller::new(Arc::clone(&source), tx).start(cancel.clone());

        assert!(matches!(rx.recv().await, Some(SessionEvent::Poll(Ok(_)))));
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(POLL_INTERVAL * 2 + Duration::from_secs(1)).await;
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert_eq!(source.calls(), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetches_never_overlap() {
        let source = Arc::new(source().with_delay(Duration::from_secs(45)));
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = SnapshotPoller::new(Arc::clone(&source), tx).start(cancel.clone());

        for _ in 0..3 {
            assert!(rx.recv().await.is_some());
        }

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_poller() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = SnapshotPoller::new(Arc::new(source()), tx).start(cancel.clone());
        assert!(rx.recv().await.is_some());

        cancel.cancel();
        handle.await.unwrap();

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_stops_poller() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let handle = SnapshotPoller::new(Arc::new(source()), tx).start(CancellationToken::new());

        handle.await.unwrap();
    }
}
