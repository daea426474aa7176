// Telemetry poller - recurring fetch, normalize and publish lifecycle
use crate::application::fallback::fallback_flights;
use crate::application::normalizer::{DEFAULT_RECORD_LIMIT, normalize};
use crate::application::state_feed::{FeedError, StateFeed};
use crate::domain::snapshot::TelemetrySnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5_000);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub type SnapshotCallback = Arc<dyn Fn(Arc<TelemetrySnapshot>) + Send + Sync>;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub record_limit: usize,
    /// Upper bound on a single feed request, whatever the feed implementation
    pub fetch_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            record_limit: DEFAULT_RECORD_LIMIT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

#[derive(Debug, Error)]
pub enum FallbackReason {
    #[error("feed returned no usable records")]
    NoUsableRecords,

    #[error(transparent)]
    FeedUnavailable(#[from] FeedError),
}

/// Result of one poll cycle. Both branches carry a renderable snapshot.
#[derive(Debug)]
pub enum PollOutcome {
    Live(TelemetrySnapshot),
    Fallback {
        snapshot: TelemetrySnapshot,
        reason: FallbackReason,
    },
}

impl PollOutcome {
    #[cfg(test)]
    pub fn is_live(&self) -> bool {
        matches!(self, PollOutcome::Live(_))
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        match self {
            PollOutcome::Live(snapshot) => snapshot,
            PollOutcome::Fallback { snapshot, .. } => snapshot,
        }
    }

    pub fn into_snapshot(self) -> TelemetrySnapshot {
        match self {
            PollOutcome::Live(snapshot) => snapshot,
            PollOutcome::Fallback { snapshot, .. } => snapshot,
        }
    }
}

#[derive(Clone)]
pub struct TelemetryPoller {
    feed: Arc<dyn StateFeed>,
    config: PollerConfig,
}

impl TelemetryPoller {
    pub fn new(feed: Arc<dyn StateFeed>, config: PollerConfig) -> Self {
        Self { feed, config }
    }

    /// Run one fetch-normalize cycle without publishing it.
    pub async fn poll_once(&self, sequence: u64) -> PollOutcome {
        let timeout = self.config.fetch_timeout;
        let fetched = match tokio::time::timeout(timeout, self.feed.fetch_states()).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(timeout)),
        };

        match fetched {
            Ok(raw) => {
                let flights = normalize(&raw, self.config.record_limit);
                debug!(
                    "Normalized {} of {} state vectors (limit {})",
                    flights.len(),
                    raw.len(),
                    self.config.record_limit
                );

                let snapshot = TelemetrySnapshot::live(sequence, flights);
                if snapshot.is_empty() {
                    Self::fallback(sequence, FallbackReason::NoUsableRecords)
                } else {
                    PollOutcome::Live(snapshot)
                }
            }
            Err(err) => Self::fallback(sequence, err.into()),
        }
    }

    fn fallback(sequence: u64, reason: FallbackReason) -> PollOutcome {
        PollOutcome::Fallback {
            snapshot: TelemetrySnapshot::fallback(sequence, fallback_flights()),
            reason,
        }
    }

    /// Start polling at the configured interval. Must be called inside a tokio runtime.
    pub fn start<F>(&self, on_snapshot: F) -> PollerHandle
    where
        F: Fn(Arc<TelemetrySnapshot>) + Send + Sync + 'static,
    {
        self.start_with_interval(on_snapshot, self.config.interval)
    }

    /// Poll once immediately, then every `interval` until the handle is stopped.
    ///
    /// A cycle always finishes before the next tick is awaited and ticks missed
    /// meanwhile are skipped, so a handle never has two requests in flight.
    pub fn start_with_interval<F>(&self, on_snapshot: F, interval: Duration) -> PollerHandle
    where
        F: Fn(Arc<TelemetrySnapshot>) + Send + Sync + 'static,
    {
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        let interval = interval.max(MIN_POLL_INTERVAL);
        let gate = Arc::new(PublishGate::new(Arc::new(on_snapshot)));
        let cancel = CancellationToken::new();

        info!(
            handle = id,
            interval_ms = interval.as_millis() as u64,
            record_limit = self.config.record_limit,
            "Starting telemetry poller"
        );

        let task = tokio::spawn(run_poll_loop(
            self.clone(),
            id,
            interval,
            gate.clone(),
            cancel.clone(),
        ));

        PollerHandle {
            id,
            gate,
            cancel,
            task,
        }
    }
}

async fn run_poll_loop(
    poller: TelemetryPoller,
    handle: u64,
    interval: Duration,
    gate: Arc<PublishGate>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sequence = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        sequence += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(handle, sequence, "Discarding in-flight poll cycle");
                break;
            }
            outcome = poller.poll_once(sequence) => outcome,
        };

        let records = outcome.snapshot().len();
        match &outcome {
            PollOutcome::Live(_) => {
                debug!(handle, sequence, records, "Publishing live snapshot");
            }
            PollOutcome::Fallback { reason, .. } => {
                warn!(handle, sequence, records, %reason, "Publishing fallback snapshot");
            }
        }

        if !gate.publish(Arc::new(outcome.into_snapshot())) {
            break;
        }
    }

    debug!(handle, "Poll loop finished");
}

/// Delivers snapshots until closed; closing waits out a delivery in progress.
struct PublishGate {
    closed: Mutex<bool>,
    on_snapshot: SnapshotCallback,
}

impl PublishGate {
    fn new(on_snapshot: SnapshotCallback) -> Self {
        Self {
            closed: Mutex::new(false),
            on_snapshot,
        }
    }

    fn publish(&self, snapshot: Arc<TelemetrySnapshot>) -> bool {
        let closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return false;
        }
        (self.on_snapshot)(snapshot);
        true
    }

    /// Returns false if the gate was already closed
    fn close(&self) -> bool {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        !std::mem::replace(&mut *closed, true)
    }

    #[cfg(test)]
    fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns one running poll loop. Dropping the handle stops the loop.
pub struct PollerHandle {
    id: u64,
    gate: Arc<PublishGate>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop polling. Once this returns the callback is never invoked again,
    /// including for a cycle that was in flight. Calling it twice is a no-op.
    ///
    /// Must not be called from inside this handle's own callback.
    pub fn stop(&self) {
        if !self.gate.close() {
            return;
        }
        self.cancel.cancel();
        self.task.abort();
        info!(handle = self.id, "Stopped telemetry poller");
    }

    #[cfg(test)]
    pub fn is_stopped(&self) -> bool {
        self.gate.is_closed()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flight_views::{GlobeView, TickerView};
    use crate::application::snapshot_hub::SnapshotHub;
    use crate::domain::flight::RawStateVector;
    use crate::domain::snapshot::Provenance;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    enum Step {
        States(Vec<RawStateVector>),
        Fail,
        Hang,
    }

    /// Feed that replays scripted steps, then serves `default` after `delay`
    struct ScriptedFeed {
        steps: Mutex<VecDeque<Step>>,
        default: Vec<RawStateVector>,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl ScriptedFeed {
        fn new(default: Vec<RawStateVector>) -> Self {
            Self {
                steps: Mutex::new(VecDeque::new()),
                default,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn with_steps(steps: Vec<Step>) -> Self {
            let feed = Self::new(valid_vectors(3));
            *feed.steps.lock().unwrap() = steps.into();
            feed
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StateFeed for ScriptedFeed {
        async fn fetch_states(&self) -> Result<Vec<RawStateVector>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::States(states)) => Ok(states),
                Some(Step::Fail) => Err(FeedError::Malformed("scripted failure".to_string())),
                Some(Step::Hang) => std::future::pending().await,
                None => {
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    Ok(self.default.clone())
                }
            }
        }
    }

    fn valid_vectors(n: usize) -> Vec<RawStateVector> {
        (0..n)
            .map(|i| {
                RawStateVector::from(json!([
                    format!("f{i}"), format!("CS{i}"), "Testland", 0, 0,
                    i as f64, 45.0, 9000.0, false, 220.0, 0.0, 0.0
                ]))
            })
            .collect()
    }

    fn poller(feed: Arc<ScriptedFeed>) -> TelemetryPoller {
        TelemetryPoller::new(feed, PollerConfig::default())
    }

    fn collector() -> (
        impl Fn(Arc<TelemetrySnapshot>) + Send + Sync + 'static,
        mpsc::UnboundedReceiver<Arc<TelemetrySnapshot>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let on_snapshot = move |snapshot: Arc<TelemetrySnapshot>| {
            let _ = tx.send(snapshot);
        };
        (on_snapshot, rx)
    }

    #[tokio::test]
    async fn test_live_snapshot_is_capped_in_feed_order() {
        let feed = Arc::new(ScriptedFeed::new(valid_vectors(20)));
        let outcome = poller(feed).poll_once(1).await;

        assert!(outcome.is_live());
        let snapshot = outcome.into_snapshot();
        assert_eq!(snapshot.provenance, Provenance::Live);
        assert_eq!(snapshot.sequence, 1);
        assert_eq!(snapshot.len(), 15);
        for (i, flight) in snapshot.flights.iter().enumerate() {
            assert_eq!(flight.id, format!("f{i}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_feed_falls_back_within_timeout() {
        let feed = Arc::new(ScriptedFeed::with_steps(vec![Step::Hang]));
        let started = tokio::time::Instant::now();

        let outcome = poller(feed).poll_once(1).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_FETCH_TIMEOUT);
        assert!(elapsed < DEFAULT_FETCH_TIMEOUT + Duration::from_secs(1));
        assert!(matches!(
            outcome,
            PollOutcome::Fallback {
                reason: FallbackReason::FeedUnavailable(FeedError::Timeout(_)),
                ..
            }
        ));
        let snapshot = outcome.into_snapshot();
        assert_eq!(snapshot.provenance, Provenance::Fallback);
        assert!(Arc::ptr_eq(&snapshot.flights, &fallback_flights()));
    }

    #[tokio::test]
    async fn test_empty_states_fall_back() {
        let feed = Arc::new(ScriptedFeed::with_steps(vec![Step::States(vec![])]));
        let outcome = poller(feed).poll_once(1).await;

        assert!(matches!(
            outcome,
            PollOutcome::Fallback {
                reason: FallbackReason::NoUsableRecords,
                ..
            }
        ));
        assert_eq!(outcome.snapshot().flights, fallback_flights());
    }

    #[tokio::test]
    async fn test_unusable_states_fall_back() {
        let unusable = vec![RawStateVector::from(json!([
            "a", "B", "C", 0, 0, null, null, null, true, 0.0, 0.0, 0.0
        ]))];
        let feed = Arc::new(ScriptedFeed::with_steps(vec![Step::States(unusable)]));

        let outcome = poller(feed).poll_once(4).await;

        assert!(!outcome.is_live());
        assert_eq!(outcome.snapshot().sequence, 4);
    }

    #[tokio::test]
    async fn test_feed_error_falls_back() {
        let feed = Arc::new(ScriptedFeed::with_steps(vec![Step::Fail]));
        let outcome = poller(feed).poll_once(1).await;

        assert!(matches!(
            outcome,
            PollOutcome::Fallback {
                reason: FallbackReason::FeedUnavailable(FeedError::Malformed(_)),
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_after_first_cycle_publishes_once() {
        let feed = Arc::new(ScriptedFeed::new(valid_vectors(5)));
        let (on_snapshot, mut rx) = collector();

        let handle = poller(feed.clone()).start(on_snapshot);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert!(first.is_live());

        handle.stop();
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 4).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_arrive_in_cycle_order() {
        let feed = Arc::new(ScriptedFeed::with_steps(vec![
            Step::States(valid_vectors(2)),
            Step::Fail,
            Step::States(valid_vectors(4)),
        ]));
        let (on_snapshot, mut rx) = collector();

        let handle = poller(feed).start_with_interval(on_snapshot, Duration::from_secs(10));
        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(rx.recv().await.unwrap());
        }
        handle.stop();

        let sequences: Vec<u64> = received.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        let provenance: Vec<Provenance> = received.iter().map(|s| s.provenance).collect();
        assert_eq!(
            provenance,
            vec![Provenance::Live, Provenance::Fallback, Provenance::Live]
        );
        assert_eq!(received[2].len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_cycle() {
        let feed = Arc::new(ScriptedFeed::new(valid_vectors(3)).with_delay(Duration::from_secs(3)));
        let (on_snapshot, mut rx) = collector();

        let handle = poller(feed.clone()).start(on_snapshot);
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.stop();
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_feed_never_overlaps() {
        let interval = Duration::from_secs(10);
        let feed = Arc::new(ScriptedFeed::new(valid_vectors(3)).with_delay(interval * 2 + interval / 2));
        let config = PollerConfig {
            fetch_timeout: interval * 10,
            ..PollerConfig::default()
        };
        let (on_snapshot, mut rx) = collector();

        let handle = TelemetryPoller::new(feed.clone(), config).start_with_interval(on_snapshot, interval);
        let mut sequences = Vec::new();
        for _ in 0..3 {
            sequences.push(rx.recv().await.unwrap().sequence);
        }
        handle.stop();

        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(feed.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handles_are_isolated() {
        let feed = Arc::new(ScriptedFeed::new(valid_vectors(3)));
        let poller = poller(feed);
        let (globe_cb, mut globe_rx) = collector();
        let (ticker_cb, mut ticker_rx) = collector();

        let globe = poller.start_with_interval(globe_cb, Duration::from_secs(10));
        let ticker = poller.start_with_interval(ticker_cb, Duration::from_secs(10));
        assert_ne!(globe.id(), ticker.id());

        assert_eq!(globe_rx.recv().await.unwrap().sequence, 1);
        globe.stop();

        let mut sequences = Vec::new();
        for _ in 0..3 {
            sequences.push(ticker_rx.recv().await.unwrap().sequence);
        }
        assert_eq!(sequences, vec![1, 2, 3]);
        assert!(globe_rx.try_recv().is_err());
        assert!(!ticker.is_stopped());
        ticker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_poller_feeds_every_hub_consumer() {
        let feed = Arc::new(ScriptedFeed::new(valid_vectors(3)));
        let hub = SnapshotHub::new();
        let seed = TelemetrySnapshot::fallback(0, fallback_flights());
        let (globe, _) = GlobeView::attach(&hub, &seed);
        let (ticker, _) = TickerView::attach(&hub, &seed);
        let mut stream = hub.stream();

        let handle = poller(feed.clone()).start(hub.publisher());
        tokio::time::sleep(DEFAULT_POLL_INTERVAL + Duration::from_secs(1)).await;
        handle.stop();

        assert_eq!(feed.calls(), 2);
        assert_eq!(globe.current().sequence, 2);
        assert_eq!(globe.current().points.len(), 3);
        assert_eq!(ticker.current().sequence, 2);
        assert_eq!(ticker.current().provenance, Provenance::Live);

        let latest = hub.latest().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(stream.recv().await.unwrap().sequence, 1);
        assert!(Arc::ptr_eq(&stream.recv().await.unwrap(), &latest));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_drop_stops() {
        let feed = Arc::new(ScriptedFeed::new(valid_vectors(3)));
        let (on_snapshot, mut rx) = collector();

        let handle = poller(feed.clone()).start(on_snapshot);
        rx.recv().await.unwrap();
        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());

        let (on_snapshot, mut dropped_rx) = collector();
        {
            let _scoped = poller(feed).start(on_snapshot);
            dropped_rx.recv().await.unwrap();
        }
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 2).await;
        assert!(dropped_rx.try_recv().is_err());
    }
}
