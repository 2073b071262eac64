// ── Refresh coordinator ──
//
// Owns one site's `EndpointState` and the background task that keeps it
// current. Sensors never poll: they hold a `watch::Receiver` on the state
// and read whatever the coordinator last published.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Metric, MetricSnapshot, SensorDescriptor};
use crate::sensor::Sensor;
use crate::source::MetricSource;

/// Default time between scheduled polls.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Which trigger started a poll. Decides how a failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollContext {
    /// First poll during site setup. Failure aborts setup.
    Startup,
    /// Periodic or manual poll after setup. Failure marks data stale.
    Scheduled,
}

/// Everything sensors can observe about one endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EndpointState {
    /// Most recent successful snapshot; kept across failed polls.
    pub snapshot: Option<Arc<MetricSnapshot>>,
    /// `true` iff the most recent poll succeeded.
    pub fresh: bool,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl EndpointState {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.snapshot.as_ref().and_then(|s| s.get(metric))
    }

    pub fn is_stale(&self) -> bool {
        !self.fresh
    }
}

/// Polls one [`MetricSource`] and fans results out to its sensors.
///
/// Cheaply cloneable via `Arc`. Call [`start()`](Self::start) to run the
/// startup poll and spawn the periodic task, [`shutdown()`](Self::shutdown)
/// to stop it.
pub struct Coordinator<S: MetricSource> {
    inner: Arc<CoordinatorInner<S>>,
}

struct CoordinatorInner<S> {
    name: String,
    source: S,
    descriptors: Vec<SensorDescriptor>,
    interval: Duration,
    state: watch::Sender<Arc<EndpointState>>,
    /// Held for the duration of a poll; at most one poll runs at a time.
    poll_lock: Mutex<()>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: MetricSource> Clone for Coordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: MetricSource> fmt::Debug for Coordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.inner.name)
            .field("source", &self.inner.source.label())
            .field("interval", &self.inner.interval)
            .finish_non_exhaustive()
    }
}

impl<S: MetricSource> Coordinator<S> {
    /// Coordinator exposing every sensor the source declares.
    pub fn new(name: impl Into<String>, source: S, interval: Duration) -> Self {
        let descriptors = source.descriptors();
        Self::with_descriptors(name, source, interval, descriptors)
    }

    /// Coordinator exposing only `descriptors`.
    pub fn with_descriptors(
        name: impl Into<String>,
        source: S,
        interval: Duration,
        descriptors: Vec<SensorDescriptor>,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(EndpointState::default()));
        Self {
            inner: Arc::new(CoordinatorInner {
                name: name.into(),
                source,
                descriptors,
                interval,
                state,
                poll_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Current endpoint state.
    pub fn state(&self) -> Arc<EndpointState> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every completed poll, success or failure.
    pub fn subscribe(&self) -> watch::Receiver<Arc<EndpointState>> {
        self.inner.state.subscribe()
    }

    pub fn descriptors(&self) -> &[SensorDescriptor] {
        &self.inner.descriptors
    }

    /// One sensor per descriptor, all fed by this coordinator.
    pub fn sensors(&self) -> Vec<Sensor> {
        self.inner
            .descriptors
            .iter()
            .map(|d| Sensor::new(*d, self.subscribe()))
            .collect()
    }

    pub fn sensor(&self, metric: Metric) -> Option<Sensor> {
        self.inner
            .descriptors
            .iter()
            .find(|d| d.metric == metric)
            .map(|d| Sensor::new(*d, self.subscribe()))
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Guard that cancels this coordinator when dropped unless disarmed.
    pub(crate) fn cancel_on_drop(&self) -> DropGuard {
        self.inner.cancel.clone().drop_guard()
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Poll now, waiting for any in-flight poll to finish first.
    ///
    /// A [`Startup`](PollContext::Startup) failure is returned as
    /// [`CoreError::NotReady`] and leaves the state untouched. A
    /// [`Scheduled`](PollContext::Scheduled) failure is recorded on the
    /// state and not returned. Once [`shutdown`](Self::shutdown) is called
    /// the poll is dropped without touching state and
    /// [`CoreError::CoordinatorClosed`] is returned.
    pub async fn refresh(&self, context: PollContext) -> Result<(), CoreError> {
        let poll = async {
            let _guard = self.inner.poll_lock.lock().await;
            self.poll_locked(context).await
        };
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(CoreError::CoordinatorClosed {
                site: self.inner.name.clone(),
            }),
            result = poll => result,
        }
    }

    /// Caller must hold `poll_lock`.
    async fn poll_locked(&self, context: PollContext) -> Result<(), CoreError> {
        let source = &self.inner.source;
        debug!(site = %self.inner.name, source = %source.label(), ?context, "polling");

        match source.poll().await {
            Ok(snapshot) => {
                debug!(site = %self.inner.name, metrics = snapshot.len(), "poll succeeded");
                self.publish_success(snapshot);
                Ok(())
            }
            Err(error) if context == PollContext::Startup => Err(CoreError::NotReady {
                site: self.inner.name.clone(),
                source: error,
            }),
            Err(e) => {
                warn!(site = %self.inner.name, error = %e, "poll failed, marking data stale");
                self.publish_failure(&e);
                Ok(())
            }
        }
    }

    fn publish_success(&self, snapshot: MetricSnapshot) {
        let now = snapshot.timestamp();
        self.inner.state.send_replace(Arc::new(EndpointState {
            snapshot: Some(Arc::new(snapshot)),
            fresh: true,
            last_error: None,
            last_success: Some(now),
            last_attempt: Some(now),
        }));
    }

    fn publish_failure(&self, error: &solax_api::Error) {
        self.inner.state.send_modify(|state| {
            let mut next = EndpointState::clone(state);
            next.fresh = false;
            next.last_error = Some(error.to_string());
            next.last_attempt = Some(Utc::now());
            *state = Arc::new(next);
        });
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the startup poll and, if it succeeds, spawn the periodic task.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.is_shut_down() {
            return Err(CoreError::CoordinatorClosed {
                site: self.inner.name.clone(),
            });
        }

        self.refresh(PollContext::Startup).await?;

        let mut task = self.inner.task.lock().await;
        if task.is_none() && !self.inner.interval.is_zero() {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.clone();
            *task = Some(tokio::spawn(refresh_task(coordinator, cancel)));
            info!(
                site = %self.inner.name,
                interval_secs = self.inner.interval.as_secs(),
                "coordinator started"
            );
        }
        Ok(())
    }

    /// Cancel the periodic task and wait for it to exit. An in-flight poll
    /// is dropped without touching state.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
            debug!(site = %self.inner.name, "coordinator stopped");
        }
    }
}

/// Periodically poll the coordinator's source.
async fn refresh_task<S: MetricSource>(coordinator: Coordinator<S>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(coordinator.inner.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Ok(_guard) = coordinator.inner.poll_lock.try_lock() else {
                    debug!(site = %coordinator.inner.name, "poll in flight, skipping tick");
                    continue;
                };
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = coordinator.poll_locked(PollContext::Scheduled) => {
                        if let Err(e) = result {
                            warn!(site = %coordinator.inner.name, error = %e, "scheduled poll failed");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::{BATTERY_SENSORS, Metric};

    /// Source that replays a script of outcomes.
    struct ScriptedSource {
        script: std::sync::Mutex<VecDeque<Option<f64>>>,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: impl IntoIterator<Item = Option<f64>>) -> Self {
            Self::with_delay(script, Duration::ZERO)
        }

        fn with_delay(script: impl IntoIterator<Item = Option<f64>>, delay: Duration) -> Self {
            Self {
                script: std::sync::Mutex::new(script.into_iter().collect()),
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MetricSource for ScriptedSource {
        fn label(&self) -> String {
            "scripted".into()
        }

        fn descriptors(&self) -> Vec<SensorDescriptor> {
            BATTERY_SENSORS.to_vec()
        }

        async fn poll(&self) -> Result<MetricSnapshot, solax_api::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let next = self.script.lock().unwrap().pop_front().flatten();
            match next {
                Some(voltage) => Ok([(Metric::Voltage, Some(voltage))].into_iter().collect()),
                None => Err(solax_api::Error::Timeout {
                    attempts: 3,
                    timeout: Duration::from_secs(5),
                }),
            }
        }
    }

    const INTERVAL: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn startup_failure_is_not_ready_and_leaves_state_alone() {
        let coordinator = Coordinator::new("home", ScriptedSource::new([None]), INTERVAL);

        let err = coordinator.start().await.unwrap_err();
        assert!(matches!(err, CoreError::NotReady { ref site, .. } if site == "home"));
        assert!(err.is_retryable());

        let state = coordinator.state();
        assert!(state.snapshot.is_none());
        assert!(state.last_attempt.is_none());
        assert!(coordinator.inner.task.lock().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_failure_retains_last_snapshot() {
        let source = ScriptedSource::new([Some(52.3), None]);
        let coordinator = Coordinator::new("home", source, INTERVAL);
        coordinator.start().await.unwrap();

        let mut sensor = coordinator.sensor(Metric::Voltage).unwrap();
        assert_eq!(sensor.value(), Some(52.3));
        assert!(!sensor.is_stale());

        let reading = sensor.changed().await.unwrap();
        assert!(reading.stale);
        assert_eq!(reading.value, Some(52.3));

        assert_eq!(sensor.value(), Some(52.3));
        assert_eq!(sensor.fresh_value(), None);
        assert!(sensor.is_stale());

        let state = coordinator.state();
        assert!(state.last_error.as_deref().unwrap().contains("timed out"));
        assert!(state.last_success.is_some());
        assert!(state.last_attempt >= state.last_success);

        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_marks_fresh_again() {
        let source = ScriptedSource::new([Some(50.0), None, Some(51.5)]);
        let coordinator = Coordinator::new("home", source, INTERVAL);
        coordinator.start().await.unwrap();

        let mut sensor = coordinator.sensor(Metric::Voltage).unwrap();
        assert!(sensor.changed().await.unwrap().stale);
        let reading = sensor.changed().await.unwrap();
        assert!(!reading.stale);
        assert_eq!(reading.value, Some(51.5));
        assert!(coordinator.state().last_error.is_none());

        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn polls_never_overlap() {
        let script = std::iter::repeat_n(Some(1.0), 10);
        let source = ScriptedSource::with_delay(script, Duration::from_secs(50));
        let coordinator = Coordinator::new("home", source, INTERVAL);
        coordinator.start().await.unwrap();

        let manual = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh(PollContext::Scheduled).await })
        };
        tokio::time::sleep(Duration::from_secs(200)).await;
        manual.await.unwrap().unwrap();

        let source = coordinator.source();
        assert!(source.calls() >= 3);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);

        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_polling() {
        let script = std::iter::repeat_n(Some(1.0), 10);
        let coordinator = Coordinator::new("home", ScriptedSource::new(script), INTERVAL);
        coordinator.start().await.unwrap();
        coordinator.shutdown().await;

        let calls = coordinator.source().calls();
        tokio::time::sleep(INTERVAL * 4).await;
        assert_eq!(coordinator.source().calls(), calls);

        let err = coordinator.start().await.unwrap_err();
        assert!(matches!(err, CoreError::CoordinatorClosed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drops_in_flight_refresh() {
        let source = ScriptedSource::with_delay([Some(1.0), Some(2.0)], Duration::from_secs(10));
        let coordinator = Coordinator::new("home", source, INTERVAL);
        coordinator.start().await.unwrap();
        let sensor = coordinator.sensor(Metric::Voltage).unwrap();
        assert_eq!(sensor.value(), Some(1.0));

        let in_flight = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh(PollContext::Scheduled).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(coordinator.source().calls(), 2);

        coordinator.shutdown().await;
        let err = in_flight.await.unwrap().unwrap_err();
        assert!(matches!(err, CoreError::CoordinatorClosed { .. }));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sensor.value(), Some(1.0));
        assert!(!sensor.is_stale());

        let err = coordinator.refresh(PollContext::Scheduled).await.unwrap_err();
        assert!(matches!(err, CoreError::CoordinatorClosed { .. }));
        assert_eq!(coordinator.source().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sensors_follow_descriptors() {
        let coordinator = Coordinator::with_descriptors(
            "home",
            ScriptedSource::new([Some(1.0)]),
            INTERVAL,
            vec![BATTERY_SENSORS[0]],
        );
        assert_eq!(coordinator.sensors().len(), 1);
        assert!(coordinator.sensor(Metric::Voltage).is_some());
        assert!(coordinator.sensor(Metric::Power).is_none());
    }
}
