use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::classifier::EndpointClassifier;
use crate::config::ReporterConfig;
use crate::error::{ConfigError, ReporterError, Result, TransmissionError};
use crate::metrics::{MetricSet, RequestEvent};
use crate::payload::{Payload, ReporterIdentity};
use crate::transmit::{self, Transmitter};

/// Where the reporting loop is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

impl SchedulerState {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Stopped => "stopped",
        }
    }
}

enum Lifecycle {
    Idle,
    Running(JoinHandle<()>),
    /// Holds the loop task until someone awaits it in `shutdown`
    Stopped(Option<JoinHandle<()>>),
}

impl Lifecycle {
    fn state(&self) -> SchedulerState {
        match self {
            Lifecycle::Idle => SchedulerState::Idle,
            Lifecycle::Running(_) => SchedulerState::Running,
            Lifecycle::Stopped(_) => SchedulerState::Stopped,
        }
    }
}

/// Everything a tick needs, shared between the reporter and its loop task.
struct Shared {
    classifier: EndpointClassifier,
    metrics: MetricSet,
    identity: ReporterIdentity,
    transmitter: Box<dyn Transmitter>,
    verbose: bool,
}

/// Aggregates request metrics and pushes them to the collector on a timer.
///
/// Request tasks call [`Reporter::observe`]; [`Reporter::start`] spawns the
/// flush loop on the current tokio runtime.
pub struct Reporter {
    shared: Arc<Shared>,
    interval: Duration,
    stop_tx: watch::Sender<bool>,
    lifecycle: Mutex<Lifecycle>,
}

impl Reporter {
    pub fn builder(config: ReporterConfig) -> ReporterBuilder {
        ReporterBuilder::new(config)
    }

    /// Classify `path` and feed the request to every accumulator.
    pub fn observe(&self, path: &str, status: Option<u16>, elapsed: Option<Duration>) {
        let event = RequestEvent {
            endpoint: self.shared.classifier.classify(path).to_owned(),
            status,
            elapsed,
        };
        self.dispatch(&event);
    }

    /// Feed an already classified event.
    pub fn dispatch(&self, event: &RequestEvent) {
        self.shared.metrics.dispatch(event);
    }

    pub fn classifier(&self) -> &EndpointClassifier {
        &self.shared.classifier
    }

    pub fn identity(&self) -> &ReporterIdentity {
        &self.shared.identity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.lock().state()
    }

    /// Idle → Running. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if !matches!(*lifecycle, Lifecycle::Idle) {
            return Err(ReporterError::InvalidState {
                expected: SchedulerState::Idle.as_str(),
                actual: lifecycle.state().as_str(),
            });
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ReporterError::NoRuntime)?;
        let task = runtime.spawn(run(
            self.shared.clone(),
            self.interval,
            self.stop_tx.subscribe(),
        ));
        *lifecycle = Lifecycle::Running(task);

        tracing::debug!(
            app = %self.shared.identity.app_name,
            interval = ?self.interval,
            "reporter started"
        );
        Ok(())
    }

    /// Running → Stopped. No transmission starts after this returns; one
    /// already in flight may finish. Unflushed values are dropped.
    pub fn stop(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped(None)) {
            Lifecycle::Idle => {
                *lifecycle = Lifecycle::Idle;
                Err(ReporterError::InvalidState {
                    expected: SchedulerState::Running.as_str(),
                    actual: SchedulerState::Idle.as_str(),
                })
            }
            Lifecycle::Running(task) => {
                self.stop_tx.send_replace(true);
                *lifecycle = Lifecycle::Stopped(Some(task));
                tracing::debug!("reporter stopped");
                Ok(())
            }
            stopped @ Lifecycle::Stopped(_) => {
                *lifecycle = stopped;
                Ok(())
            }
        }
    }

    /// Stop (from any state) and wait for the loop task to exit.
    ///
    /// Waits as long as an in-flight transmission takes; see
    /// [`Reporter::shutdown_within`] for a bounded wait.
    pub async fn shutdown(&self) {
        // Ignore JoinError, the loop may already be gone
        if let Some(task) = self.take_task() {
            let _ = task.await;
        }
    }

    /// Like [`Reporter::shutdown`], but gives up after `grace` and aborts the
    /// loop task. Returns whether the loop exited on its own.
    pub async fn shutdown_within(&self, grace: Duration) -> bool {
        let Some(mut task) = self.take_task() else {
            return true;
        };

        match tokio::time::timeout(grace, &mut task).await {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!(?grace, "reporter loop still busy, aborting");
                task.abort();
                false
            }
        }
    }

    /// Signal stop and take the loop task, leaving the reporter Stopped.
    fn take_task(&self) -> Option<JoinHandle<()>> {
        let mut lifecycle = self.lifecycle.lock();
        self.stop_tx.send_replace(true);
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped(None)) {
            Lifecycle::Idle => None,
            Lifecycle::Running(task) => Some(task),
            Lifecycle::Stopped(task) => task,
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}

// ─── Loop ────────────────────────────────────────────────────────

async fn run(shared: Arc<Shared>, period: Duration, mut stop: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(ticker);

    loop {
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            biased;
            changed = stop.changed() => {
                // A dropped sender means the reporter itself is gone
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            Some(_) = ticks.next() => {
                // Each tick is its own task so a panic ends the tick, not the loop
                let tick = tokio::spawn(flush(shared.clone(), stop.clone()));
                let _abort_tick = AbortOnDrop(tick.abort_handle());
                match tick.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "metrics flush failed, values dropped");
                    }
                    Err(e) if e.is_panic() => {
                        tracing::error!("metrics flush panicked, continuing with next tick");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "metrics flush cancelled");
                    }
                }
            }
        }
    }
}

/// Cancels the in-flight tick if the loop itself is aborted.
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Drain, package and send one interval's values.
async fn flush(shared: Arc<Shared>, stop: watch::Receiver<bool>) -> std::result::Result<(), TransmissionError> {
    // Locks are released inside collect_all, before any I/O
    let values = shared.metrics.collect_all();
    let payload = Payload::new(&shared.identity, values);

    let stopped = *stop.borrow();
    if stopped {
        tracing::debug!("reporter stopped, flush discarded");
        return Ok(());
    }

    if shared.verbose {
        tracing::info!(
            metrics = payload.metrics().map_or(0, |m| m.len()),
            "sending metrics to collector"
        );
    }
    shared.transmitter.send(&payload).await
}

// ─── Builder ─────────────────────────────────────────────────────

/// Assembles a [`Reporter`]. Every check runs in `build`, so a reporter
/// either comes out complete or not at all.
pub struct ReporterBuilder {
    config: ReporterConfig,
    classifier: Option<EndpointClassifier>,
    metrics: Option<MetricSet>,
    transmitter: Option<Box<dyn Transmitter>>,
    interval: Option<Duration>,
}

impl ReporterBuilder {
    pub fn new(config: ReporterConfig) -> Self {
        Self {
            config,
            classifier: None,
            metrics: None,
            transmitter: None,
            interval: None,
        }
    }

    pub fn classifier(mut self, classifier: EndpointClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Replace the standard request count / error rate / response time set.
    pub fn metrics(mut self, metrics: MetricSet) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the transmitter chosen from the config.
    pub fn transmitter(mut self, transmitter: impl Transmitter + 'static) -> Self {
        self.transmitter = Some(Box::new(transmitter));
        self
    }

    /// Override the config's whole-second interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<Reporter> {
        self.config.validate()?;
        let classifier = self.classifier.ok_or(ConfigError::NoEndpoints)?;
        if classifier.is_empty() {
            return Err(ConfigError::NoEndpoints.into());
        }

        let interval = self.interval.unwrap_or_else(|| self.config.interval());
        if interval.is_zero() {
            return Err(ConfigError::InvalidInterval.into());
        }

        let mut identity = ReporterIdentity::from_config(&self.config)?;
        // the collector wants whole seconds; never report a zero-length interval
        identity.duration = interval.as_secs() + u64::from(interval.subsec_nanos() > 0);

        let metrics = self
            .metrics
            .unwrap_or_else(|| MetricSet::standard(&classifier));
        if metrics.is_empty() {
            tracing::warn!("reporter built without metrics, flushes will be empty");
        }

        let transmitter = self
            .transmitter
            .unwrap_or_else(|| transmit::from_config(&self.config));

        let (stop_tx, _) = watch::channel(false);

        Ok(Reporter {
            shared: Arc::new(Shared {
                classifier,
                metrics,
                identity,
                transmitter,
                verbose: self.config.verbose,
            }),
            interval,
            stop_tx,
            lifecycle: Mutex::new(Lifecycle::Idle),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReporterConfig {
        let mut cfg = ReporterConfig::new("shop", "abc");
        cfg.host = Some("web-1".into());
        cfg.dry_run = true;
        cfg
    }

    fn classifier() -> EndpointClassifier {
        let mut b = EndpointClassifier::builder();
        b.prefix("log", "/log").unwrap();
        b.build().unwrap()
    }

    #[test]
    fn missing_license_key_fails_construction() {
        let mut cfg = config();
        cfg.license_key.clear();
        let err = Reporter::builder(cfg).classifier(classifier()).build().err().unwrap();
        assert!(matches!(err, ReporterError::Config(ConfigError::MissingLicenseKey)));
    }

    #[test]
    fn missing_classifier_fails_construction() {
        let err = Reporter::builder(config()).build().err().unwrap();
        assert!(matches!(err, ReporterError::Config(ConfigError::NoEndpoints)));
    }

    #[test]
    fn zero_interval_override_fails() {
        let err = Reporter::builder(config())
            .classifier(classifier())
            .interval(Duration::ZERO)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ReporterError::Config(ConfigError::InvalidInterval)));
    }

    #[test]
    fn sub_second_interval_reports_whole_seconds() {
        let build = |interval| {
            Reporter::builder(config())
                .classifier(classifier())
                .interval(interval)
                .build()
                .unwrap()
        };
        assert_eq!(build(Duration::from_millis(500)).identity().duration, 1);
        assert_eq!(build(Duration::from_millis(1_500)).identity().duration, 2);
        assert_eq!(build(Duration::from_secs(30)).identity().duration, 30);
    }

    #[test]
    fn start_outside_runtime_fails_and_stays_idle() {
        let r = Reporter::builder(config()).classifier(classifier()).build().unwrap();
        assert!(matches!(r.start(), Err(ReporterError::NoRuntime)));
        assert_eq!(r.state(), SchedulerState::Idle);
    }

    #[test]
    fn stop_before_start_is_rejected() {
        let r = Reporter::builder(config()).classifier(classifier()).build().unwrap();
        assert!(matches!(r.stop(), Err(ReporterError::InvalidState { .. })));
        assert_eq!(r.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn lifecycle_is_one_way() {
        let r = Reporter::builder(config()).classifier(classifier()).build().unwrap();
        r.start().unwrap();
        assert_eq!(r.state(), SchedulerState::Running);
        assert!(matches!(r.start(), Err(ReporterError::InvalidState { .. })));

        r.stop().unwrap();
        assert_eq!(r.state(), SchedulerState::Stopped);
        // stopping twice is harmless, restarting is not allowed
        r.stop().unwrap();
        assert!(matches!(r.start(), Err(ReporterError::InvalidState { .. })));

        r.shutdown().await;
        assert_eq!(r.state(), SchedulerState::Stopped);
    }

    #[test]
    fn observe_classifies_path() {
        let r = Reporter::builder(config()).classifier(classifier()).build().unwrap();
        r.observe("/log/1", Some(200), Some(Duration::from_millis(2)));
        r.observe("/nope", Some(404), None);

        let values = r.shared.metrics.collect_all();
        assert_eq!(values["Component/ReqPerEndpoint/log[requests]"], 1.0);
        assert_eq!(values["Component/ReqPerEndpoint/other[requests]"], 1.0);
        assert_eq!(values["Component/PercentageOfErrorsPerEndpoint/other[percent]"], 1.0);
    }
}
