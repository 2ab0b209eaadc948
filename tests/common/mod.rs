#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use relic_reporter::{
    EndpointClassifier, MetricValues, Payload, ReporterConfig, TransmissionError, Transmitter,
};

pub fn config() -> ReporterConfig {
    let mut cfg = ReporterConfig::new("shop", "test-license");
    cfg.host = Some("web-1".into());
    cfg
}

pub fn log_endpoints() -> EndpointClassifier {
    let mut b = EndpointClassifier::builder();
    b.prefix("log", "/log").unwrap();
    b.build().unwrap()
}

/// What the recording transmitter does on its n-th call.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Deliver,
    Fail,
    Panic,
    /// Never completes
    Hang,
}

/// Keeps every delivered payload; `script` decides per call how to behave,
/// falling back to `Deliver` once exhausted.
#[derive(Clone, Default)]
pub struct Recorder {
    pub delivered: Arc<Mutex<Vec<Payload>>>,
    pub attempts: Arc<AtomicUsize>,
    script: Arc<Vec<Outcome>>,
}

impl Recorder {
    pub fn scripted(script: Vec<Outcome>) -> Self {
        Self {
            script: Arc::new(script),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<Payload> {
        self.delivered.lock().clone()
    }

    pub fn metrics(&self, n: usize) -> MetricValues {
        self.delivered()[n].metrics().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Transmitter for Recorder {
    async fn send(&self, payload: &Payload) -> Result<(), TransmissionError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.script.get(n).copied().unwrap_or(Outcome::Deliver) {
            Outcome::Deliver => {
                self.delivered.lock().push(payload.clone());
                Ok(())
            }
            Outcome::Fail => Err(TransmissionError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
            Outcome::Panic => panic!("transmitter blew up"),
            Outcome::Hang => std::future::pending().await,
        }
    }
}
