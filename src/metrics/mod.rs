pub mod count;
pub mod error_rate;
pub mod response_time;
pub mod set;
mod table;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ObservationError;

pub use count::RequestCount;
pub use error_rate::ErrorRate;
pub use response_time::ResponseTime;
pub use set::MetricSet;

/// Flushed values keyed by fully-qualified metric name.
pub type MetricValues = BTreeMap<String, f64>;

/// One finished request, as seen by the accumulators.
/// Built by the completion hook and borrowed by every `update`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEvent {
    /// Endpoint name resolved by the classifier
    pub endpoint: String,
    /// Response status, when the framework reported one
    pub status: Option<u16>,
    /// Time since the start hook ran; `None` if it never did
    pub elapsed: Option<Duration>,
}

impl RequestEvent {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: None,
            elapsed: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}

/// A per-endpoint aggregate updated on every request and drained on every tick.
///
/// `update` runs concurrently on request tasks. `collect` is called by the
/// reporter only; it reads and resets in one step so each update lands in
/// exactly one flush.
pub trait Accumulator: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    fn update(&self, event: &RequestEvent) -> Result<(), ObservationError>;

    fn collect(&self) -> MetricValues;
}
