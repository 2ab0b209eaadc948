use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::classifier::EndpointClassifier;

use super::{Accumulator, ErrorRate, MetricValues, RequestCount, RequestEvent, ResponseTime};

/// Every accumulator the reporter feeds and flushes.
///
/// Filled before the reporter starts and read-only afterwards.
#[derive(Default)]
pub struct MetricSet {
    accumulators: Vec<Box<dyn Accumulator>>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request count, error rate and response time, in that order.
    pub fn standard(classifier: &EndpointClassifier) -> Self {
        let mut set = Self::new();
        set.register(RequestCount::new(classifier));
        set.register(ErrorRate::new(classifier));
        set.register(ResponseTime::new(classifier));
        set
    }

    pub fn register(&mut self, accumulator: impl Accumulator + 'static) -> &mut Self {
        self.accumulators.push(Box::new(accumulator));
        self
    }

    pub fn len(&self) -> usize {
        self.accumulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    /// Feed one request to every accumulator, in registration order.
    ///
    /// Failures are logged per accumulator and never reach the caller.
    pub fn dispatch(&self, event: &RequestEvent) {
        for acc in &self.accumulators {
            match catch_unwind(AssertUnwindSafe(|| acc.update(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(metric = acc.name(), error = %e, "observation skipped");
                }
                Err(_) => {
                    tracing::error!(metric = acc.name(), endpoint = %event.endpoint, "accumulator panicked during update");
                }
            }
        }
    }

    /// Drain every accumulator into one flat map. Later keys win on collision.
    pub fn collect_all(&self) -> MetricValues {
        let mut values = MetricValues::new();
        for acc in &self.accumulators {
            values.extend(acc.collect());
        }
        values
    }
}
