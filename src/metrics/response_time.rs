use crate::classifier::EndpointClassifier;
use crate::error::ObservationError;

use super::table::{ratio, EndpointTable, MetricNaming};
use super::{Accumulator, MetricValues, RequestEvent};

const NAMING: MetricNaming = MetricNaming {
    prefix: "Component/ResponseTimePerEndpoint/",
    unit: "[ms]",
    overall: "Component/ResponseTime/overall[ms]",
};

/// Running totals for one endpoint's interval.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Timing {
    sum_ms: f64,
    count: u64,
}

/// Mean response time per endpoint, in milliseconds.
pub struct ResponseTime {
    table: EndpointTable<Timing>,
}

impl ResponseTime {
    pub fn new(classifier: &EndpointClassifier) -> Self {
        Self {
            table: EndpointTable::new(classifier, NAMING),
        }
    }
}

impl Accumulator for ResponseTime {
    fn name(&self) -> &str {
        "response_time"
    }

    fn update(&self, event: &RequestEvent) -> Result<(), ObservationError> {
        let elapsed = event.elapsed.ok_or_else(|| ObservationError::MissingStartTime {
            endpoint: event.endpoint.clone(),
        })?;
        let ms = elapsed.as_secs_f64() * 1000.0;

        self.table.update(&event.endpoint, |t| {
            t.sum_ms += ms;
            t.count += 1;
        });
        Ok(())
    }

    fn collect(&self) -> MetricValues {
        let naming = self.table.naming();
        let drained = self.table.drain();

        let mut values = MetricValues::new();
        let mut pooled = Timing::default();
        for (endpoint, timing) in drained {
            pooled.sum_ms += timing.sum_ms;
            pooled.count += timing.count;
            values.insert(naming.key(&endpoint), ratio(timing.sum_ms, timing.count));
        }
        values.insert(naming.overall.to_owned(), ratio(pooled.sum_ms, pooled.count));
        values
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const LOG: &str = "Component/ResponseTimePerEndpoint/log[ms]";
    const OTHER: &str = "Component/ResponseTimePerEndpoint/other[ms]";
    const OVERALL: &str = "Component/ResponseTime/overall[ms]";

    fn classifier() -> EndpointClassifier {
        let mut b = EndpointClassifier::builder();
        b.prefix("log", "/log").unwrap();
        b.build().unwrap()
    }

    fn ms(v: f64) -> Duration {
        Duration::from_secs_f64(v / 1000.0)
    }

    #[test]
    fn average_of_recorded_times() {
        let m = ResponseTime::new(&classifier());
        for t in [0.1, 0.2, 0.1, 0.2] {
            m.update(&RequestEvent::new("log").with_elapsed(ms(t))).unwrap();
        }

        let values = m.collect();
        assert_eq!(values.len(), 3);
        assert!((values[LOG] - 0.15).abs() < 1e-9, "got {}", values[LOG]);
        assert!((values[OVERALL] - 0.15).abs() < 1e-9, "got {}", values[OVERALL]);
        assert_eq!(values[OTHER], 0.0);

        // cleared after reporting
        assert!(m.collect().values().all(|v| *v == 0.0));
    }

    #[test]
    fn overall_is_pooled() {
        let m = ResponseTime::new(&classifier());
        // log: one request at 10ms; other: three at 2ms
        m.update(&RequestEvent::new("log").with_elapsed(ms(10.0))).unwrap();
        for _ in 0..3 {
            m.update(&RequestEvent::new("other").with_elapsed(ms(2.0))).unwrap();
        }

        let values = m.collect();
        // (10 + 6) / 4, not (10 + 2) / 2
        assert!((values[OVERALL] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn missing_start_time_is_skipped() {
        let m = ResponseTime::new(&classifier());
        let err = m.update(&RequestEvent::new("log").with_status(200)).unwrap_err();
        assert_eq!(
            err,
            ObservationError::MissingStartTime {
                endpoint: "log".into()
            }
        );

        m.update(&RequestEvent::new("log").with_elapsed(ms(3.0))).unwrap();
        assert!((m.collect()[LOG] - 3.0).abs() < 1e-9);
    }
}
