use crate::classifier::EndpointClassifier;
use crate::error::ObservationError;

use super::table::{EndpointTable, MetricNaming};
use super::{Accumulator, MetricValues, RequestEvent};

const NAMING: MetricNaming = MetricNaming {
    prefix: "Component/ReqPerEndpoint/",
    unit: "[requests]",
    overall: "Component/Requests/overall[requests]",
};

/// Number of requests per endpoint since the last flush.
pub struct RequestCount {
    table: EndpointTable<u64>,
}

impl RequestCount {
    pub fn new(classifier: &EndpointClassifier) -> Self {
        Self {
            table: EndpointTable::new(classifier, NAMING),
        }
    }
}

impl Accumulator for RequestCount {
    fn name(&self) -> &str {
        "request_count"
    }

    fn update(&self, event: &RequestEvent) -> Result<(), ObservationError> {
        self.table.update(&event.endpoint, |n| *n += 1);
        Ok(())
    }

    fn collect(&self) -> MetricValues {
        let naming = self.table.naming();
        let drained = self.table.drain();

        let mut values = MetricValues::new();
        let mut overall = 0u64;
        for (endpoint, count) in drained {
            overall += count;
            values.insert(naming.key(&endpoint), count as f64);
        }
        values.insert(naming.overall.to_owned(), overall as f64);
        values
    }
}
