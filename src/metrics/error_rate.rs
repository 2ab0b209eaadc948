use crate::classifier::EndpointClassifier;
use crate::error::ObservationError;

use super::table::{ratio, EndpointTable, MetricNaming};
use super::{Accumulator, MetricValues, RequestEvent};

const NAMING: MetricNaming = MetricNaming {
    prefix: "Component/PercentageOfErrorsPerEndpoint/",
    unit: "[percent]",
    overall: "Component/ErrorRate/overall[percent]",
};

/// Lowest status code counted as an error.
const ERROR_STATUS: u16 = 400;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    errors: u64,
    total: u64,
}

/// Share of requests answered with a 4xx/5xx status, per endpoint.
///
/// The overall value is pooled (summed errors over summed requests), so a
/// quiet endpoint with one failure does not outweigh a busy healthy one.
pub struct ErrorRate {
    table: EndpointTable<Tally>,
}

impl ErrorRate {
    pub fn new(classifier: &EndpointClassifier) -> Self {
        Self {
            table: EndpointTable::new(classifier, NAMING),
        }
    }
}

impl Accumulator for ErrorRate {
    fn name(&self) -> &str {
        "error_rate"
    }

    fn update(&self, event: &RequestEvent) -> Result<(), ObservationError> {
        let failed = event.status.is_some_and(|s| s >= ERROR_STATUS);
        self.table.update(&event.endpoint, |t| {
            t.total += 1;
            if failed {
                t.errors += 1;
            }
        });
        Ok(())
    }

    fn collect(&self) -> MetricValues {
        let naming = self.table.naming();
        let drained = self.table.drain();

        let mut values = MetricValues::new();
        let mut pooled = Tally::default();
        for (endpoint, tally) in drained {
            pooled.errors += tally.errors;
            pooled.total += tally.total;
            values.insert(naming.key(&endpoint), ratio(tally.errors as f64, tally.total));
        }
        values.insert(
            naming.overall.to_owned(),
            ratio(pooled.errors as f64, pooled.total),
        );
        values
    }
}
