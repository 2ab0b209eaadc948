use std::collections::HashMap;

use parking_lot::Mutex;

use crate::classifier::{EndpointClassifier, UNKNOWN_ENDPOINT};

/// How one accumulator names its metrics on the wire.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MetricNaming {
    pub prefix: &'static str,
    pub unit: &'static str,
    /// Full key of the pooled aggregate across all endpoints
    pub overall: &'static str,
}

impl MetricNaming {
    pub fn key(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.prefix, endpoint, self.unit)
    }
}

/// Per-endpoint slots behind one lock, shared by every accumulator kind.
///
/// Every registered endpoint plus the sentinel has a slot from construction
/// on, so a flush always reports the same key set.
pub(crate) struct EndpointTable<T> {
    naming: MetricNaming,
    slots: Mutex<HashMap<String, T>>,
}

impl<T: Default> EndpointTable<T> {
    pub fn new(classifier: &EndpointClassifier, naming: MetricNaming) -> Self {
        let slots = classifier
            .endpoints()
            .map(|name| (name.to_owned(), T::default()))
            .collect();

        Self {
            naming,
            slots: Mutex::new(slots),
        }
    }

    pub fn naming(&self) -> &MetricNaming {
        &self.naming
    }

    /// Mutate one endpoint's slot under the lock. Names the table was not
    /// built with are booked under the sentinel.
    pub fn update<R>(&self, endpoint: &str, f: impl FnOnce(&mut T) -> R) -> R {
        let mut slots = self.slots.lock();
        match slots.get_mut(endpoint) {
            Some(slot) => f(slot),
            None => {
                tracing::debug!(endpoint, "unregistered endpoint booked as '{UNKNOWN_ENDPOINT}'");
                f(slots.entry(UNKNOWN_ENDPOINT.to_owned()).or_default())
            }
        }
    }

    /// Take every slot and leave zeroes behind, in one critical section.
    pub fn drain(&self) -> Vec<(String, T)> {
        let mut slots = self.slots.lock();
        slots
            .iter_mut()
            .map(|(name, slot)| (name.clone(), std::mem::take(slot)))
            .collect()
    }
}

/// `num / den`, or 0.0 for an empty interval.
pub(crate) fn ratio(num: f64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num / den as f64
    }
}
