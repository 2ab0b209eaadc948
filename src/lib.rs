//! Per-endpoint request metrics for axum servers.
//!
//! Requests are classified into named endpoints, counted, checked for error
//! statuses and timed. Every interval the aggregates are drained and pushed to
//! the NewRelic plugin API.
//!
//! ```ignore
//! let mut endpoints = EndpointClassifier::builder();
//! endpoints.prefix("log", "/log")?;
//!
//! let reporter = Arc::new(
//!     Reporter::builder(ReporterConfig::new("shop", license_key))
//!         .classifier(endpoints.build()?)
//!         .build()?,
//! );
//! reporter.start()?;
//!
//! let app = Router::new()
//!     .route("/log", get(log_handler))
//!     .layer(axum::middleware::from_fn_with_state(reporter.clone(), track_requests));
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod payload;
pub mod reporter;
pub mod transmit;

pub use classifier::{ClassifierBuilder, EndpointClassifier, UNKNOWN_ENDPOINT};
pub use config::ReporterConfig;
pub use error::{ConfigError, ObservationError, ReporterError, TransmissionError};
pub use metrics::{Accumulator, MetricSet, MetricValues, RequestEvent};
pub use middleware::track_requests;
pub use payload::{Payload, ReporterIdentity};
pub use reporter::{Reporter, ReporterBuilder, SchedulerState};
pub use transmit::{DryRunTransmitter, HttpTransmitter, Transmitter};
