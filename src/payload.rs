//! Wire model of one flush, as the NewRelic plugin API expects it.

use serde::Serialize;

use crate::config::ReporterConfig;
use crate::error::ConfigError;
use crate::metrics::MetricValues;

/// Who is reporting. Fixed for the reporter's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterIdentity {
    pub host: String,
    pub pid: u32,
    pub version: String,
    pub guid: String,
    pub app_name: String,
    /// Reporting interval in whole seconds
    pub duration: u64,
}

impl ReporterIdentity {
    pub fn from_config(cfg: &ReporterConfig) -> Result<Self, ConfigError> {
        let host = match &cfg.host {
            Some(h) if !h.trim().is_empty() => h.clone(),
            _ => resolve_hostname(std::env::var("HOSTNAME").ok()).ok_or(ConfigError::Hostname)?,
        };

        Ok(Self {
            host,
            pid: std::process::id(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            guid: cfg.guid.clone(),
            app_name: cfg.app_name.clone(),
            duration: cfg.interval_secs,
        })
    }
}

/// `HOSTNAME` wins when set, otherwise ask the OS.
fn resolve_hostname(env_override: Option<String>) -> Option<String> {
    env_override
        .map(|h| h.trim().to_owned())
        .filter(|h| !h.is_empty())
        .or_else(|| gethostname::gethostname().into_string().ok())
        .map(|h| h.trim().to_owned())
        .filter(|h| !h.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub agent: Agent,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub host: String,
    pub pid: u32,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub name: String,
    pub guid: String,
    pub duration: u64,
    pub metrics: MetricValues,
}

impl Payload {
    /// Wrap one flush's values. Built fresh per tick.
    pub fn new(identity: &ReporterIdentity, metrics: MetricValues) -> Self {
        Self {
            agent: Agent {
                host: identity.host.clone(),
                pid: identity.pid,
                version: identity.version.clone(),
            },
            components: vec![Component {
                name: identity.app_name.clone(),
                guid: identity.guid.clone(),
                duration: identity.duration,
                metrics,
            }],
        }
    }

    /// Values of the single component.
    pub fn metrics(&self) -> Option<&MetricValues> {
        self.components.first().map(|c| &c.metrics)
    }
}
