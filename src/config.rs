//! Reporter settings, loaded strictly from YAML or from `RELIC_*` env vars.

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// NewRelic plugin API ingestion endpoint.
pub const DEFAULT_COLLECTOR_URL: &str = "https://platform-api.newrelic.com/platform/v1/metrics";

/// Plugin GUID the metrics are filed under unless overridden.
pub const DEFAULT_GUID: &str = "com.github.domenp.SimpleRelic";

pub const DEFAULT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    /// Component name shown on the dashboard
    pub app_name: String,

    #[serde(default)]
    pub license_key: String,

    #[serde(default = "default_guid")]
    pub guid: String,

    /// Log outgoing payloads and raw collector responses
    #[serde(default)]
    pub verbose: bool,

    /// Build and log payloads but never send them
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_collector_url")]
    pub collector_url: String,

    /// Host name override; resolved from the system when absent
    #[serde(default)]
    pub host: Option<String>,
}

impl ReporterConfig {
    pub fn new(app_name: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            license_key: license_key.into(),
            guid: default_guid(),
            verbose: false,
            dry_run: false,
            interval_secs: default_interval_secs(),
            collector_url: default_collector_url(),
            host: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.license_key.trim().is_empty() {
            return Err(ConfigError::MissingLicenseKey);
        }
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::MissingAppName);
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Read `RELIC_APP_NAME`, `RELIC_LICENSE_KEY`, `RELIC_GUID`,
    /// `RELIC_VERBOSE`, `RELIC_DRY_RUN`, `RELIC_INTERVAL_SECS`,
    /// `RELIC_COLLECTOR_URL` and `RELIC_HOST`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::new(
            get("RELIC_APP_NAME").unwrap_or_default(),
            get("RELIC_LICENSE_KEY").unwrap_or_default(),
        );
        if let Some(guid) = get("RELIC_GUID") {
            cfg.guid = guid;
        }
        if let Some(v) = get("RELIC_VERBOSE") {
            cfg.verbose = parse_flag("RELIC_VERBOSE", &v)?;
        }
        if let Some(v) = get("RELIC_DRY_RUN") {
            cfg.dry_run = parse_flag("RELIC_DRY_RUN", &v)?;
        }
        if let Some(v) = get("RELIC_INTERVAL_SECS") {
            cfg.interval_secs = v
                .parse()
                .map_err(|e| ConfigError::Parse(format!("RELIC_INTERVAL_SECS: {e}")))?;
        }
        if let Some(url) = get("RELIC_COLLECTOR_URL") {
            cfg.collector_url = url;
        }
        cfg.host = get("RELIC_HOST");

        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn load_from_file(path: &str) -> Result<ReporterConfig, ConfigError> {
    let s = fs::read_to_string(path)
        .map_err(|e| ConfigError::Parse(format!("read {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ReporterConfig, ConfigError> {
    let cfg: ReporterConfig =
        serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse_flag(key: &str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Parse(format!("{key}: '{other}' is not a boolean"))),
    }
}

fn default_guid() -> String {
    DEFAULT_GUID.into()
}
fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}
fn default_collector_url() -> String {
    DEFAULT_COLLECTOR_URL.into()
}
