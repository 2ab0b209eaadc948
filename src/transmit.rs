use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use crate::config::ReporterConfig;
use crate::error::TransmissionError;
use crate::payload::Payload;

/// Delivers one flush to the remote collector.
#[async_trait]
pub trait Transmitter: Send + Sync {
    async fn send(&self, payload: &Payload) -> Result<(), TransmissionError>;
}

/// Picks the transmitter the config asks for.
pub fn from_config(cfg: &ReporterConfig) -> Box<dyn Transmitter> {
    if cfg.dry_run {
        Box::new(DryRunTransmitter)
    } else {
        Box::new(HttpTransmitter::new(cfg))
    }
}

// ─── HTTP ────────────────────────────────────────────────────────

/// POSTs the payload as JSON. One attempt per flush, no retries, no timeout.
pub struct HttpTransmitter {
    client: Client,
    url: String,
    license_key: String,
    verbose: bool,
}

impl HttpTransmitter {
    pub fn new(cfg: &ReporterConfig) -> Self {
        Self {
            client: Client::new(),
            url: cfg.collector_url.clone(),
            license_key: cfg.license_key.clone(),
            verbose: cfg.verbose,
        }
    }
}

#[async_trait]
impl Transmitter for HttpTransmitter {
    async fn send(&self, payload: &Payload) -> Result<(), TransmissionError> {
        let body = serde_json::to_vec(payload)?;

        if self.verbose {
            tracing::info!(
                url = %self.url,
                payload = %String::from_utf8_lossy(&body),
                "sending metrics"
            );
        }

        let response = self
            .client
            .post(&self.url)
            .header("X-License-Key", &self.license_key)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "reading collector response failed");
                String::new()
            }
        };

        if self.verbose {
            tracing::info!(status = status.as_u16(), response = %text, "collector response");
        }

        if status != StatusCode::OK {
            return Err(TransmissionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }
}

// ─── Dry run ─────────────────────────────────────────────────────

/// Logs what would have been sent. For local debugging.
pub struct DryRunTransmitter;

#[async_trait]
impl Transmitter for DryRunTransmitter {
    async fn send(&self, payload: &Payload) -> Result<(), TransmissionError> {
        let body = serde_json::to_string(payload)?;
        tracing::info!(payload = %body, "dry run, metrics not sent");
        Ok(())
    }
}
