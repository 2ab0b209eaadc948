//! Demo server: a small in-memory API instrumented with relic-reporter.
//!
//! Reads `RELIC_CONFIG` (a YAML file) when set, otherwise needs
//! `RELIC_APP_NAME` and `RELIC_LICENSE_KEY`; set `RELIC_DRY_RUN=1` to
//! log payloads instead of sending them. `RELIC_DEMO_LOAD_WORKERS=N` starts
//! N load-generator workers against the server for `RELIC_DEMO_LOAD_SECS`.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use relic_reporter::{config, Reporter, ReporterConfig};
use tracing_subscriber::{fmt, EnvFilter};

mod handlers;
mod load_generator;
mod mock_data;
mod server;

const LISTEN_ADDR: &str = "0.0.0.0:3000";

/// How long Ctrl-C waits for an in-flight transmission.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Seeded users and products
    pub store: mock_data::Store,

    /// Metrics reporter, injected into the middleware layer
    pub reporter: Arc<Reporter>,
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "relic-demo exited");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // ── 1. Reporter ──────────────────────────────────────────────
    let config = match std::env::var("RELIC_CONFIG") {
        Ok(path) => config::load_from_file(&path)?,
        Err(_) => ReporterConfig::from_env()?,
    };
    let reporter = Arc::new(
        Reporter::builder(config)
            .classifier(server::endpoints()?)
            .build()?,
    );
    reporter.start()?;

    // ── 2. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        store: mock_data::seed(),
        reporter: reporter.clone(),
    });

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR).await?;
    tracing::info!(
        listen = LISTEN_ADDR,
        interval = ?reporter.interval(),
        "relic-demo listening"
    );

    // ── 5. Optional load ─────────────────────────────────────────
    let workers: u32 = env_or("RELIC_DEMO_LOAD_WORKERS", 0);
    if workers > 0 {
        let secs: u64 = env_or("RELIC_DEMO_LOAD_SECS", 120);
        let running = Arc::new(AtomicBool::new(true));
        tokio::spawn(load_generator::run(
            "http://127.0.0.1:3000".into(),
            running,
            workers,
            secs,
        ));
    }

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    if !reporter.shutdown_within(SHUTDOWN_GRACE).await {
        tracing::warn!("last metrics transmission abandoned");
    }
    served?;
    Ok(())
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
