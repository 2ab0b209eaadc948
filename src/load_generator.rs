use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::mock_data::{product_id, user_id, NUM_PRODUCTS, NUM_USERS};

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `concurrency` Tokio tasks that send requests to the demo server
/// until the deadline or the `running` flag is set to false.
pub async fn run(base_url: String, running: Arc<AtomicBool>, concurrency: u32, duration_secs: u64) {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    let client = Client::new();

    let mut handles = Vec::with_capacity(concurrency as usize);

    for worker_id in 0..concurrency {
        let running = running.clone();
        let client = client.clone();
        let base_url = base_url.clone();

        handles.push(tokio::spawn(async move {
            worker(worker_id, running, client, base_url, deadline).await;
        }));
    }

    // Wait for all workers to finish
    for h in handles {
        let _ = h.await;
    }

    running.store(false, Ordering::SeqCst);
    tracing::info!("load generator finished");
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(id: u32, running: Arc<AtomicBool>, client: Client, base_url: String, deadline: Instant) {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        let path = next_path(&mut rng);
        let result = if path == "/api/users" {
            client
                .post(format!("{base_url}{path}"))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(format!(
                    r#"{{"name":"Load User","email":"load{}@test.com"}}"#,
                    rng.gen::<u32>()
                ))
                .send()
                .await
        } else {
            client.get(format!("{base_url}{path}")).send().await
        };

        if let Err(e) = result {
            tracing::warn!(worker = id, error = %e, "load request failed");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Mostly hits, some misses (404) and some unclassified paths.
fn next_path(rng: &mut StdRng) -> String {
    match rng.gen_range(0u8..100) {
        0..=49 => {
            // ids past the seeded range answer 404
            let i = rng.gen_range(1..=NUM_USERS + NUM_USERS / 10);
            format!("/api/users/{}", user_id(i))
        }
        50..=79 => {
            let i = rng.gen_range(1..=NUM_PRODUCTS + NUM_PRODUCTS / 10);
            format!("/api/products/{}", product_id(i))
        }
        80..=89 => "/api/users".into(),
        90..=94 => "/health".into(),
        _ => "/favicon.ico".into(),
    }
}
