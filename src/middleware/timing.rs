use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::reporter::Reporter;

/// Start timestamp stored in the request extensions by the start hook.
/// Read from the tokio clock.
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(pub Instant);

/// First hook: remember when the request came in.
pub fn on_request_start(req: &mut Request) {
    req.extensions_mut().insert(RequestStart(Instant::now()));
}

/// Second hook: turn the finished request into an event and dispatch it.
/// Without a start timestamp the response-time update is skipped, the
/// other metrics still see the request.
pub fn on_request_complete(reporter: &Reporter, path: &str, status: u16, start: Option<RequestStart>) {
    reporter.observe(path, Some(status), start.map(|s| s.0.elapsed()));
}

/// Axum middleware running both hooks around the handler.
///
/// ```ignore
/// let app = Router::new()
///     .route("/log", get(handler))
///     .layer(axum::middleware::from_fn_with_state(reporter.clone(), track_requests));
/// ```
pub async fn track_requests(State(reporter): State<Arc<Reporter>>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();

    on_request_start(&mut req);
    let start = req.extensions().get::<RequestStart>().copied();

    let response = next.run(req).await;

    on_request_complete(&reporter, &path, response.status().as_u16(), start);
    response
}
