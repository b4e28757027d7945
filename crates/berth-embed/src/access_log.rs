use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Clone, Debug)]
struct Cfg {
    enabled: bool,
    sample_n: u64,
}

static CFG: Lazy<Cfg> = Lazy::new(|| Cfg {
    enabled: std::env::var("BERTH_ACCESS_LOG").ok().as_deref() == Some("1"),
    sample_n: std::env::var("BERTH_ACCESS_SAMPLE_N")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
        .max(1),
});

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Emit one line per request on the `http.access` target. The client is
/// always the local webview, so no remote-address plumbing is kept.
pub async fn access_log_mw(req: Request<axum::body::Body>, next: Next) -> Response {
    if !CFG.enabled {
        return next.run(req).await;
    }
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let res = next.run(req).await;
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    if n % CFG.sample_n == 0 {
        tracing::info!(
            target: "http.access",
            %method,
            path = %path,
            status = res.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
        );
    }
    res
}
