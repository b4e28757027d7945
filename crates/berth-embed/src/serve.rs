use std::net::SocketAddr;

use tokio::sync::{oneshot, watch};

use crate::config::ServiceConfig;
use crate::router::{build_router, AppState};
use crate::{access_log, security};

/// Cross-context startup signal. Written exactly once past `Starting` by
/// the service task; read (with timeout) by the launch coordinator. This
/// replaces any fixed-delay handoff: the consumer learns the bound
/// address, or the failure detail, never "probably up by now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Starting,
    Ready(SocketAddr),
    Failed(String),
}

impl Readiness {
    pub fn channel() -> (watch::Sender<Readiness>, watch::Receiver<Readiness>) {
        watch::channel(Readiness::Starting)
    }
}

/// Run the embedded service until the shutdown signal fires.
///
/// All startup failures are reported through `ready` rather than a return
/// value so the background task never fails invisibly. The listener is
/// bound before `Ready` is sent; the address in the signal is the one
/// actually claimed (relevant when the configured port is 0).
pub async fn serve(
    config: ServiceConfig,
    ready: watch::Sender<Readiness>,
    shutdown: oneshot::Receiver<()>,
) {
    let state = AppState::new(&config);
    let app = attach_global_layers(attach_http_layers(
        build_router().with_state(state),
        config.concurrency_limit,
    ));

    let listener = match tokio::net::TcpListener::bind(config.addr()).await {
        Ok(listener) => listener,
        Err(err) => {
            let detail = format!("bind {}: {}", config.addr(), err);
            tracing::error!(%detail, "embedded service failed to start");
            let _ = ready.send(Readiness::Failed(detail));
            return;
        }
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => {
            let detail = format!("local_addr: {}", err);
            tracing::error!(%detail, "embedded service failed to start");
            let _ = ready.send(Readiness::Failed(detail));
            return;
        }
    };
    tracing::info!(%addr, asset_root = %config.asset_dir.display(), "embedded service listening");
    let _ = ready.send(Readiness::Ready(addr));

    let server = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(async move {
        let _ = shutdown.await;
    });
    if let Err(err) = server.await {
        tracing::error!(%err, "embedded service exited with error");
    }
}

fn attach_http_layers(router: axum::Router<()>, concurrency_limit: usize) -> axum::Router<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
}

fn attach_global_layers(router: axum::Router<()>) -> axum::Router<()> {
    router
        .layer(axum::middleware::from_fn(access_log::access_log_mw))
        .layer(axum::middleware::from_fn(security::headers_mw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(port: u16, asset_dir: std::path::PathBuf) -> ServiceConfig {
        ServiceConfig {
            bind: "127.0.0.1".parse().expect("loopback"),
            port,
            asset_dir,
            concurrency_limit: 16,
        }
    }

    #[tokio::test]
    async fn readiness_carries_bound_address() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (tx, mut rx) = Readiness::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(serve(
            test_config(0, dir.path().to_path_buf()),
            tx,
            shutdown_rx,
        ));

        tokio::time::timeout(Duration::from_secs(3), rx.changed())
            .await
            .expect("readiness within budget")
            .expect("sender alive");
        let addr = match &*rx.borrow() {
            Readiness::Ready(addr) => *addr,
            other => panic!("expected Ready, got {:?}", other),
        };
        assert_ne!(addr.port(), 0);

        let _ = shutdown_tx.send(());
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("serve task stops after shutdown")
            .expect("serve task not panicked");
    }

    #[tokio::test]
    async fn bind_conflict_reports_failed() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").expect("pre-bind");
        let port = occupied.local_addr().expect("addr").port();

        let dir = tempfile::tempdir().expect("tempdir");
        let (tx, mut rx) = Readiness::channel();
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();
        serve(test_config(port, dir.path().to_path_buf()), tx, shutdown_rx).await;

        match &*rx.borrow() {
            Readiness::Failed(detail) => assert!(detail.contains("bind")),
            other => panic!("expected Failed, got {:?}", other),
        };
    }
}
