//! Launch coordination between the embedded service and the shell.
//!
//! The coordinator owns the startup sequence: spawn the service on a
//! background task, wait for its readiness signal, confirm liveness over
//! the wire, and only then hand the bound address to the window. Every
//! startup failure is converted into a [`LaunchError`] at this boundary
//! so the shell can report it and exit instead of showing a blank page.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use berth_embed::router::paths;
use berth_embed::{serve, Readiness, ServiceConfig};

/// How long to wait for the service, and how often to re-probe it.
#[derive(Debug, Clone)]
pub struct ReadinessPolicy {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(3),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] berth_embed::ConfigError),
    #[error("service failed to start: {detail}")]
    Service { detail: String },
    #[error("service not ready within {waited_ms} ms")]
    ReadyTimeout { waited_ms: u64 },
    #[error("launch already performed in this process")]
    AlreadyLaunched,
}

/// Ownership token for the background service task. Dropping it does not
/// stop the service; process teardown does. The explicit shutdown path
/// exists for tests.
#[derive(Debug)]
pub struct ServiceHandle {
    ready: watch::Receiver<Readiness>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    /// Signal the service to stop serving.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the service task to finish.
    pub async fn stopped(self) {
        let _ = self.task.await;
    }
}

/// Spawn the embedded service on a background task. The returned handle
/// says nothing about readiness; callers must [`await_readiness`].
pub fn start_service(config: ServiceConfig) -> ServiceHandle {
    let (ready_tx, ready_rx) = Readiness::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(serve(config, ready_tx, shutdown_rx));
    ServiceHandle {
        ready: ready_rx,
        shutdown: Some(shutdown_tx),
        task,
    }
}

/// Block until the service is confirmed listening, or fail within the
/// policy budget.
///
/// Two phases: first the readiness signal (which also carries startup
/// failures such as a bind conflict), then a liveness probe over the
/// wire. A listener that binds but never answers is a timeout, not a
/// success.
pub async fn await_readiness(
    handle: &mut ServiceHandle,
    policy: &ReadinessPolicy,
) -> Result<SocketAddr, LaunchError> {
    let started = Instant::now();

    let addr = loop {
        match handle.ready.borrow_and_update().clone() {
            Readiness::Ready(addr) => break addr,
            Readiness::Failed(detail) => return Err(LaunchError::Service { detail }),
            Readiness::Starting => {}
        }
        let Some(remaining) = policy.max_wait.checked_sub(started.elapsed()) else {
            return Err(ready_timeout(started));
        };
        match tokio::time::timeout(remaining, handle.ready.changed()).await {
            Ok(Ok(())) => continue,
            Ok(Err(_)) => {
                // Sender dropped while still Starting: the task died
                // before reporting anything.
                return Err(LaunchError::Service {
                    detail: "service task exited before signalling readiness".into(),
                });
            }
            Err(_) => return Err(ready_timeout(started)),
        }
    };

    let probe = service_url(&addr, paths::HEALTHZ);
    loop {
        if check_health(&probe).await {
            tracing::info!(%addr, "embedded service confirmed ready");
            return Ok(addr);
        }
        if started.elapsed() >= policy.max_wait {
            return Err(ready_timeout(started));
        }
        tokio::time::sleep(policy.poll_interval).await;
    }
}

fn ready_timeout(started: Instant) -> LaunchError {
    LaunchError::ReadyTimeout {
        waited_ms: started.elapsed().as_millis() as u64,
    }
}

async fn check_health(url: &str) -> bool {
    static HTTP: OnceCell<reqwest::Client> = OnceCell::new();
    let client = HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_millis(1200))
            .build()
            .unwrap()
    });
    match client.get(url).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

/// Canonical address of a served path, suitable for the window's content
/// area.
pub fn service_url(addr: &SocketAddr, path: &str) -> String {
    format!("http://{}/{}", addr, path.trim_start_matches('/'))
}

/// Everything the shell needs after a successful launch. Explicitly
/// owned; discarded wholesale at process exit.
#[derive(Debug)]
pub struct LaunchState {
    pub config: ServiceConfig,
    pub handle: ServiceHandle,
    pub addr: SocketAddr,
}

impl LaunchState {
    /// Root URL the window should display.
    pub fn window_url(&self) -> String {
        service_url(&self.addr, "")
    }
}

static LAUNCHED: AtomicBool = AtomicBool::new(false);

/// Start the service and wait for confirmed readiness. At most one
/// launch per process: the service instance and the window it feeds are
/// process-scoped singletons, so a second call fails outright.
pub async fn launch(
    config: ServiceConfig,
    policy: ReadinessPolicy,
) -> Result<LaunchState, LaunchError> {
    if LAUNCHED.swap(true, Ordering::SeqCst) {
        return Err(LaunchError::AlreadyLaunched);
    }
    let mut handle = start_service(config.clone());
    match await_readiness(&mut handle, &policy).await {
        Ok(addr) => Ok(LaunchState {
            config,
            handle,
            addr,
        }),
        Err(err) => {
            handle.shutdown();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults_are_sane() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.max_wait, Duration::from_secs(3));
        assert!(policy.poll_interval < policy.max_wait);
    }

    #[test]
    fn service_url_formats_loopback() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().expect("addr");
        assert_eq!(service_url(&addr, ""), "http://127.0.0.1:5000/");
        assert_eq!(
            service_url(&addr, "/healthz"),
            "http://127.0.0.1:5000/healthz"
        );
    }
}
