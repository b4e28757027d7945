use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_ASSET_DIR: &str = "frontend_build";
const DEFAULT_HTTP_MAX_CONC: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid BERTH_PORT: {0}")]
    InvalidPort(String),
    #[error("invalid BERTH_BIND: {0}")]
    InvalidBind(String),
    #[error("invalid BERTH_HTTP_MAX_CONC: {0}")]
    InvalidConcurrency(String),
    #[error("asset directory not found: {0}")]
    AssetDirMissing(PathBuf),
}

/// Resolved service configuration. Fixed once at startup; the service
/// never renegotiates any of these values.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: IpAddr,
    /// Port to claim. `0` asks the OS for a free port; the readiness
    /// signal carries the address actually bound.
    pub port: u16,
    /// Root of the prebuilt frontend bundle, already resolved and
    /// verified to exist.
    pub asset_dir: PathBuf,
    pub concurrency_limit: usize,
}

impl ServiceConfig {
    /// Read configuration from `BERTH_*` environment variables, applying
    /// defaults and validating eagerly so startup errors surface before
    /// any socket is bound.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_raw = std::env::var("BERTH_BIND").unwrap_or_else(|_| DEFAULT_BIND.into());
        let bind: IpAddr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_raw))?;

        let port_raw =
            std::env::var("BERTH_PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let port: u16 = port_raw
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_raw))?;

        let concurrency_limit = std::env::var("BERTH_HTTP_MAX_CONC")
            .ok()
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ConfigError::InvalidConcurrency(raw))
            })
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_MAX_CONC);

        let asset_raw =
            std::env::var("BERTH_ASSET_DIR").unwrap_or_else(|_| DEFAULT_ASSET_DIR.into());
        let asset_dir = resolve_asset_dir(Path::new(&asset_raw))?;

        Ok(Self {
            bind,
            port,
            asset_dir,
            concurrency_limit,
        })
    }

    /// Build a config for a specific port, keeping every other field at
    /// its environment-derived value.
    pub fn from_env_with_port(port: u16) -> Result<Self, ConfigError> {
        let mut cfg = Self::from_env()?;
        cfg.port = port;
        Ok(cfg)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Resolve the asset directory. Relative paths are tried against the
/// executable's directory first (packaged layout), then the current
/// working directory (workspace builds).
fn resolve_asset_dir(raw: &Path) -> Result<PathBuf, ConfigError> {
    if raw.is_absolute() {
        return if raw.is_dir() {
            Ok(raw.to_path_buf())
        } else {
            Err(ConfigError::AssetDirMissing(raw.to_path_buf()))
        };
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidate = dir.join(raw);
            if candidate.is_dir() {
                return Ok(candidate);
            }
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join(raw);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }
    Err(ConfigError::AssetDirMissing(raw.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env;

    #[test]
    fn defaults_apply_when_env_unset() {
        let mut guard = env::guard();
        let dir = tempfile::tempdir().expect("tempdir");
        guard.remove("BERTH_BIND");
        guard.remove("BERTH_PORT");
        guard.remove("BERTH_HTTP_MAX_CONC");
        guard.set("BERTH_ASSET_DIR", dir.path().display().to_string());
        let cfg = ServiceConfig::from_env().expect("config");
        assert_eq!(cfg.bind.to_string(), DEFAULT_BIND);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.concurrency_limit, 1024);
        assert_eq!(cfg.asset_dir, dir.path());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut guard = env::guard();
        let dir = tempfile::tempdir().expect("tempdir");
        guard.set("BERTH_ASSET_DIR", dir.path().display().to_string());
        guard.set("BERTH_PORT", "not-a-port");
        let err = ServiceConfig::from_env().expect_err("port must fail");
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let mut guard = env::guard();
        let dir = tempfile::tempdir().expect("tempdir");
        guard.set("BERTH_ASSET_DIR", dir.path().display().to_string());
        guard.set("BERTH_BIND", "localhost:99");
        let err = ServiceConfig::from_env().expect_err("bind must fail");
        assert!(matches!(err, ConfigError::InvalidBind(_)));
    }

    #[test]
    fn missing_asset_dir_fails_before_bind() {
        let mut guard = env::guard();
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("no-such-bundle");
        guard.set("BERTH_ASSET_DIR", missing.display().to_string());
        let err = ServiceConfig::from_env().expect_err("must fail");
        assert!(matches!(err, ConfigError::AssetDirMissing(_)));
    }

    #[test]
    fn port_override_keeps_other_fields() {
        let mut guard = env::guard();
        let dir = tempfile::tempdir().expect("tempdir");
        guard.set("BERTH_ASSET_DIR", dir.path().display().to_string());
        guard.set("BERTH_PORT", "9000");
        let cfg = ServiceConfig::from_env_with_port(0).expect("config");
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.asset_dir, dir.path());
    }
}
