use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::config::ServiceConfig;
use crate::static_assets::AssetDir;
use crate::{meta, static_assets};

pub mod paths {
    pub const HEALTHZ: &str = "/healthz";
    pub const ABOUT: &str = "/about";
    pub const ASSET_ROOT: &str = "/";
    pub const ASSET_WILDCARD: &str = "/{*path}";
}

#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<AssetDir>,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            assets: Arc::new(AssetDir::new(config.asset_dir.clone())),
        }
    }
}

/// Meta routes plus the asset mount. Everything that is not a meta route
/// falls through to the bundle, so client-side routes resolve to the
/// entry document.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route(paths::HEALTHZ, get(meta::healthz))
        .route(paths::ABOUT, get(meta::about))
        .route(paths::ASSET_ROOT, get(static_assets::serve_asset))
        .route(paths::ASSET_WILDCARD, get(static_assets::serve_asset))
}
