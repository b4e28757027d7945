use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, LAST_MODIFIED, REFERRER_POLICY};
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::responses;
use crate::router::AppState;

/// Single entry document served for `/` and for any client-side-routed
/// path that matches no file on disk.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// Root of the prebuilt frontend bundle. Read-only for the process
/// lifetime; the bundle is produced by an external build step.
#[derive(Debug)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry(&self) -> PathBuf {
        self.root.join(ENTRY_DOCUMENT)
    }

    /// Map a request path onto the bundle, refusing anything that could
    /// escape the root. `None` means the path is not representable.
    pub fn resolve(&self, rel: &str) -> Option<PathBuf> {
        let clean = sanitize(rel)?;
        Some(self.root.join(clean))
    }
}

/// Normalize a URL path into a relative filesystem path. Request paths
/// arrive still percent-encoded; decode first, then reject parent
/// traversal, absolute paths, and non-UTF-8 segments.
fn sanitize(rel: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(rel).ok()?;
    if decoded.contains('\\') || decoded.contains('\0') {
        return None;
    }
    let mut clean = PathBuf::new();
    for comp in Path::new(decoded.as_ref()).components() {
        match comp {
            Component::Normal(seg) => clean.push(seg.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(clean)
}

/// Content type by extension; unknown extensions are opaque bytes.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        Some("ttf") => "font/ttf",
        Some("wasm") => "application/wasm",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Catch-all GET handler for the asset mount.
///
/// Resolution order: exact file in the bundle, then the entry document
/// (client-side routes), then 404 when the bundle has no entry document.
pub async fn serve_asset(State(state): State<AppState>, uri: Uri) -> Response {
    let rel = uri.path().trim_start_matches('/');
    let Some(resolved) = state.assets.resolve(rel) else {
        return responses::not_found(None);
    };

    if !rel.is_empty() {
        match serve_file(&resolved, false).await {
            Ok(Some(resp)) => return resp,
            Ok(None) => {}
            Err(resp) => return resp,
        }
    }

    let entry = state.assets.entry();
    match serve_file(&entry, true).await {
        Ok(Some(resp)) => resp,
        Ok(None) => responses::not_found(Some(format!(
            "entry document {} missing from asset bundle",
            ENTRY_DOCUMENT
        ))),
        Err(resp) => resp,
    }
}

/// `Ok(None)` when the path is not a regular file, so the caller can
/// fall back to the entry document.
async fn serve_file(path: &Path, is_entry: bool) -> Result<Option<Response>, Response> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Ok(None),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "asset stat failed");
            return Err(responses::problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Asset Read Failed",
                None,
            ));
        }
    };
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "asset read failed");
            return Err(responses::problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Asset Read Failed",
                None,
            ));
        }
    };

    let mut resp = (StatusCode::OK, bytes).into_response();
    let headers = resp.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type(path)));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    if is_entry {
        // the entry document always revalidates
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }
    if let Ok(modified) = meta.modified() {
        let stamp = httpdate::fmt_http_date(normalize_mtime(modified));
        if let Ok(value) = HeaderValue::from_str(&stamp) {
            headers.insert(LAST_MODIFIED, value);
        }
    }
    Ok(Some(resp))
}

fn normalize_mtime(t: SystemTime) -> SystemTime {
    // httpdate panics on pre-epoch times; clamp instead.
    if t.duration_since(SystemTime::UNIX_EPOCH).is_ok() {
        t
    } else {
        SystemTime::UNIX_EPOCH
    }
}
