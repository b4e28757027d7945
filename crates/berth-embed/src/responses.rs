use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

pub fn json_ok(payload: Value) -> axum::response::Response {
    (StatusCode::OK, Json(payload)).into_response()
}

/// Problem-details style error body.
pub fn problem(status: StatusCode, title: &str, detail: Option<String>) -> axum::response::Response {
    let mut body = json!({
        "type": "about:blank",
        "title": title,
        "status": status.as_u16(),
    });
    if let Some(detail) = detail {
        body["detail"] = Value::String(detail);
    }
    (status, Json(body)).into_response()
}

pub fn not_found(detail: Option<String>) -> axum::response::Response {
    problem(StatusCode::NOT_FOUND, "Not Found", detail)
}
