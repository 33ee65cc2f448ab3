use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use munro_core::filter::filter;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/munros", get(list_munros))
        .route("/api/munros/all", get(list_munros))
        .route("/api/munros/csv", get(get_csv))
        .route("/api/munros/{id}", get(get_munro))
        .route("/health", get(health))
        .route("/", get(index))
        .fallback(static_file)
}

/// Strong ETag of a response body.
pub fn etag_for(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

fn matches_etag(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|t| t.trim() == etag || t.trim() == "*"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    munros: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        munros: state.munros.len(),
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct ListParams {
    q: Option<String>,
}

async fn list_munros(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let (body, etag) = match params.q.as_deref().filter(|q| !q.trim().is_empty()) {
        None => (state.json.clone(), state.etag.to_string()),
        Some(q) => {
            let matched = filter(&state.munros, q);
            let json = serde_json::to_vec(&matched).map_err(|_| {
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "JSON serialization failed",
                )
            })?;
            let etag = etag_for(&json);
            (Bytes::from(json), etag)
        }
    };

    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|_| error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid ETag"))?;

    if matches_etag(&headers, &etag) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::ETAG, etag_value),
        ],
        body,
    )
        .into_response())
}

async fn get_munro(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let running_no: u32 = id
        .parse()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid running number"))?;
    let munro = munro_core::find(&state.munros, running_no)
        .map_err(|e| error_response(StatusCode::NOT_FOUND, &e.to_string()))?;
    Ok(Json(munro.clone()))
}

async fn get_csv(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        state.csv.clone(),
    )
}

/// Serve the viewer shell.
async fn index(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let index_path = state.viewer_dir.join("index.html");
    let html = tokio::fs::read_to_string(&index_path).await.map_err(|_| {
        tracing::warn!("viewer missing at {}", index_path.display());
        error_response(StatusCode::SERVICE_UNAVAILABLE, "Viewer not available")
    })?;
    Ok(Html(html))
}

/// Map a request path onto the viewer directory. Anything that could climb
/// out of it is refused.
fn resolve_asset(root: &FsPath, request_path: &str) -> Option<PathBuf> {
    let rel = FsPath::new(request_path.trim_start_matches('/'));
    let mut out = root.to_path_buf();
    for component in rel.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

/// Static viewer assets (wasm, js, css).
async fn static_file(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let path = resolve_asset(&state.viewer_dir, uri.path())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Invalid path"))?;
    let data = tokio::fs::read(&path)
        .await
        .map_err(|_| error_response(StatusCode::NOT_FOUND, "Not found"))?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        data,
    )
        .into_response())
}

fn error_response(status: StatusCode, msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
}
