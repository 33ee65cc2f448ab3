mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::Router;
use munro_core::error::MunroError;
use munro_core::types::Munro;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let csv_path = std::env::var("MUNRO_CSV").unwrap_or_else(|_| "data/munrotab.csv".to_string());
    let viewer_dir =
        std::env::var("VIEWER_DIR").unwrap_or_else(|_| "crates/viewer/dist".to_string());

    let state = match std::fs::read(&csv_path)
        .map_err(MunroError::from)
        .and_then(|csv| AppState::from_csv(csv, PathBuf::from(&viewer_dir)))
    {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to load {csv_path}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded {} munros from {csv_path}, serving viewer from {viewer_dir}",
        state.munros.len()
    );

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {bind_addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {bind_addr}");
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Full middleware stack around the routes.
fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Read-only snapshot loaded at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub munros: Arc<Vec<Munro>>,
    /// The source table as received.
    pub csv: Bytes,
    /// Pre-encoded JSON of the full list.
    pub json: Bytes,
    pub etag: Arc<str>,
    pub viewer_dir: PathBuf,
}

impl AppState {
    pub fn from_csv(csv: Vec<u8>, viewer_dir: PathBuf) -> Result<Self, MunroError> {
        let munros = munro_core::parse_csv(&csv)?;
        let json = serde_json::to_vec(&munros)?;
        let etag = routes::etag_for(&json);
        Ok(Self {
            munros: Arc::new(munros),
            csv: Bytes::from(csv),
            json: Bytes::from(json),
            etag: Arc::from(etag),
            viewer_dir,
        })
    }
}
