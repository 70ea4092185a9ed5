//! Router construction and the serve loop.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_MAX_AGE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use super::handlers::{collect, ping, start_capture};
use super::AppState;
use crate::{AppError, Result};

/// Build the collector router.
///
/// Paths other than the three collector routes fall through to the
/// configured static root, or `404` when none is configured.
///
/// Request bodies are not size-limited. Every response carries the CORS
/// origin, methods, and max-age headers, not only preflight replies.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let max_age = state.config.cors_max_age();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .max_age(max_age);
    let allow_methods = SetResponseHeaderLayer::if_not_present(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST"),
    );
    let max_age = SetResponseHeaderLayer::if_not_present(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(max_age.as_secs()),
    );

    let mut router = Router::new()
        .route("/", get(start_capture))
        .route("/ping", get(ping))
        .route("/collect", post(collect));

    if let Some(root) = &state.config.static_root {
        info!(root = %root.display(), "serving static files for unmatched paths");
        router = router.fallback_service(ServeDir::new(root));
    }

    router
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(allow_methods)
        .layer(max_age)
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the address cannot be bound or the server
/// fails.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind = state.config.bind_addr;
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind collector on {bind}: {err}")))?;
    serve_listener(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// In-flight capture windows are allowed to finish before this returns.
///
/// # Errors
///
/// Returns `AppError::Http` if the server fails.
pub async fn serve_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, window_secs = state.config.window_seconds, "starting trace collector");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Http(format!("collector server error: {err}")))?;

    info!("trace collector shut down");
    Ok(())
}
