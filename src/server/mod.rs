pub mod handlers;
pub mod headers;
pub mod state;

use crate::cache::ResponseCache;
use crate::config::{Config, STREAMING_PROXY_PATH};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use state::AppState;
use std::any::Any;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, error, info};

/// Interval between sweeps of expired cache entries.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Build the application router with all routes and middleware.
///
/// Separated from [`start`] so tests can drive the router without binding a
/// TCP listener.
pub fn build_router(config: Config) -> Result<Router, Box<dyn std::error::Error>> {
    let static_dir = config.static_dir.clone();
    let state = AppState::new(config)?;
    Ok(router_with_state(state, static_dir))
}

fn router_with_state(state: AppState, static_dir: Option<std::path::PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::serve_metrics))
        .route(
            STREAMING_PROXY_PATH,
            get(handlers::proxy::streaming_proxy),
        );

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    with_middleware(app, state)
}

/// Wrap routes with panic recovery, cross-origin headers and access logging.
///
/// The header middleware sits outside the panic layer so recovered 500s carry
/// the same cross-origin headers as every other response.
fn with_middleware(app: Router<AppState>, state: AppState) -> Router {
    app.layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            headers::cross_origin_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Turn a handler panic into a JSON 500 instead of dropping the connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    error!("Server error: {}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong!", "message": message })),
    )
        .into_response()
}

/// Periodically drop expired entries that are never read again.
fn spawn_cache_sweeper(cache: ResponseCache) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            debug!(
                "Cache sweep removed {} expired entries, {} remain",
                purged,
                cache.len()
            );
        }
    });
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let static_dir = config.static_dir.clone();

    let state = AppState::new(config)?;
    spawn_cache_sweeper(state.cache.clone());
    let app = router_with_state(state, static_dir);

    // Bind TCP listener
    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("🚀 Server is running on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
