use crate::server::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

/// Render Prometheus metrics in text exposition format
pub async fn serve_metrics(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
        .into_response()
}
