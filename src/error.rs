use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors surfaced by the streaming proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `url` query parameter was absent or empty
    #[error("URL parameter is required")]
    MissingParameter,

    /// Upstream answered with a non-2xx status, forwarded as-is
    #[error("{status_text}")]
    UpstreamError {
        status: StatusCode,
        status_text: String,
    },

    /// DNS, connect, timeout or body read failure
    #[error("{0}")]
    UpstreamUnreachable(#[from] reqwest::Error),

    /// A playlist reference could not be resolved to an absolute URL
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("{0}")]
    InternalError(String),
}

impl ProxyError {
    /// Status code the client sees for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamError { status, .. } => *status,
            ProxyError::UpstreamUnreachable(_)
            | ProxyError::MalformedUrl(_)
            | ProxyError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ProxyError::MissingParameter => json!({ "error": self.to_string() }),
            ProxyError::UpstreamError {
                status,
                status_text,
            } => json!({ "error": status_text, "status": status.as_u16() }),
            _ => {
                error!("Proxy error: {}", self);
                json!({ "error": "Failed to fetch data", "details": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}
