//! Cross-origin and security response headers.
//!
//! Every response gets the CORS and cross-origin resource policy headers so
//! players on other origins can load playlists and segments. `OPTIONS` requests
//! are answered here with `204 No Content` for any path.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::state::AppState;
use crate::config::AllowedOrigins;

const ALLOW_METHODS: &str = "GET, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Origin, Accept, Range";

/// Axum middleware: answer preflights and attach cross-origin headers.
pub async fn cross_origin_headers(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    apply(
        response.headers_mut(),
        &state.config.allowed_origins,
        origin.as_ref(),
    );
    response
}

fn apply(headers: &mut HeaderMap, allowed: &AllowedOrigins, origin: Option<&HeaderValue>) {
    match allowed {
        AllowedOrigins::Any => {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
        AllowedOrigins::List(_) => {
            if let Some(origin) = origin
                && let Ok(value) = origin.to_str()
                && allowed.allows(value)
            {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            }
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        "cross-origin-resource-policy",
        HeaderValue::from_static("cross-origin"),
    );
    headers.insert(
        "cross-origin-opener-policy",
        HeaderValue::from_static("unsafe-none"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
}
