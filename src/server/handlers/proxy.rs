use crate::{
    error::{ProxyError, Result},
    hls::ContentKind,
    metrics,
    server::state::AppState,
    upstream::fetch_with_referer,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Proxy a playlist or segment through the cache.
///
/// Playlists are rewritten so their URI lines come back through this endpoint;
/// segments are passed through untouched. Both are cached under the requested
/// URL for the configured TTL.
pub async fn streaming_proxy(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Response {
    let start = Instant::now();
    let url = params.get("url").filter(|url| !url.is_empty());

    let (label, response) = match url {
        Some(url) => {
            let kind = ContentKind::from_url(url);
            let response = proxy_request(&state, url, kind)
                .await
                .unwrap_or_else(IntoResponse::into_response);
            (kind.as_str(), response)
        }
        None => ("invalid", ProxyError::MissingParameter.into_response()),
    };

    metrics::record_request(label, response.status().as_u16());
    metrics::record_duration(label, start);

    response
}

async fn proxy_request(state: &AppState, url: &str, kind: ContentKind) -> Result<Response> {
    if let Some(payload) = state.cache.get(url) {
        info!("Serving from cache: {}", url);
        metrics::record_cache("hit");
        return Ok(respond(kind, payload));
    }
    metrics::record_cache("miss");

    info!("Fetching {} from upstream: {}", kind.as_str(), url);

    let response = fetch_with_referer(
        &state.http_client,
        url,
        &state.config.referer_url,
        state.config.upstream_timeout(),
    )
    .await
    .inspect_err(|e| {
        let reason = match e {
            ProxyError::UpstreamError { .. } => "status",
            _ => "unreachable",
        };
        metrics::record_upstream_error(reason);
    })?;

    let payload = match kind {
        ContentKind::Playlist => {
            let text = response.text().await?;
            Bytes::from(state.rewriter.rewrite(&text, url))
        }
        ContentKind::Segment => response.bytes().await?,
    };

    // Concurrent misses for the same URL each fetch and store; last store wins.
    state.cache.insert(url, payload.clone());

    Ok(respond(kind, payload))
}

fn respond(kind: ContentKind, payload: Bytes) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, kind.content_type()),
            (header::CACHE_CONTROL, kind.cache_control()),
        ],
        payload,
    )
        .into_response()
}
