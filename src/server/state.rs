use crate::{cache::ResponseCache, config::Config, hls::rewriter::PlaylistRewriter};
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for connection pooling
    pub http_client: Client,
    /// Cached playlists and segments, keyed by requested URL
    pub cache: ResponseCache,
    /// Routes playlist URI lines back through the proxy
    pub rewriter: PlaylistRewriter,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()?;

        let cache = ResponseCache::new(config.cache_ttl());
        let rewriter = PlaylistRewriter::new(config.proxy_base());

        Ok(Self {
            config: Arc::new(config),
            http_client,
            cache,
            rewriter,
            metrics: crate::metrics::init(),
        })
    }
}
