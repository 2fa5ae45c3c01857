//! Prometheus metrics for the proxy.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::warn;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder once and return its render handle.
///
/// If another recorder is already installed, a detached handle is returned and
/// `/metrics` renders empty output.
pub fn init() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Prometheus recorder not installed: {}", e);
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Count a finished proxy request by content kind and response status.
pub fn record_request(kind: &'static str, status: u16) {
    counter!("hls_proxy_requests_total", "kind" => kind, "status" => status.to_string())
        .increment(1);
}

pub fn record_duration(kind: &'static str, start: Instant) {
    histogram!("hls_proxy_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

/// `result` is `"hit"` or `"miss"`.
pub fn record_cache(result: &'static str) {
    counter!("hls_proxy_cache_lookups_total", "result" => result).increment(1);
}

/// `reason` is `"status"` for non-2xx answers, `"unreachable"` otherwise.
pub fn record_upstream_error(reason: &'static str) {
    counter!("hls_proxy_upstream_errors_total", "reason" => reason).increment(1);
}
