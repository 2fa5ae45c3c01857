//! Upstream HTTP fetch with a forced `Referer` header.
//!
//! A single attempt per call: failures are reported straight back to the
//! proxy handler, which turns them into the client-facing error response.

use crate::error::{ProxyError, Result};
use hyper::ext::ReasonPhrase;
use reqwest::{Client, Response, header};
use std::time::Duration;
use tracing::warn;

/// Fetch `url` with the `Referer` header set to `referer`.
///
/// `timeout` applies to this request only; `None` leaves the client default.
///
/// # Errors
/// - [`ProxyError::UpstreamUnreachable`] on DNS, connect, timeout or request
///   build failure.
/// - [`ProxyError::UpstreamError`] when upstream answers with a non-2xx status.
pub async fn fetch_with_referer(
    client: &Client,
    url: &str,
    referer: &str,
    timeout: Option<Duration>,
) -> Result<Response> {
    let mut request = client.get(url).header(header::REFERER, referer);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|e| {
        warn!("Upstream fetch failed for {}: {}", url, e);
        ProxyError::UpstreamUnreachable(e)
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!("Upstream returned {} for {}", status, url);
        return Err(ProxyError::UpstreamError {
            status,
            status_text: status_text(&response),
        });
    }

    Ok(response)
}

/// Reason phrase exactly as upstream sent it, or the canonical one for the
/// status when the response carried the standard text.
fn status_text(response: &Response) -> String {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            response
                .status()
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REFERER: &str = "https://referer.example/";

    #[tokio::test]
    async fn sends_referer_override() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/live.m3u8"))
            .and(header_eq("referer", REFERER))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/live.m3u8", server.uri());
        let response = fetch_with_referer(&client, &url, REFERER, None)
            .await
            .expect("fetch should succeed");

        assert_eq!(response.text().await.unwrap(), "#EXTM3U\n");
    }

    #[tokio::test]
    async fn referer_replaces_client_default() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header_eq("referer", REFERER))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut defaults = header::HeaderMap::new();
        defaults.insert(
            header::REFERER,
            header::HeaderValue::from_static("https://default.example/"),
        );
        let client = Client::builder().default_headers(defaults).build().unwrap();

        let result = fetch_with_referer(&client, &server.uri(), REFERER, None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let err = fetch_with_referer(&client, &server.uri(), REFERER, None)
            .await
            .unwrap_err();

        match err {
            ProxyError::UpstreamError {
                status,
                status_text,
            } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(status_text, "Not Found");
            }
            other => panic!("expected UpstreamError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn custom_reason_phrase_is_forwarded() {
        // wiremock always sends canonical reason phrases, so answer by hand
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 404 Gone Fishing\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let client = Client::new();
        let err = fetch_with_referer(&client, &format!("http://{addr}/seg.ts"), REFERER, None)
            .await
            .unwrap_err();

        match err {
            ProxyError::UpstreamError {
                status,
                status_text,
            } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(status_text, "Gone Fishing");
            }
            other => panic!("expected UpstreamError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let err = fetch_with_referer(&client, &server.uri(), REFERER, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn connection_refused_is_unreachable() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::new();
        let err = fetch_with_referer(&client, &format!("http://{addr}/seg.ts"), REFERER, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamUnreachable(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_unreachable() {
        let client = Client::new();
        let err = fetch_with_referer(&client, "not-a-url", REFERER, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamUnreachable(_)));
    }

    #[tokio::test]
    async fn per_request_timeout_applies() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = Client::new();
        let err = fetch_with_referer(
            &client,
            &server.uri(),
            REFERER,
            Some(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamUnreachable(ref e) if e.is_timeout()));
    }
}
