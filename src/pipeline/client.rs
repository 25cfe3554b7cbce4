//! OCR endpoint client: one image in, one raw response body out.
//!
//! [`OcrClient`] is the seam between the page loop and the network. The
//! default implementation, [`VisionClient`], speaks the Computer Vision
//! `ocr` wire contract:
//!
//! ```text
//! POST {endpoint}?language=unk&detectOrientation=true
//! Ocp-Apim-Subscription-Key: <key>
//! Content-Type: application/octet-stream
//!
//! <raw JPEG bytes>
//! ```
//!
//! The client returns whatever body came back together with its status and
//! leaves interpretation to [`crate::pipeline::ocr`], so error bodies can
//! still be shown in the raw transcript.

use crate::config::VisionConfig;
use crate::error::Pdf2VisionError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Header carrying the subscription key.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// A response body as received, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure: no usable body was received.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("request failed: {0}")]
    Request(String),

    #[error("could not read response body: {0}")]
    Body(String),
}

/// Sends one page image to an OCR service.
#[async_trait]
pub trait OcrClient: Send + Sync {
    async fn analyze(&self, image: Vec<u8>) -> Result<RawResponse, ClientError>;
}

/// reqwest-backed client for the Computer Vision `ocr` operation.
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
    detect_orientation: bool,
    timeout_secs: u64,
}

impl VisionClient {
    pub fn from_config(config: &VisionConfig) -> Result<Self, Pdf2VisionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Pdf2VisionError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            detect_orientation: config.detect_orientation,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Query parameters appended to the endpoint on every request.
    pub fn query(&self) -> [(&'static str, &str); 2] {
        [
            ("language", self.language.as_str()),
            (
                "detectOrientation",
                if self.detect_orientation { "true" } else { "false" },
            ),
        ]
    }
}

#[async_trait]
impl OcrClient for VisionClient {
    async fn analyze(&self, image: Vec<u8>) -> Result<RawResponse, ClientError> {
        let len = image.len();
        let response = self
            .http
            .post(&self.endpoint)
            .query(&self.query())
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ClientError::Request(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                ClientError::Body(e.to_string())
            }
        })?;

        debug!("POST {} ({} bytes) → HTTP {}", self.endpoint, len, status);

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config() -> VisionConfig {
        VisionConfig::builder()
            .endpoint_url("https://example.cognitiveservices.azure.com/vision/v2.0/ocr")
            .api_key("key")
            .build()
            .unwrap()
    }

    #[test]
    fn default_query_parameters() {
        let client = VisionClient::from_config(&config()).unwrap();
        assert_eq!(
            client.query(),
            [("language", "unk"), ("detectOrientation", "true")]
        );
    }

    #[test]
    fn query_follows_config() {
        let mut cfg = config();
        cfg.language = "de".into();
        cfg.detect_orientation = false;
        let client = VisionClient::from_config(&cfg).unwrap();
        assert_eq!(
            client.query(),
            [("language", "de"), ("detectOrientation", "false")]
        );
    }

    #[test]
    fn raw_response_success_range() {
        assert!(RawResponse::ok("{}").is_success());
        let denied = RawResponse {
            status: 401,
            body: String::new(),
        };
        assert!(!denied.is_success());
    }

    /// One request as seen on the wire.
    struct Captured {
        request_line: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Accept one connection, read a full request and answer with `reply`.
    async fn serve_once(listener: TcpListener, reply: &'static str) -> Captured {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let captured = loop {
            let n = sock.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the request was complete");
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let mut lines = head.split("\r\n");
            let request_line = lines.next().unwrap_or_default().to_string();
            let headers: Vec<(String, String)> = lines
                .filter_map(|l| l.split_once(':'))
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect();
            let len: usize = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);

            if buf.len() >= end + 4 + len {
                break Captured {
                    request_line,
                    headers,
                    body: buf[end + 4..end + 4 + len].to_vec(),
                };
            }
        };

        sock.write_all(reply.as_bytes()).await.unwrap();
        sock.shutdown().await.ok();
        captured
    }

    async fn local_client(secs: u64) -> (VisionClient, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = VisionConfig::builder()
            .endpoint_url(format!("http://127.0.0.1:{port}/vision/v2.0/ocr"))
            .api_key("secret-key")
            .request_timeout_secs(secs)
            .build()
            .unwrap();
        (VisionClient::from_config(&config).unwrap(), listener)
    }

    #[tokio::test]
    async fn analyze_speaks_the_ocr_wire_contract() {
        let (client, listener) = local_client(10).await;
        let server = tokio::spawn(serve_once(
            listener,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 14\r\nConnection: close\r\n\r\n{\"regions\":[]}",
        ));

        let response = client.analyze(b"JPEGDATA".to_vec()).await.unwrap();
        let seen = server.await.unwrap();

        assert_eq!(
            seen.request_line,
            "POST /vision/v2.0/ocr?language=unk&detectOrientation=true HTTP/1.1"
        );
        assert_eq!(seen.header(SUBSCRIPTION_KEY_HEADER), Some("secret-key"));
        assert_eq!(seen.header("content-type"), Some("application/octet-stream"));
        assert_eq!(seen.body, b"JPEGDATA");
        assert_eq!(response, RawResponse::ok(r#"{"regions":[]}"#));
    }

    #[tokio::test]
    async fn error_status_still_returns_the_body() {
        let (client, listener) = local_client(10).await;
        let server = tokio::spawn(serve_once(
            listener,
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 13\r\nConnection: close\r\n\r\naccess denied",
        ));

        let response = client.analyze(vec![0xFF, 0xD8]).await.unwrap();
        server.await.unwrap();

        assert_eq!(response.status, 401);
        assert!(!response.is_success());
        assert_eq!(response.body, "access denied");
    }

    #[tokio::test]
    async fn stalled_body_is_a_timeout() {
        let (client, listener) = local_client(1).await;
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut chunk = [0u8; 4096];
            let _ = sock.read(&mut chunk).await;
            // Promise 100 bytes, send 2, then stall past the client timeout.
            sock.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = client.analyze(b"JPEGDATA".to_vec()).await.unwrap_err();
        server.abort();

        assert!(matches!(err, ClientError::Timeout { secs: 1 }), "{err}");
    }
}
