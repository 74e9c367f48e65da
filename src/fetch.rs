//! Single-attempt retrieval of the release notes document
//!
//! A [`Fetcher`] makes exactly one attempt and reports either the bytes or a
//! [`TransientFailure`]. Retrying and sleeping belong to [`crate::retry`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use ureq::Agent;

/// A failed fetch attempt. Every variant is worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransientFailure {
    #[error("source unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("source answered with HTTP {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// One attempt at retrieving the external document
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the document at `source` once
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, TransientFailure>;
}

/// Largest accepted document unless configured otherwise (64 MiB)
pub const DEFAULT_BODY_LIMIT: u64 = 64 * 1024 * 1024;

/// HTTP(S) fetcher backed by a blocking `ureq` agent
pub struct HttpFetcher {
    agent: Agent,
    body_limit: u64,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: Agent::new_with_config(config),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Reject documents larger than `bytes`. A larger body fails the attempt
    /// with [`TransientFailure::Body`].
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }

    fn fetch_blocking(
        agent: &Agent,
        source: &str,
        body_limit: u64,
    ) -> Result<Vec<u8>, TransientFailure> {
        let mut response = agent.get(source).call().map_err(classify)?;
        response
            .body_mut()
            .with_config()
            .limit(body_limit)
            .read_to_vec()
            .map_err(|e| TransientFailure::Body(e.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, TransientFailure> {
        debug!("GET {}", source);
        let agent = self.agent.clone();
        let source = source.to_string();
        let body_limit = self.body_limit;

        let bytes = tokio::task::spawn_blocking(move || {
            Self::fetch_blocking(&agent, &source, body_limit)
        })
            .await
            .map_err(|e| TransientFailure::Unreachable(format!("fetch task aborted: {}", e)))??;

        debug!("Received {} bytes", bytes.len());
        Ok(bytes)
    }
}

fn classify(err: ureq::Error) -> TransientFailure {
    match err {
        ureq::Error::StatusCode(code) => TransientFailure::Status(code),
        ureq::Error::Timeout(_) => TransientFailure::Timeout,
        other => TransientFailure::Unreachable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response per accepted connection, in order.
    /// Returns the base URL.
    fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        format!("http://{}/release-notes.txt", addr)
    }

    #[tokio::test]
    async fn fetch_success_returns_body() {
        let url = serve(vec![(200, "hello")]);
        let fetcher = HttpFetcher::new(Duration::from_secs(5));

        let bytes = fetcher.fetch(&url).await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn fetch_larger_than_body_limit_fails() {
        let url = serve(vec![(200, "0123456789abcdef0123456789abcdef")]);
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).with_body_limit(16);

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, TransientFailure::Body(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn fetch_within_body_limit_succeeds() {
        let url = serve(vec![(200, "0123456789")]);
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).with_body_limit(16);

        assert_eq!(fetcher.fetch(&url).await.unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn fetch_non_success_status_is_transient() {
        let url = serve(vec![(503, "busy")]);
        let fetcher = HttpFetcher::new(Duration::from_secs(5));

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err, TransientFailure::Status(503));
    }

    #[tokio::test]
    async fn fetch_unreachable_is_transient() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2));
        let err = fetcher.fetch("http://127.0.0.1:1/notes").await.unwrap_err();
        assert!(matches!(
            err,
            TransientFailure::Unreachable(_) | TransientFailure::Timeout
        ));
    }

    #[test]
    fn classify_status_code() {
        assert_eq!(
            classify(ureq::Error::StatusCode(404)),
            TransientFailure::Status(404)
        );
    }
}
