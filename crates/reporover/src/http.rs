//! HTTP seam between repository sources and the network.
//!
//! Sources only issue authenticated GETs and look at the status and body of
//! the answer, so that is all a [`HttpTransport`] has to carry. Production
//! code uses reqwest; unit tests use an in-memory transport with canned
//! answers.

use async_trait::async_trait;
use thiserror::Error;

/// An outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// First value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of an answered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("http transport error: {0}")]
pub struct HttpError(pub String);

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

#[cfg(feature = "azure")]
pub mod reqwest_transport {
    use std::time::Duration;

    use super::{HttpError, HttpRequest, HttpResponse, HttpTransport, async_trait};

    /// [`HttpTransport`] over a shared reqwest client.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Transport whose requests fail after `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
            reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map(|client| Self { client })
                .map_err(|e| HttpError(e.to_string()))
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let builder = request
                .headers
                .iter()
                .fold(self.client.get(&request.url), |builder, (name, value)| {
                    builder.header(*name, value.as_str())
                });

            let response = builder.send().await.map_err(|e| HttpError(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| HttpError(e.to_string()))?;

            tracing::trace!(url = %request.url, status, bytes = body.len(), "HTTP response");
            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        }
    }
}

#[cfg(test)]
pub(crate) use canned::CannedTransport;
