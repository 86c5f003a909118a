//! HTTP transport to the transactional SOS (SOS-T).
//!
//! Requests are POX: the rendered XML is POSTed as the body with
//! `Content-Type: application/xml`. The trait is the seam the submitter
//! depends on; `ReqwestTransport` is the production implementation, tests
//! substitute an in-memory recorder.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;

pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Headers sent with every request besides `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pub authorization: String,
    pub accept_language: String,
}

impl RequestHeaders {
    pub fn new(authorization: impl Into<String>) -> Self {
        Self {
            authorization: authorization.into(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

/// Status and body of a completed exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Building the client failed (TLS backend, invalid settings).
    #[error("HTTP client setup failed: {0}")]
    Client(String),
    /// Connection, timeout, or protocol failure while sending.
    #[error("HTTP request failed: {0}")]
    Request(String),
    /// The response arrived but its body could not be read.
    #[error("reading HTTP response body failed: {0}")]
    Body(String),
}

pub trait Transport {
    fn post(
        &self,
        url: &str,
        body: &str,
        headers: &RequestHeaders,
    ) -> Result<HttpResponse, TransportError>;
}

/// Blocking `reqwest` client. One connection pool for the whole run.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn post(
        &self,
        url: &str,
        body: &str,
        headers: &RequestHeaders,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, CONTENT_TYPE_XML)
            .header(AUTHORIZATION, headers.authorization.as_str())
            .header(ACCEPT_LANGUAGE, headers.accept_language.as_str())
            .body(body.to_string())
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
