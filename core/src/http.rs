//! HTTP transport types and the I/O seam.
//!
//! # Design
//! Requests and responses are plain data. The client builds an `HttpRequest`,
//! hands it to a `Transport`, and classifies whatever comes back. Only the
//! transport touches the network, so the classification logic stays
//! deterministic and can be driven from test vectors.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the query string for reads.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures raised by a `Transport` before a response could be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response arrived within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request was sent (or attempted) but the server never answered:
    /// connection refused, DNS failure, reset.
    #[error("no response from server: {0}")]
    Unreachable(String),

    /// Anything else the transport could not complete.
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// True when the request went out but nothing came back.
    pub fn is_no_response(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Unreachable(_))
    }
}

/// Executes one HTTP round trip.
///
/// Implementations return `Ok` for every response that was received,
/// whatever its status; status interpretation belongs to the client.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
