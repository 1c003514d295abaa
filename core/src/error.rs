//! Error types for the movie API client.
//!
//! # Design
//! Every failed call produces one `ClientError`. `kind` says which branch of
//! the response classification fired, `message` is the localized text that
//! was shown to the user, and `raw` keeps whatever the failure was built from
//! so callers can still inspect the envelope or HTTP details.

use thiserror::Error;

use crate::envelope::Envelope;
use crate::http::{HttpResponse, TransportError};

/// Which classification branch produced the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A well-formed envelope arrived with a non-success code.
    DomainFailure,

    /// A response arrived but was non-2xx or not an envelope.
    TransportFailure,

    /// The request went out and no response came back.
    NetworkFailure,

    /// Nothing else matched.
    UnknownFailure,
}

/// Errors raised while turning a call into an `HttpRequest`, before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request path is empty")]
    EmptyPath,

    #[error("request path {0:?} must be relative to the base path")]
    InvalidPath(String),

    #[error("payload could not be serialized: {0}")]
    Serialization(String),

    #[error("query parameters must be a JSON object, got {0}")]
    ParamsNotObject(&'static str),
}

/// The underlying failure a `ClientError` was derived from.
#[derive(Debug, Clone)]
pub enum RawFailure {
    Envelope(Envelope),
    Response(HttpResponse),
    Transport(TransportError),
    Request(RequestError),
}

/// The single failure value surfaced to callers.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
    /// Only set for `TransportFailure`.
    pub status: Option<u16>,
    pub raw: RawFailure,
}

impl ClientError {
    pub fn domain(envelope: Envelope, message: String) -> Self {
        Self {
            kind: ErrorKind::DomainFailure,
            message,
            status: None,
            raw: RawFailure::Envelope(envelope),
        }
    }

    pub fn transport(response: HttpResponse, message: String) -> Self {
        Self {
            kind: ErrorKind::TransportFailure,
            message,
            status: Some(response.status),
            raw: RawFailure::Response(response),
        }
    }

    pub fn network(error: TransportError, message: String) -> Self {
        Self {
            kind: ErrorKind::NetworkFailure,
            message,
            status: None,
            raw: RawFailure::Transport(error),
        }
    }

    pub fn unknown(raw: RawFailure, message: String) -> Self {
        Self {
            kind: ErrorKind::UnknownFailure,
            message,
            status: None,
            raw,
        }
    }

    /// The envelope behind a `DomainFailure`, if any.
    pub fn envelope(&self) -> Option<&Envelope> {
        match &self.raw {
            RawFailure::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }
}
