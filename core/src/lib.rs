//! Client core for the movie catalog backend.
//!
//! # Overview
//! Every backend call goes through `ApiClient`, which sends it under a fixed
//! base path and timeout and reduces the outcome to one contract: the
//! envelope's `data` on success, or a `ClientError` whose message has
//! already been reported once through the `Notifier`.
//!
//! # Design
//! - `ClientConfig` is immutable and shared; nothing is reconfigured at runtime.
//! - `Transport` is the only network seam; `ReqwestTransport` is the default.
//! - `envelope::classify` is an ordered match over the `Exchange` tag, kept
//!   free of I/O so it can be tested from recorded responses.
//! - `api` holds the domain-named calls; `routes` and `navigation` hold the
//!   static page table and the title/access pipeline.

pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod navigation;
pub mod notify;
pub mod routes;
pub mod transport;
pub mod types;

pub use client::{ApiClient, Payload};
pub use config::{ClientConfig, ConfigError};
pub use envelope::{Envelope, Exchange};
pub use error::{ClientError, ErrorKind, RawFailure, RequestError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use navigation::{Access, AccessGuard, AllowAll, Navigation, Navigator};
pub use notify::{Notifier, TracingNotifier};
pub use transport::ReqwestTransport;
