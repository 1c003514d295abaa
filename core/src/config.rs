//! Immutable client configuration.
//!
//! Built once at startup and shared by reference with every call site. The
//! base path, timeout and content type are fixed; only the origin varies
//! between deployments.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::error::RequestError;

pub const BASE_PATH: &str = "/api";
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Environment variable holding the backend origin.
pub const ORIGIN_ENV: &str = "MOVIE_API_ORIGIN";
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid origin {origin:?}: {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    #[error("origin must be http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("could not build HTTP transport: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    origin: Url,
    base_path: &'static str,
    timeout: Duration,
    content_type: &'static str,
}

impl ClientConfig {
    pub fn new(origin: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(origin).map_err(|source| ConfigError::InvalidOrigin {
            origin: origin.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        Ok(Self {
            origin: parsed,
            base_path: BASE_PATH,
            timeout: REQUEST_TIMEOUT,
            content_type: JSON_CONTENT_TYPE,
        })
    }

    /// Reads the origin from `MOVIE_API_ORIGIN`, falling back to the local
    /// development backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        let origin = std::env::var(ORIGIN_ENV).unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
        Self::new(&origin)
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn base_path(&self) -> &str {
        self.base_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn content_type(&self) -> &str {
        self.content_type
    }

    /// Resolves a relative call path under the base path.
    ///
    /// The leading slash is optional. Paths that could escape the base path
    /// (absolute URLs, protocol-relative `//host`, `..` segments) are refused.
    pub fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return Err(RequestError::EmptyPath);
        }
        if path.starts_with("//")
            || path.contains("://")
            || relative.split(['/', '?']).any(|segment| segment == "..")
        {
            return Err(RequestError::InvalidPath(path.to_string()));
        }
        let origin = self.origin.as_str().trim_end_matches('/');
        let joined = format!("{origin}{}/{relative}", self.base_path);
        let url = Url::parse(&joined).map_err(|_| RequestError::InvalidPath(path.to_string()))?;
        // Encoded dot segments and backslashes are only normalized by the parser.
        let prefix = format!("{}{}/", self.origin.path().trim_end_matches('/'), self.base_path);
        if !url.path().starts_with(&prefix) {
            return Err(RequestError::InvalidPath(path.to_string()));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:8080").unwrap()
    }

    #[test]
    fn defaults_are_fixed() {
        let config = config();
        assert_eq!(config.base_path(), "/api");
        assert_eq!(config.timeout(), Duration::from_millis(15_000));
        assert_eq!(config.content_type(), "application/json");
    }

    #[test]
    fn endpoint_appends_under_base_path() {
        let url = config().endpoint("/movie/list").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/movie/list");
    }

    #[test]
    fn endpoint_accepts_path_without_leading_slash() {
        let url = config().endpoint("auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/auth/login");
    }

    #[test]
    fn trailing_slash_on_origin_is_ignored() {
        let config = ClientConfig::new("http://localhost:8080/").unwrap();
        let url = config.endpoint("/user/info").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/user/info");
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(config().endpoint(""), Err(RequestError::EmptyPath)));
        assert!(matches!(config().endpoint("/"), Err(RequestError::EmptyPath)));
    }

    #[test]
    fn paths_cannot_override_base() {
        for path in [
            "http://evil.example/x",
            "//evil.example/x",
            "/../admin",
            "/movie/../../x",
            "/%2e%2e/admin",
            "/.%2E/admin",
            "/movie\\..\\..\\x",
        ] {
            assert!(
                matches!(config().endpoint(path), Err(RequestError::InvalidPath(_))),
                "{path} should be refused"
            );
        }
    }

    #[test]
    fn dot_segments_that_stay_inside_base_are_allowed() {
        let url = config().endpoint("/movie/%2e%2e/user/info").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/user/info");
    }

    #[test]
    fn origin_path_prefix_is_kept() {
        let config = ClientConfig::new("http://localhost:8080/gateway/").unwrap();
        let url = config.endpoint("/movie/list").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/gateway/api/movie/list");
        assert!(matches!(config.endpoint("/%2e%2e/x"), Err(RequestError::InvalidPath(_))));
    }

    #[test]
    fn invalid_origin_is_reported() {
        let err = ClientConfig::new("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin { .. }));
    }

    #[test]
    fn non_http_origin_is_reported() {
        let err = ClientConfig::new("ftp://files.example").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(scheme) if scheme == "ftp"));
    }
}
