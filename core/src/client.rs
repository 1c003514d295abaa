//! The transport core every API call goes through.
//!
//! # Design
//! `ApiClient` holds the immutable `ClientConfig`, a `Transport` and a
//! `Notifier`, and carries no mutable state between calls. A call runs in
//! three steps:
//!
//! 1. `build_request` turns `(method, path, payload)` into an `HttpRequest`.
//!    This is the request-side interceptor: it adds nothing beyond the fixed
//!    content type, and a build failure is logged and short-circuits the call
//!    before any I/O.
//! 2. The transport executes the request under the configured timeout.
//! 3. `envelope::classify` resolves the exchange. If it failed, the notifier
//!    is told exactly once, with the same message the caller receives.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::envelope::{classify, Exchange};
use crate::error::{ClientError, RawFailure, RequestError};
use crate::http::{HttpMethod, HttpRequest, Transport, TransportError};
use crate::notify::{Notifier, TracingNotifier};
use crate::transport::ReqwestTransport;

/// What a call sends: query pairs for reads, a JSON body for writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Query(Vec<(String, String)>),
    Json(String),
}

impl Payload {
    /// Flattens `params` into query pairs.
    ///
    /// `params` must serialize to an object, or to null for "no query".
    /// Null fields are dropped, arrays repeat their key, nested objects are
    /// sent as their JSON text.
    pub fn query<P: Serialize + ?Sized>(params: &P) -> Result<Self, RequestError> {
        let value = serde_json::to_value(params).map_err(|e| RequestError::Serialization(e.to_string()))?;
        let fields = match value {
            Value::Null => return Ok(Payload::Query(Vec::new())),
            Value::Object(fields) => fields,
            Value::Array(_) => return Err(RequestError::ParamsNotObject("array")),
            Value::String(_) => return Err(RequestError::ParamsNotObject("string")),
            Value::Number(_) => return Err(RequestError::ParamsNotObject("number")),
            Value::Bool(_) => return Err(RequestError::ParamsNotObject("boolean")),
        };
        let mut pairs = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = query_text(item) {
                            pairs.push((key.clone(), text));
                        }
                    }
                }
                other => {
                    if let Some(text) = query_text(other) {
                        pairs.push((key, text));
                    }
                }
            }
        }
        Ok(Payload::Query(pairs))
    }

    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self, RequestError> {
        serde_json::to_string(body)
            .map(Payload::Json)
            .map_err(|e| RequestError::Serialization(e.to_string()))
    }
}

fn query_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Asynchronous client for the movie backend.
///
/// Cloning is cheap when the transport and notifier are; the configuration is
/// shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ApiClient<T = ReqwestTransport, N = TracingNotifier> {
    config: Arc<ClientConfig>,
    transport: T,
    notifier: N,
}

impl ApiClient {
    /// Client over `reqwest` that reports failures through `tracing`.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_parts(Arc::new(config), transport, TracingNotifier))
    }
}

impl<T: Transport, N: Notifier> ApiClient<T, N> {
    pub fn with_parts(config: Arc<ClientConfig>, transport: T, notifier: N) -> Self {
        Self {
            config,
            transport,
            notifier,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `path` with `params` as the query string.
    pub async fn fetch<P: Serialize + ?Sized>(&self, path: &str, params: &P) -> Result<Value, ClientError> {
        let request = Payload::query(params).and_then(|p| self.build_request(HttpMethod::Get, path, p));
        self.dispatch(request).await
    }

    /// POST `body` as JSON to `path`.
    pub async fn create<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let request = Payload::json(body).and_then(|p| self.build_request(HttpMethod::Post, path, p));
        self.dispatch(request).await
    }

    /// PUT `body` as JSON to `path`.
    pub async fn replace<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let request = Payload::json(body).and_then(|p| self.build_request(HttpMethod::Put, path, p));
        self.dispatch(request).await
    }

    /// DELETE `path` with `params` as the query string.
    pub async fn remove<P: Serialize + ?Sized>(&self, path: &str, params: &P) -> Result<Value, ClientError> {
        let request = Payload::query(params).and_then(|p| self.build_request(HttpMethod::Delete, path, p));
        self.dispatch(request).await
    }

    /// Builds the request a call would send. Headers are the configured
    /// content type and nothing else.
    pub fn build_request(&self, method: HttpMethod, path: &str, payload: Payload) -> Result<HttpRequest, RequestError> {
        let mut url: Url = self.config.endpoint(path)?;
        let body = match payload {
            Payload::Query(pairs) => {
                if !pairs.is_empty() {
                    url.query_pairs_mut().extend_pairs(pairs);
                }
                None
            }
            Payload::Json(body) => Some(body),
        };
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers: vec![("content-type".to_string(), self.config.content_type().to_string())],
            body,
        })
    }

    async fn dispatch(&self, request: Result<HttpRequest, RequestError>) -> Result<Value, ClientError> {
        let exchange = match request {
            Ok(request) => {
                debug!(method = %request.method, url = %request.url, "dispatching request");
                let sent = tokio::time::timeout(self.config.timeout(), self.transport.send(request))
                    .await
                    .unwrap_or(Err(TransportError::Timeout));
                Exchange::from(sent)
            }
            Err(err) => {
                error!(error = %err, "request construction failed");
                Exchange::Unclassified(RawFailure::Request(err))
            }
        };

        let outcome = classify(exchange);
        if let Err(err) = &outcome {
            debug!(kind = ?err.kind, status = ?err.status, message = %err.message, "request rejected");
            self.notifier.notify(&err.message);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::envelope::{MSG_FORBIDDEN, MSG_GENERIC, MSG_NO_RESPONSE};
    use crate::error::ErrorKind;
    use crate::http::HttpResponse;

    /// Replays canned results and records every request it was given.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        seen: Mutex<Vec<HttpRequest>>,
        delay: Option<Duration>,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let reply = self.replies.lock().unwrap().pop_front();
            reply.unwrap_or_else(|| Err(TransportError::Other("no scripted reply".into())))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn reply(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn client(
        transport: ScriptedTransport,
    ) -> (ApiClient<Arc<ScriptedTransport>, Arc<RecordingNotifier>>, Arc<ScriptedTransport>, Arc<RecordingNotifier>) {
        let config = Arc::new(ClientConfig::new("http://localhost:8080").unwrap());
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let client = ApiClient::with_parts(config, Arc::clone(&transport), Arc::clone(&notifier));
        (client, transport, notifier)
    }

    #[tokio::test]
    async fn fetch_sends_query_and_unwraps_data() {
        let (client, transport, notifier) =
            client(ScriptedTransport::replying(vec![reply(200, r#"{"code":200,"data":[{"id":1}]}"#)]));

        let data = client.fetch("/movie/list", &json!({"page": 1})).await.unwrap();

        assert_eq!(data, json!([{"id": 1}]));
        assert!(notifier.messages().is_empty());
        let sent = transport.seen();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].url, "http://localhost:8080/api/movie/list?page=1");
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn create_posts_json_body() {
        let (client, transport, _) = client(ScriptedTransport::replying(vec![reply(200, r#"{"code":200,"data":true}"#)]));

        let data = client
            .create("/movie/collect", &json!({"userId": 2, "movieId": 1}))
            .await
            .unwrap();

        assert_eq!(data, json!(true));
        let sent = transport.seen();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].url, "http://localhost:8080/api/movie/collect");
        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"userId": 2, "movieId": 1}));
    }

    #[tokio::test]
    async fn replace_and_remove_use_put_and_delete() {
        let (client, transport, _) = client(ScriptedTransport::replying(vec![
            reply(200, r#"{"code":200,"data":{"id":3}}"#),
            reply(200, r#"{"code":200,"data":null}"#),
        ]));

        client.replace("/movies/3", &json!({"title": "活着"})).await.unwrap();
        client.remove("/movies/3", &()).await.unwrap();

        let sent = transport.seen();
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert!(sent[0].body.is_some());
        assert_eq!(sent[1].method, HttpMethod::Delete);
        assert_eq!(sent[1].url, "http://localhost:8080/api/movies/3");
        assert!(sent[1].body.is_none());
    }

    #[tokio::test]
    async fn every_request_carries_only_the_content_type() {
        let (client, transport, _) = client(ScriptedTransport::replying(vec![reply(200, r#"{"code":200}"#)]));

        client.fetch("/movie/list", &()).await.unwrap();

        assert_eq!(
            transport.seen()[0].headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[tokio::test]
    async fn domain_failure_notifies_once_with_envelope_message() {
        let (client, _, notifier) = client(ScriptedTransport::replying(vec![reply(
            200,
            r#"{"code":401,"message":"用户名或密码错误","data":null}"#,
        )]));

        let err = client
            .create("/auth/login", &json!({"username": "x", "password": "y"}))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::DomainFailure);
        assert_eq!(err.message, "用户名或密码错误");
        assert_eq!(notifier.messages(), vec!["用户名或密码错误".to_string()]);
    }

    #[tokio::test]
    async fn forbidden_with_empty_body() {
        let (client, _, notifier) = client(ScriptedTransport::replying(vec![reply(403, "")]));

        let err = client.fetch("/admin/users", &()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::TransportFailure);
        assert_eq!(err.status, Some(403));
        assert_eq!(err.message, MSG_FORBIDDEN);
        assert_eq!(notifier.messages(), vec![MSG_FORBIDDEN.to_string()]);
    }

    #[tokio::test]
    async fn unreachable_server_is_network_failure() {
        let (client, _, notifier) = client(ScriptedTransport::replying(vec![Err(TransportError::Unreachable(
            "connection refused".into(),
        ))]));

        let err = client.fetch("/movie/list", &()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NetworkFailure);
        assert_eq!(err.message, MSG_NO_RESPONSE);
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_server_times_out_after_fifteen_seconds() {
        let transport = ScriptedTransport {
            delay: Some(Duration::from_secs(20)),
            ..ScriptedTransport::replying(vec![reply(200, r#"{"code":200}"#)])
        };
        let (client, _, notifier) = client(transport);

        let started = tokio::time::Instant::now();
        let err = client.fetch("/movie/list", &()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NetworkFailure);
        assert!(matches!(err.raw, RawFailure::Transport(TransportError::Timeout)));
        assert!(started.elapsed() >= Duration::from_millis(15_000));
        assert!(started.elapsed() < Duration::from_secs(20));
        assert_eq!(notifier.messages(), vec![MSG_NO_RESPONSE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn response_just_under_timeout_succeeds() {
        let transport = ScriptedTransport {
            delay: Some(Duration::from_millis(14_999)),
            ..ScriptedTransport::replying(vec![reply(200, r#"{"code":200,"data":1}"#)])
        };
        let (client, _, _) = client(transport);

        assert_eq!(client.fetch("/movie/list", &()).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn bad_path_fails_before_any_io() {
        let (client, transport, notifier) = client(ScriptedTransport::default());

        let err = client.create("", &json!({})).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::UnknownFailure);
        assert_eq!(err.message, MSG_GENERIC);
        assert!(matches!(err.raw, RawFailure::Request(RequestError::EmptyPath)));
        assert!(transport.seen().is_empty());
        assert_eq!(notifier.messages(), vec![MSG_GENERIC.to_string()]);
    }

    #[tokio::test]
    async fn non_object_params_fail_before_any_io() {
        let (client, transport, _) = client(ScriptedTransport::default());

        let err = client.fetch("/movie/list", &[1, 2, 3]).await.unwrap_err();

        assert!(matches!(err.raw, RawFailure::Request(RequestError::ParamsNotObject("array"))));
        assert!(transport.seen().is_empty());
    }

    #[tokio::test]
    async fn repeated_reads_are_not_cached() {
        let (client, transport, notifier) = client(ScriptedTransport::replying(vec![
            reply(200, r#"{"code":200,"data":[{"id":1}]}"#),
            reply(500, ""),
        ]));

        let first = client.fetch("/movie/list", &json!({"page": 1})).await;
        let second = client.fetch("/movie/list", &json!({"page": 1})).await;

        assert_eq!(first.unwrap(), json!([{"id": 1}]));
        assert_eq!(second.unwrap_err().status, Some(500));
        assert_eq!(transport.seen().len(), 2);
        assert_eq!(notifier.messages().len(), 1);
    }

    #[test]
    fn query_payload_flattens_fields() {
        let payload = Payload::query(&json!({
            "page": 2,
            "keyword": "子弹",
            "free": true,
            "skip": null,
            "ids": [1, 2],
        }))
        .unwrap();
        let Payload::Query(pairs) = payload else {
            panic!("expected query payload");
        };
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert!(pairs.contains(&("page", "2")));
        assert!(pairs.contains(&("keyword", "子弹")));
        assert!(pairs.contains(&("free", "true")));
        assert!(pairs.contains(&("ids", "1")));
        assert!(pairs.contains(&("ids", "2")));
        assert!(!pairs.iter().any(|(k, _)| *k == "skip"));
    }

    #[test]
    fn unit_params_mean_no_query() {
        assert_eq!(Payload::query(&()).unwrap(), Payload::Query(Vec::new()));
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let (client, _, _) = client(ScriptedTransport::default());
        let payload = Payload::query(&json!({"keyword": "a b&c"})).unwrap();
        let request = client.build_request(HttpMethod::Get, "/movie/list", payload).unwrap();
        assert_eq!(request.url, "http://localhost:8080/api/movie/list?keyword=a+b%26c");
    }
}
