//! The backend's response envelope and the rules that turn a round trip into
//! either the envelope's `data` or a `ClientError`.
//!
//! # Design
//! A finished round trip is first folded into an `Exchange`, a tagged value
//! naming which shape came back. `classify` is then a single ordered `match`
//! over that tag: a received envelope is checked before the HTTP status, and
//! the status before the no-response case. The compiler checks the match is
//! exhaustive, so adding a shape forces a decision about its message.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::{ClientError, RawFailure};
use crate::http::{HttpResponse, TransportError};

/// Envelope code that marks success. Any other code is a domain failure.
pub const SUCCESS_CODE: i64 = 200;

pub const MSG_BAD_REQUEST: &str = "请求参数错误";
pub const MSG_UNAUTHORIZED: &str = "未授权，请重新登录";
pub const MSG_FORBIDDEN: &str = "没有权限执行此操作";
pub const MSG_NOT_FOUND: &str = "请求的资源不存在";
pub const MSG_SERVER_ERROR: &str = "服务器内部错误";
pub const MSG_NO_RESPONSE: &str = "服务器无响应，请检查网络连接";
pub const MSG_GENERIC: &str = "请求失败，请稍后再试";

/// `{ code, message, data }`, the shape of every backend response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(deserialize_with = "integral_code")]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// Accepts `200` and `200.0` alike; a fractional code is not an envelope.
fn integral_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    if let Some(code) = number.as_i64() {
        return Ok(code);
    }
    match number.as_f64() {
        Some(code) if code.fract() == 0.0 && code.abs() < i64::MAX as f64 => Ok(code as i64),
        _ => Err(serde::de::Error::custom(format!("envelope code {number} is not an integer"))),
    }
}

/// What came back from one round trip.
#[derive(Debug, Clone)]
pub enum Exchange {
    /// 2xx with an envelope whose code is 200.
    Success(Envelope),
    /// 2xx with an envelope whose code is anything else.
    Rejected(Envelope),
    /// A response arrived but it was non-2xx or its body was not an envelope.
    ErrorResponse(HttpResponse),
    /// The request went out and nothing came back.
    NoResponse(TransportError),
    /// A failure that never reached the wire or has no recognizable shape.
    Unclassified(RawFailure),
}

impl Exchange {
    pub fn from_response(response: HttpResponse) -> Self {
        if !response.is_success() {
            return Exchange::ErrorResponse(response);
        }
        match serde_json::from_str::<Envelope>(&response.body) {
            Ok(envelope) if envelope.is_success() => Exchange::Success(envelope),
            Ok(envelope) => Exchange::Rejected(envelope),
            Err(_) => Exchange::ErrorResponse(response),
        }
    }

    pub fn from_transport_error(error: TransportError) -> Self {
        if error.is_no_response() {
            Exchange::NoResponse(error)
        } else {
            Exchange::Unclassified(RawFailure::Transport(error))
        }
    }
}

impl From<Result<HttpResponse, TransportError>> for Exchange {
    fn from(result: Result<HttpResponse, TransportError>) -> Self {
        match result {
            Ok(response) => Exchange::from_response(response),
            Err(error) => Exchange::from_transport_error(error),
        }
    }
}

/// Resolves an exchange to the envelope's `data` or the caller-facing error.
pub fn classify(exchange: Exchange) -> Result<Value, ClientError> {
    match exchange {
        Exchange::Success(envelope) => Ok(envelope.data),
        Exchange::Rejected(envelope) => {
            let message = non_empty(envelope.message.as_deref())
                .unwrap_or(MSG_GENERIC)
                .to_string();
            Err(ClientError::domain(envelope, message))
        }
        Exchange::ErrorResponse(response) => {
            let message = body_message(&response.body)
                .unwrap_or_else(|| status_message(response.status));
            Err(ClientError::transport(response, message))
        }
        Exchange::NoResponse(error) => Err(ClientError::network(error, MSG_NO_RESPONSE.to_string())),
        Exchange::Unclassified(raw) => Err(ClientError::unknown(raw, MSG_GENERIC.to_string())),
    }
}

/// Fallback message for a response whose body carries none.
pub fn status_message(status: u16) -> String {
    match status {
        400 => MSG_BAD_REQUEST.to_string(),
        401 => MSG_UNAUTHORIZED.to_string(),
        403 => MSG_FORBIDDEN.to_string(),
        404 => MSG_NOT_FOUND.to_string(),
        500 => MSG_SERVER_ERROR.to_string(),
        other => format!("请求失败({other})"),
    }
}

/// A `message` field from an error body, when the body is JSON and has one.
fn body_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    non_empty(value.get("message")?.as_str()).map(str::to_string)
}

fn non_empty(message: Option<&str>) -> Option<&str> {
    message.filter(|m| !m.is_empty())
}
