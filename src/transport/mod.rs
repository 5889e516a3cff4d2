//! Transport Layer - Core Trait
//!
//! The store layer talks to the service through [`Transport`] only.
//! [`HttpTransport`] is the production implementation; tests script their own.

mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;

/// Common result type for service calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Uniform failure raised by every transport verb
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-2xx status
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },

    /// The response body did not match the expected shape
    #[error("Parse error: {0}")]
    Decode(String),

    /// The request body could not be serialized
    #[error("Serialization error: {0}")]
    Encode(String),
}

impl ApiError {
    /// Human-readable message supplied by the service, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message for store error slots: the detail, or `fallback`
    pub fn message_or(&self, fallback: &str) -> String {
        self.detail()
            .filter(|detail| !detail.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Pull the `detail` out of an error body.
///
/// A plain string is used as-is; a validation list contributes the `msg` of
/// each entry.
pub fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Authenticated JSON verbs relative to the API root.
///
/// Implementations attach the current access credential to every call and
/// return `Value::Null` for empty bodies.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value>;

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value>;

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value>;

    async fn delete(&self, path: &str) -> ApiResult<Value>;
}
