//! HTTP Transport
//!
//! `reqwest`-backed [`Transport`] with bearer credential injection.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::{extract_detail, ApiError, ApiResult, Transport};
use crate::config::ClientConfig;
use crate::storage::{CredentialStorage, ACCESS_TOKEN_KEY};

/// Transport over a fixed API root.
///
/// The access token is read from the credential storage on every call, so a
/// login or logout takes effect on the next request without rebuilding the
/// client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    api_root: String,
    credentials: Arc<dyn CredentialStorage>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStorage>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Network(format!("Client build error: {}", e)))?;
        Ok(Self {
            client,
            api_root: config.api_root.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.api_root, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.get(ACCESS_TOKEN_KEY) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, method: &str, path: &str, request: RequestBuilder) -> ApiResult<Value> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .as_ref()
                .and_then(extract_detail);
            log::warn!("{} {} -> HTTP {} ({:?})", method, path, status.as_u16(), detail);
            return Err(ApiError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        log::debug!("{} {} -> HTTP {}", method, path, status.as_u16());
        decode_body(&bytes)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let request = self.client.get(self.url(path)).query(query);
        self.send("GET", path, request).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        let request = self.client.post(self.url(path)).json(&body);
        self.send("POST", path, request).await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        let request = self.client.put(self.url(path)).json(&body);
        self.send("PUT", path, request).await
    }

    async fn delete(&self, path: &str) -> ApiResult<Value> {
        let request = self.client.delete(self.url(path));
        self.send("DELETE", path, request).await
    }
}

fn join_url(api_root: &str, path: &str) -> String {
    format!(
        "{}/{}",
        api_root.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Parse a success body; empty bodies (204) become `Null`
fn decode_body(bytes: &[u8]) -> ApiResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
