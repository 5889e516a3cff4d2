//! Service Endpoint Bindings
//!
//! Typed wrappers over the transport verbs, organized by domain.

mod auth;
mod project;
mod task;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::transport::{ApiError, ApiResult};

/// Prefix shared by every endpoint path
pub const API_PREFIX: &str = "/api/v1";

fn encode<T: Serialize + ?Sized>(args: &T) -> ApiResult<Value> {
    serde_json::to_value(args).map_err(|e| ApiError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

// Re-export all public items
pub use auth::*;
pub use project::*;
pub use task::*;
