//! Auth Commands
//!
//! Credential exchange, registration and the current-user profile.

use serde::Serialize;

use super::{decode, encode, API_PREFIX};
use crate::models::{ProfileChanges, TokenPair, User};
use crate::transport::{ApiResult, Transport};

// ========================
// Argument Structs
// ========================

#[derive(Serialize)]
struct LoginArgs<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterArgs<'a> {
    email: &'a str,
    password: &'a str,
    full_name: &'a str,
}

// ========================
// Commands
// ========================

pub async fn login(transport: &dyn Transport, email: &str, password: &str) -> ApiResult<TokenPair> {
    let body = encode(&LoginArgs { username: email, password })?;
    let result = transport.post(&format!("{}/auth/login", API_PREFIX), body).await?;
    decode(result)
}

pub async fn register(
    transport: &dyn Transport,
    email: &str,
    password: &str,
    full_name: &str,
) -> ApiResult<User> {
    let body = encode(&RegisterArgs { email, password, full_name })?;
    let result = transport.post(&format!("{}/auth/register", API_PREFIX), body).await?;
    decode(result)
}

/// Who am I
pub async fn current_user(transport: &dyn Transport) -> ApiResult<User> {
    let result = transport.get(&format!("{}/users/me", API_PREFIX), &[]).await?;
    decode(result)
}

pub async fn update_current_user(transport: &dyn Transport, changes: &ProfileChanges) -> ApiResult<User> {
    let body = encode(changes)?;
    let result = transport.put(&format!("{}/users/me", API_PREFIX), body).await?;
    decode(result)
}
