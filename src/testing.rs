//! Test doubles for the store layer.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::transport::{ApiError, ApiResult, Transport};

/// One request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Transport answering from per-route FIFO scripts.
///
/// Unscripted routes fail with a network error, like an unreachable server.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<(&'static str, String), VecDeque<ApiResult<Value>>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: &'static str, path: &str, response: ApiResult<Value>) {
        self.scripts
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn ok(&self, method: &'static str, path: &str, body: Value) {
        self.respond(method, path, Ok(body));
    }

    pub fn fail(&self, method: &'static str, path: &str, status: u16, detail: Option<&str>) {
        self.respond(
            method,
            path,
            Err(ApiError::Server {
                status,
                detail: detail.map(str::to_string),
            }),
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(
        &self,
        method: &'static str,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            query,
            body,
        });
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ApiError::Network(format!("no route to {} {}", method, path))))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.answer("GET", path, query, None)
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.answer("POST", path, Vec::new(), Some(body))
    }

    async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.answer("PUT", path, Vec::new(), Some(body))
    }

    async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.answer("DELETE", path, Vec::new(), None)
    }
}

// ========================
// Fixtures
// ========================

pub fn user_json(id: u32, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "full_name": "Ada Lovelace",
        "is_active": true,
        "created_at": "2024-01-01T00:00:00"
    })
}

pub fn project_json(id: u32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "owner_id": 1,
        "created_at": "2024-01-01T00:00:00"
    })
}

pub fn task_json(id: u32, status: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Task {}", id),
        "description": null,
        "status": status,
        "priority": null,
        "due_date": null,
        "project_id": 1,
        "assignee_id": null,
        "created_by": 1,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": null
    })
}

pub fn comment_json(id: u32, task_id: u32, content: &str) -> Value {
    json!({
        "id": id,
        "content": content,
        "task_id": task_id,
        "user_id": 1,
        "created_at": "2024-01-02T00:00:00",
        "author": { "id": 1, "email": "a@b.com", "full_name": "Ada Lovelace" }
    })
}
