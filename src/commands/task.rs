//! Task Commands
//!
//! Task CRUD plus the nested comment endpoints.

use serde::Serialize;

use super::{decode, encode, API_PREFIX};
use crate::models::{Comment, Task, TaskChanges, TaskDraft, TaskFilters};
use crate::transport::{ApiResult, Transport};

#[derive(Serialize)]
struct CommentArgs<'a> {
    content: &'a str,
}

fn tasks_path() -> String {
    format!("{}/tasks", API_PREFIX)
}

fn task_path(id: u32) -> String {
    format!("{}/tasks/{}", API_PREFIX, id)
}

fn comments_path(task_id: u32) -> String {
    format!("{}/tasks/{}/comments", API_PREFIX, task_id)
}

/// List tasks; filtering happens on the server
pub async fn list_tasks(transport: &dyn Transport, filters: &TaskFilters) -> ApiResult<Vec<Task>> {
    let query = filters.to_query();
    let result = transport.get(&tasks_path(), &query).await?;
    decode(result)
}

pub async fn get_task(transport: &dyn Transport, id: u32) -> ApiResult<Task> {
    let result = transport.get(&task_path(id), &[]).await?;
    decode(result)
}

pub async fn create_task(transport: &dyn Transport, draft: &TaskDraft) -> ApiResult<Task> {
    let result = transport.post(&tasks_path(), encode(draft)?).await?;
    decode(result)
}

pub async fn update_task(transport: &dyn Transport, id: u32, changes: &TaskChanges) -> ApiResult<Task> {
    let result = transport.put(&task_path(id), encode(changes)?).await?;
    decode(result)
}

pub async fn delete_task(transport: &dyn Transport, id: u32) -> ApiResult<()> {
    transport.delete(&task_path(id)).await?;
    Ok(())
}

pub async fn list_comments(transport: &dyn Transport, task_id: u32) -> ApiResult<Vec<Comment>> {
    let result = transport.get(&comments_path(task_id), &[]).await?;
    decode(result)
}

pub async fn add_comment(transport: &dyn Transport, task_id: u32, content: &str) -> ApiResult<Comment> {
    let body = encode(&CommentArgs { content })?;
    let result = transport.post(&comments_path(task_id), body).await?;
    decode(result)
}
