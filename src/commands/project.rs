//! Project Commands

use super::{decode, encode, API_PREFIX};
use crate::models::{Project, ProjectChanges, ProjectDraft};
use crate::transport::{ApiResult, Transport};

fn projects_path() -> String {
    format!("{}/projects", API_PREFIX)
}

fn project_path(id: u32) -> String {
    format!("{}/projects/{}", API_PREFIX, id)
}

pub async fn list_projects(transport: &dyn Transport) -> ApiResult<Vec<Project>> {
    let result = transport.get(&projects_path(), &[]).await?;
    decode(result)
}

pub async fn get_project(transport: &dyn Transport, id: u32) -> ApiResult<Project> {
    let result = transport.get(&project_path(id), &[]).await?;
    decode(result)
}

pub async fn create_project(transport: &dyn Transport, draft: &ProjectDraft) -> ApiResult<Project> {
    let result = transport.post(&projects_path(), encode(draft)?).await?;
    decode(result)
}

pub async fn update_project(
    transport: &dyn Transport,
    id: u32,
    changes: &ProjectChanges,
) -> ApiResult<Project> {
    let result = transport.put(&project_path(id), encode(changes)?).await?;
    decode(result)
}

pub async fn delete_project(transport: &dyn Transport, id: u32) -> ApiResult<()> {
    // Result is empty (204) on success
    transport.delete(&project_path(id)).await?;
    Ok(())
}
