//! Client Models
//!
//! Data structures matching the service's JSON representations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::Resource;

// ========================
// Users
// ========================

/// The authenticated account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    pub created_at: String,
}

/// Short user representation embedded in tasks and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u32,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// ========================
// Projects
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: u32,
    pub created_at: String,
}

impl Resource for Project {
    fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ========================
// Tasks
// ========================

/// Workflow column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<i32>,
    pub due_date: Option<String>,
    pub project_id: u32,
    pub assignee_id: Option<u32>,
    pub created_by: u32,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub assignee: Option<UserSummary>,
    /// Only populated on the focused task, see `TaskStore::fetch_comments`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl Resource for Task {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Task {
    /// The task as it may appear in a list: without embedded comments
    pub fn into_list_entry(mut self) -> Self {
        self.comments = None;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub project_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u32>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, project_id: u32) -> Self {
        Self {
            title: title.into(),
            project_id,
            description: None,
            status: None,
            priority: None,
            due_date: None,
            assignee_id: None,
        }
    }
}

/// Partial task update.
///
/// For nullable fields the outer `Option` decides whether the field is sent,
/// the inner one whether it is set or cleared (`Some(None)` sends `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<u32>>,
}

impl TaskChanges {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Server-side equality filters for the task list; `None` means unconstrained
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskFilters {
    pub project_id: Option<u32>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<u32>,
}

impl TaskFilters {
    pub fn for_project(project_id: u32) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    /// Query pairs for the filters that are present
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(project_id) = self.project_id {
            query.push(("project_id", project_id.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(assignee_id) = self.assignee_id {
            query.push(("assignee_id", assignee_id.to_string()));
        }
        query
    }
}

// ========================
// Comments
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u32,
    pub content: String,
    pub task_id: u32,
    pub user_id: u32,
    pub created_at: String,
    #[serde(default)]
    pub author: Option<UserSummary>,
}
