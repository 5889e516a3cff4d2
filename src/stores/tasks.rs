//! Task Store
//!
//! Same list/focus rules as the project store, plus the comment thread of
//! the focused task.

use std::sync::Arc;

use leptos::prelude::*;
use reactive_stores::Store;

use crate::commands;
use crate::models::{Comment, Task, TaskChanges, TaskDraft, TaskFilters};
use crate::store::{
    append_unique, clear_focus_if, focus_is, remove_by_id, replace_by_id, replace_focus, PendingGuard,
};
use crate::transport::{ApiError, ApiResult, Transport};

#[derive(Clone, Debug, Default, Store)]
pub struct TaskState {
    /// Last fetched task list; entries never carry comments
    pub items: Vec<Task>,
    /// Task being viewed, with its comments once fetched
    pub focus: Option<Task>,
    pub pending: bool,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct TaskStore {
    state: Store<TaskState>,
    transport: Arc<dyn Transport>,
}

impl TaskStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            state: Store::new(TaskState::default()),
            transport,
        }
    }

    /// Reactive handle for views; the accessors below are untracked snapshots
    pub fn state(&self) -> Store<TaskState> {
        self.state
    }

    pub fn items(&self) -> Vec<Task> {
        self.state.items().get_untracked()
    }

    pub fn focus(&self) -> Option<Task> {
        self.state.focus().get_untracked()
    }

    pub fn pending(&self) -> bool {
        self.state.pending().get_untracked()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.last_error().get_untracked()
    }

    fn begin(&self) -> PendingGuard<impl FnOnce()> {
        let state = self.state;
        *state.pending().write() = true;
        *state.last_error().write() = None;
        PendingGuard::new(move || *state.pending().write() = false)
    }

    fn fail(&self, err: ApiError, fallback: &str) -> ApiError {
        let message = err.message_or(fallback);
        log::warn!("[tasks] {}: {}", message, err);
        *self.state.last_error().write() = Some(message);
        err
    }

    fn focus_holds(&self, task_id: u32) -> bool {
        self.state.focus().with_untracked(|focus| focus_is(focus, task_id))
    }

    /// Replace the list with the tasks matching `filters`
    pub async fn fetch_all(&self, filters: &TaskFilters) -> ApiResult<Vec<Task>> {
        let _pending = self.begin();
        let tasks = commands::list_tasks(self.transport.as_ref(), filters)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch tasks"))?;
        log::debug!("[tasks] fetched {} tasks ({:?})", tasks.len(), filters);

        let tasks: Vec<Task> = tasks.into_iter().map(Task::into_list_entry).collect();
        *self.state.items().write() = tasks.clone();
        Ok(tasks)
    }

    pub async fn fetch_by_id(&self, id: u32) -> ApiResult<Task> {
        let _pending = self.begin();
        let task = commands::get_task(self.transport.as_ref(), id)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch task"))?;
        *self.state.focus().write() = Some(task.clone());
        Ok(task)
    }

    pub async fn create(&self, draft: &TaskDraft) -> ApiResult<Task> {
        let _pending = self.begin();
        let task = commands::create_task(self.transport.as_ref(), draft)
            .await
            .map_err(|e| self.fail(e, "Failed to create task"))?;
        append_unique(&mut *self.state.items().write(), task.clone().into_list_entry());
        Ok(task)
    }

    /// Apply a partial update.
    ///
    /// The focus takes the server response as returned, so comments fetched
    /// earlier are dropped unless the server embeds them.
    pub async fn update(&self, id: u32, changes: &TaskChanges) -> ApiResult<Task> {
        let _pending = self.begin();
        let task = commands::update_task(self.transport.as_ref(), id, changes)
            .await
            .map_err(|e| self.fail(e, "Failed to update task"))?;

        let entry = task.clone().into_list_entry();
        if !replace_by_id(&mut *self.state.items().write(), &entry) {
            log::debug!("[tasks] updated task {} is not listed", id);
        }
        if self.focus_holds(id) {
            replace_focus(&mut *self.state.focus().write(), &task);
        }
        Ok(task)
    }

    pub async fn delete(&self, id: u32) -> ApiResult<()> {
        let _pending = self.begin();
        commands::delete_task(self.transport.as_ref(), id)
            .await
            .map_err(|e| self.fail(e, "Failed to delete task"))?;

        remove_by_id(&mut *self.state.items().write(), id);
        if self.focus_holds(id) {
            clear_focus_if(&mut *self.state.focus().write(), id);
        }
        Ok(())
    }

    /// Post a comment; it is appended to the focused task's thread when that
    /// task is `task_id`
    pub async fn add_comment(&self, task_id: u32, content: &str) -> ApiResult<Comment> {
        let _pending = self.begin();
        let comment = commands::add_comment(self.transport.as_ref(), task_id, content)
            .await
            .map_err(|e| self.fail(e, "Failed to add comment"))?;

        if self.focus_holds(task_id) {
            if let Some(task) = self.state.focus().write().as_mut() {
                task.comments.get_or_insert_with(Vec::new).push(comment.clone());
            }
        }
        Ok(comment)
    }

    /// Fetch the whole thread; replaces the focused task's comments when that
    /// task is `task_id`
    pub async fn fetch_comments(&self, task_id: u32) -> ApiResult<Vec<Comment>> {
        let _pending = self.begin();
        let comments = commands::list_comments(self.transport.as_ref(), task_id)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch comments"))?;
        log::debug!("[tasks] fetched {} comments for task {}", comments.len(), task_id);

        if self.focus_holds(task_id) {
            if let Some(task) = self.state.focus().write().as_mut() {
                task.comments = Some(comments.clone());
            }
        }
        Ok(comments)
    }
}
