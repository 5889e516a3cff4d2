//! Project Store
//!
//! CRUD over projects with a list and a focused project.

use std::sync::Arc;

use leptos::prelude::*;
use reactive_stores::Store;

use crate::commands;
use crate::models::{Project, ProjectChanges, ProjectDraft};
use crate::store::{
    append_unique, clear_focus_if, focus_is, remove_by_id, replace_by_id, replace_focus, PendingGuard,
};
use crate::transport::{ApiError, ApiResult, Transport};

#[derive(Clone, Debug, Default, Store)]
pub struct ProjectState {
    /// Projects in server order
    pub items: Vec<Project>,
    /// Project currently being viewed or edited
    pub focus: Option<Project>,
    pub pending: bool,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct ProjectStore {
    state: Store<ProjectState>,
    transport: Arc<dyn Transport>,
}

impl ProjectStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            state: Store::new(ProjectState::default()),
            transport,
        }
    }

    /// Reactive handle for views; the accessors below are untracked snapshots
    pub fn state(&self) -> Store<ProjectState> {
        self.state
    }

    pub fn items(&self) -> Vec<Project> {
        self.state.items().get_untracked()
    }

    pub fn focus(&self) -> Option<Project> {
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
        log::warn!("[projects] {}: {}", message, err);
        *self.state.last_error().write() = Some(message);
        err
    }

    /// Replace the list with the server's full list
    pub async fn fetch_all(&self) -> ApiResult<Vec<Project>> {
        let _pending = self.begin();
        let projects = commands::list_projects(self.transport.as_ref())
            .await
            .map_err(|e| self.fail(e, "Failed to fetch projects"))?;
        log::debug!("[projects] fetched {} projects", projects.len());
        *self.state.items().write() = projects.clone();
        Ok(projects)
    }

    /// Load one project into the focus slot
    pub async fn fetch_by_id(&self, id: u32) -> ApiResult<Project> {
        let _pending = self.begin();
        let project = commands::get_project(self.transport.as_ref(), id)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch project"))?;
        *self.state.focus().write() = Some(project.clone());
        Ok(project)
    }

    pub async fn create(&self, draft: &ProjectDraft) -> ApiResult<Project> {
        let _pending = self.begin();
        let project = commands::create_project(self.transport.as_ref(), draft)
            .await
            .map_err(|e| self.fail(e, "Failed to create project"))?;
        append_unique(&mut *self.state.items().write(), project.clone());
        Ok(project)
    }

    /// Apply a partial update; the list entry keeps its position.
    ///
    /// An ID missing from the list is not inserted.
    pub async fn update(&self, id: u32, changes: &ProjectChanges) -> ApiResult<Project> {
        let _pending = self.begin();
        let project = commands::update_project(self.transport.as_ref(), id, changes)
            .await
            .map_err(|e| self.fail(e, "Failed to update project"))?;

        if !replace_by_id(&mut *self.state.items().write(), &project) {
            log::debug!("[projects] updated project {} is not listed", id);
        }
        let holds_project = self.state.focus().with_untracked(|focus| focus_is(focus, id));
        if holds_project {
            replace_focus(&mut *self.state.focus().write(), &project);
        }
        Ok(project)
    }

    pub async fn delete(&self, id: u32) -> ApiResult<()> {
        let _pending = self.begin();
        commands::delete_project(self.transport.as_ref(), id)
            .await
            .map_err(|e| self.fail(e, "Failed to delete project"))?;

        remove_by_id(&mut *self.state.items().write(), id);
        let holds_project = self.state.focus().with_untracked(|focus| focus_is(focus, id));
        if holds_project {
            clear_focus_if(&mut *self.state.focus().write(), id);
        }
        Ok(())
    }
}
