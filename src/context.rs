//! Application Context
//!
//! One store per resource type over a shared transport, provided via the
//! Leptos Context API.

use std::sync::Arc;

use leptos::prelude::*;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::navigation::Navigator;
use crate::storage::{CredentialStorage, FileStorage, StorageError};
use crate::stores::{ProjectStore, SessionStore, TaskStore};
use crate::transport::{ApiError, HttpTransport, Transport};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Credential storage unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] ApiError),
}

/// The stores of one session, built once and handed to consumers
#[derive(Clone)]
pub struct AppContext {
    pub session: SessionStore,
    pub projects: ProjectStore,
    pub tasks: TaskStore,
}

impl AppContext {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session: SessionStore::new(transport.clone(), credentials, navigator),
            projects: ProjectStore::new(transport.clone()),
            tasks: TaskStore::new(transport),
        }
    }

    /// HTTP transport and file-backed credentials as configured
    pub fn from_config(config: &ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, SetupError> {
        let credentials: Arc<dyn CredentialStorage> = Arc::new(FileStorage::open(&config.credentials_path)?);
        let transport = HttpTransport::new(config, credentials.clone())?;
        log::info!("[context] api root {}", transport.api_root());
        Ok(Self::new(Arc::new(transport), credentials, navigator))
    }
}

pub fn provide_app_context(context: AppContext) {
    provide_context(context);
}

/// Get the app context from the reactive owner
pub fn use_app_context() -> AppContext {
    expect_context::<AppContext>()
}
