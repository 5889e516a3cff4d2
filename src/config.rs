//! Client Configuration
//!
//! Values come from `TASKBOARD_*` environment variables with per-field
//! defaults. Unparsable values fall back to the default as well.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const APP_NAME: &str = "taskboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root every API path is joined onto
    pub api_root: String,
    pub request_timeout_secs: u64,
    /// JSON file holding the persisted tokens
    pub credentials_path: PathBuf,
    pub log_dir: PathBuf,
    pub app_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            credentials_path: data_dir.join("credentials.json"),
            log_dir: data_dir.join("logs"),
            app_name: APP_NAME.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_root: lookup("TASKBOARD_API_ROOT")
                .filter(|root| !root.trim().is_empty())
                .unwrap_or(defaults.api_root),
            request_timeout_secs: lookup("TASKBOARD_TIMEOUT_SECS")
                .and_then(|secs| secs.trim().parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            credentials_path: lookup("TASKBOARD_CREDENTIALS")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_path),
            log_dir: lookup("TASKBOARD_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            app_name: defaults.app_name,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_NAME))
}
