//! Taskboard Client Core
//!
//! Cache-and-mutation layer over the taskboard REST service: session,
//! project and task stores sharing one authenticated transport.

pub mod commands;
pub mod config;
pub mod context;
pub mod models;
pub mod navigation;
pub mod storage;
pub mod store;
pub mod stores;
pub mod transport;

#[cfg(test)]
mod testing;

pub use context::{provide_app_context, use_app_context, AppContext, SetupError};
