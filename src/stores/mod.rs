//! Resource Stores
//!
//! One store per resource type. Each keeps its state in a reactive store
//! and talks to the service through the shared transport.

mod projects;
mod session;
mod tasks;

pub use projects::*;
pub use session::*;
pub use tasks::*;
