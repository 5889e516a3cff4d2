//! Taskboard Snapshot
//!
//! Headless host for the client stores: restores (or opens) a session and
//! prints a per-project status summary.

use std::process::ExitCode;
use std::sync::Arc;

use taskboard_ui::config::ClientConfig;
use taskboard_ui::models::{Project, Task, TaskFilters, TaskStatus};
use taskboard_ui::navigation::LogNavigator;
use taskboard_ui::AppContext;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ClientConfig::from_env();

    let logger = match rolling_logger::init_logger(&config.log_dir, &config.app_name) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    let context = match AppContext::from_config(&config, Arc::new(LogNavigator)) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = run(&context).await;
    if let Some(handle) = logger {
        log::debug!("log written to {}", handle.log_path().display());
    }
    code
}

async fn run(context: &AppContext) -> ExitCode {
    let session = &context.session;

    if let Err(e) = session.initialize().await {
        eprintln!("Stored session rejected: {}", e);
    }

    if !session.is_authenticated() {
        let (Ok(email), Ok(password)) = (
            std::env::var("TASKBOARD_EMAIL"),
            std::env::var("TASKBOARD_PASSWORD"),
        ) else {
            eprintln!("Not signed in. Set TASKBOARD_EMAIL and TASKBOARD_PASSWORD.");
            return ExitCode::FAILURE;
        };
        if !session.login(&email, &password).await {
            let reason = session.last_error().unwrap_or_default();
            eprintln!("Login failed: {}", reason);
            return ExitCode::FAILURE;
        }
    }

    if let Some(user) = session.user() {
        println!("Signed in as {} <{}>", user.full_name, user.email);
    }

    let projects = match context.projects.fetch_all().await {
        Ok(projects) => projects,
        Err(e) => {
            eprintln!("{}", context.projects.last_error().unwrap_or_else(|| e.to_string()));
            return ExitCode::FAILURE;
        }
    };
    let tasks = match context.tasks.fetch_all(&TaskFilters::default()).await {
        Ok(tasks) => tasks,
        Err(e) => {
            eprintln!("{}", context.tasks.last_error().unwrap_or_else(|| e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    print_summary(&projects, &tasks);
    ExitCode::SUCCESS
}

fn print_summary(projects: &[Project], tasks: &[Task]) {
    if projects.is_empty() {
        println!("No projects.");
        return;
    }
    for project in projects {
        let counts: Vec<String> = TaskStatus::ALL
            .iter()
            .map(|status| {
                let count = tasks
                    .iter()
                    .filter(|t| t.project_id == project.id && t.status == *status)
                    .count();
                format!("{} {}", status, count)
            })
            .collect();
        println!("#{} {}: {}", project.id, project.name, counts.join(", "));
    }
}
