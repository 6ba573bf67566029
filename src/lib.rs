//! ContentFlow - Content Pipeline Workflow Executor
//!
//! Runs a fixed fetch → classify → transform → publish pipeline with a
//! deadline on every step. A failed or timed-out step is recorded and the
//! run continues with the best input still available, so one degraded
//! stage never loses the whole run.
//!
//! # Architecture
//!
//! - [`workflow`]: Run requests, run records and the status store
//! - [`execution`]: Executor, per-step runner and the scheduler entry point
//! - [`content`]: Collaborator traits and the bundled implementations
//! - [`server`]: HTTP surface for starting and polling runs
//! - [`monitoring`]: Run timeline reports
//! - [`config`]: Layered process settings
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use contentflow::config::Settings;
//! use contentflow::execution::WorkflowExecutor;
//! use contentflow::workflow::{RunRequest, StatusStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(None)?;
//!     let executor = WorkflowExecutor::new(
//!         Arc::new(StatusStore::new()),
//!         settings.collaborators(),
//!         settings.executor_options(),
//!     );
//!
//!     let record = executor.run_sync(RunRequest::new("acct1").with_item_count(3)).await?;
//!     println!("{}: {} steps", record.overall_status, record.steps.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod execution;
pub mod monitoring;
pub mod server;
pub mod workflow;

// Re-export commonly used types
pub use config::Settings;
pub use error::{ConfigError, WorkflowError};
pub use execution::WorkflowExecutor;
pub use workflow::{RunRecord, RunRequest, RunStatus, StatusStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ContentFlow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "ContentFlow");
    }

    #[test]
    fn test_module_exports_request() {
        let request = RunRequest::new("acct1");
        assert_eq!(request.source_identifier, "acct1");
        assert_eq!(request.item_count, 1);
    }

    #[test]
    fn test_module_exports_store() {
        let store = StatusStore::new();
        assert!(store.is_empty());
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
