//! Workflow Execution Module
//!
//! Runs the content pipeline: per-step deadlines, continuation past
//! failed steps, and the entry points callers use to start runs.
//!
//! # Architecture
//!
//! - [`engine`]: Executor driving runs through the four pipeline steps
//! - [`step`]: Single step execution under a deadline
//! - [`oneshot`]: Blocking invocation for external schedulers

pub mod engine;
pub mod oneshot;
pub mod step;

pub use engine::{ExecutorOptions, PublishSummary, WorkflowExecutor, DEFAULT_STEP_TIMEOUT};
pub use oneshot::{exit_code_for, invoke_once, parse_invocation, Invocation};
pub use step::{StepReport, StepRunner};
