//! Workflow Run Module
//!
//! Data structures describing pipeline runs, request validation, and
//! the registry that holds live run state.
//!
//! # Structure
//!
//! - [`model`]: Run requests, step outcomes and run records
//! - [`validator`]: Request validation rules
//! - [`store`]: Concurrent run status registry

pub mod model;
pub mod store;
pub mod validator;

pub use model::{
    RunId, RunRecord, RunRequest, RunStatus, RunSummary, StepName, StepOutcome, StepStatus,
};
pub use store::StatusStore;
pub use validator::{validate_request, DEFAULT_MAX_ITEM_COUNT};
