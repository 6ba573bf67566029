//! Run Data Model
//!
//! Core data structures describing a pipeline run: the accepted request,
//! the outcome of each step, and the run record that accumulates them.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "runId": "5b0c7e0e-6f1c-4a53-9a53-2f7e5fd3c9a1",
//!   "request": { "sourceIdentifier": "acct1", "itemCount": 1 },
//!   "overallStatus": "COMPLETED_WITH_ERRORS",
//!   "steps": [
//!     { "stepName": "fetch", "status": "SUCCESS", "resultSummary": [] },
//!     { "stepName": "classify", "status": "FAILED", "errorMessage": "..." }
//!   ],
//!   "createdAt": "2024-05-01T12:00:00Z"
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::content::ContentType;
use crate::error::WorkflowError;

/// Unique, never-reused run identifier.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A request to run the pipeline once. Immutable once accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub source_identifier: String,

    #[serde(default = "default_item_count")]
    pub item_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<ContentType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_step_timeout_seconds: Option<f64>,
}

fn default_item_count() -> u32 {
    1
}

impl RunRequest {
    pub fn new(source_identifier: impl Into<String>) -> Self {
        Self {
            source_identifier: source_identifier.into(),
            item_count: default_item_count(),
            type_filter: None,
            per_step_timeout_seconds: None,
        }
    }

    pub fn with_item_count(mut self, count: u32) -> Self {
        self.item_count = count;
        self
    }

    pub fn with_type_filter(mut self, filter: ContentType) -> Self {
        self.type_filter = Some(filter);
        self
    }

    pub fn with_step_timeout(mut self, seconds: f64) -> Self {
        self.per_step_timeout_seconds = Some(seconds);
        self
    }
}

/// The fixed pipeline stages, in execution order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StepName {
    Fetch,
    Classify,
    Transform,
    Publish,
}

impl StepName {
    /// Pipeline order. A run never records more steps than this.
    pub const PIPELINE: [StepName; 4] = [
        StepName::Fetch,
        StepName::Classify,
        StepName::Transform,
        StepName::Publish,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Classify => "classify",
            Self::Transform => "transform",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single step resolved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Success,
    Failed,
    TimedOut,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// Recorded result of one step. Immutable once recorded.
///
/// `error_message` is present iff the status is not `Success`;
/// `result_summary` is present iff it is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step_name: StepName,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<Value>,
}

impl StepOutcome {
    fn build(
        step_name: StepName,
        status: StepStatus,
        started_at: DateTime<Utc>,
        error_message: Option<String>,
        result_summary: Option<Value>,
    ) -> Self {
        let finished_at = Utc::now().max(started_at);
        Self {
            step_name,
            status,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            error_message,
            result_summary,
        }
    }

    pub fn success(step_name: StepName, started_at: DateTime<Utc>, summary: Value) -> Self {
        Self::build(step_name, StepStatus::Success, started_at, None, Some(summary))
    }

    pub fn failed(step_name: StepName, started_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::build(step_name, StepStatus::Failed, started_at, Some(message.into()), None)
    }

    pub fn timed_out(step_name: StepName, started_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::build(step_name, StepStatus::TimedOut, started_at, Some(message.into()), None)
    }

    /// A step that was not attempted because its input was unavailable.
    pub fn skipped(step_name: StepName, reason: impl Into<String>) -> Self {
        Self::build(step_name, StepStatus::Skipped, Utc::now(), Some(reason.into()), None)
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Overall state of a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl RunStatus {
    /// Terminal statuses are never left once entered.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithErrors | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// The state of one run.
///
/// Only the executor driving the run mutates it, and only through the
/// status store. `steps` is append-only and never exceeds the pipeline
/// length.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: RunId,
    pub request: RunRequest,
    pub overall_status: RunStatus,
    pub steps: Vec<StepOutcome>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Step currently in flight while RUNNING.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<StepName>,
    /// Why the run was aborted before any step ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl RunRecord {
    /// Creates a PENDING record for an accepted request.
    pub fn new(run_id: RunId, request: RunRequest) -> Self {
        Self {
            run_id,
            request,
            overall_status: RunStatus::Pending,
            steps: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            current_step: None,
            failure_reason: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.overall_status.is_terminal()
    }

    /// PENDING → RUNNING.
    pub fn begin(&mut self) -> Result<(), WorkflowError> {
        if self.overall_status != RunStatus::Pending {
            return Err(WorkflowError::Invariant(format!(
                "run {} cannot start from {}",
                self.run_id, self.overall_status
            )));
        }
        self.overall_status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Marks `step` as the one in flight.
    pub fn enter_step(&mut self, step: StepName) -> Result<(), WorkflowError> {
        self.expect_next(step)?;
        self.current_step = Some(step);
        Ok(())
    }

    /// Appends a step outcome. Steps must arrive in pipeline order.
    pub fn record_step(&mut self, outcome: StepOutcome) -> Result<(), WorkflowError> {
        self.expect_next(outcome.step_name)?;
        self.steps.push(outcome);
        self.current_step = None;
        Ok(())
    }

    fn expect_next(&self, step: StepName) -> Result<(), WorkflowError> {
        if self.overall_status != RunStatus::Running {
            return Err(WorkflowError::Invariant(format!(
                "run {} is {}, not RUNNING",
                self.run_id, self.overall_status
            )));
        }
        match StepName::PIPELINE.get(self.steps.len()) {
            Some(next) if *next == step => Ok(()),
            Some(next) => Err(WorkflowError::Invariant(format!(
                "run {} expected step {} but got {}",
                self.run_id, next, step
            ))),
            None => Err(WorkflowError::Invariant(format!(
                "run {} already recorded every step",
                self.run_id
            ))),
        }
    }

    /// Resolves the terminal status after the last step.
    pub fn finish(&mut self) -> Result<RunStatus, WorkflowError> {
        if self.overall_status != RunStatus::Running {
            return Err(WorkflowError::Invariant(format!(
                "run {} cannot finish from {}",
                self.run_id, self.overall_status
            )));
        }
        self.overall_status = compute_overall_status(&self.steps);
        self.finished_at = Some(Utc::now());
        self.current_step = None;
        Ok(self.overall_status)
    }

    /// Ends a run that failed a precondition before any step ran.
    pub fn abort(&mut self, reason: impl Into<String>) -> Result<(), WorkflowError> {
        if self.is_terminal() || !self.steps.is_empty() {
            return Err(WorkflowError::Invariant(format!(
                "run {} cannot be aborted once steps have run",
                self.run_id
            )));
        }
        self.overall_status = RunStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.finished_at = Some(Utc::now());
        self.current_step = None;
        Ok(())
    }

    /// Fraction of the pipeline that has been recorded, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        self.steps.len() as f64 / StepName::PIPELINE.len() as f64
    }

    /// Finds the recorded outcome of a step.
    pub fn step(&self, name: StepName) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step_name == name)
    }

    pub fn total_duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.created_at).num_milliseconds() as f64 / 1000.0)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            status: self.overall_status,
            source_identifier: self.request.source_identifier.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
            total_duration_seconds: self.total_duration_seconds(),
            steps_recorded: self.steps.len(),
        }
    }
}

/// COMPLETED when every step succeeded, COMPLETED_WITH_ERRORS when any
/// did not, FAILED when none ran.
pub fn compute_overall_status(steps: &[StepOutcome]) -> RunStatus {
    if steps.is_empty() {
        RunStatus::Failed
    } else if steps.iter().all(StepOutcome::is_success) {
        RunStatus::Completed
    } else {
        RunStatus::CompletedWithErrors
    }
}

/// Compact view of a run for listings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: RunId,
    pub status: RunStatus,
    pub source_identifier: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_duration_seconds: Option<f64>,
    pub steps_recorded: usize,
}
