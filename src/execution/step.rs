//! Individual Step Execution
//!
//! Runs one pipeline step under a deadline and turns whatever happens
//! into a [`StepOutcome`]:
//! - the collaborator returns a value: SUCCESS, value encoded as the summary
//! - the collaborator returns an error: FAILED, error text kept verbatim
//! - the deadline passes first: TIMED_OUT, the step task is aborted
//! - the collaborator panics: FAILED
//!
//! The step runs as its own task so it can be abandoned at the deadline.
//! Aborting only takes effect at the collaborator's next await point; a
//! collaborator that blocks the thread keeps running until it yields.

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::content::CollaboratorError;
use crate::workflow::{StepName, StepOutcome};

/// Outcome of a step plus its typed output, present only on success.
#[derive(Debug)]
pub struct StepReport<T> {
    pub outcome: StepOutcome,
    pub output: Option<T>,
}

/// Executes single steps under a deadline. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRunner;

impl StepRunner {
    pub fn new() -> Self {
        Self
    }

    /// Runs `step_fn(input)` and waits at most `deadline` for it.
    pub async fn execute<I, T, F, Fut>(
        &self,
        step: StepName,
        input: I,
        deadline: Duration,
        step_fn: F,
    ) -> StepReport<T>
    where
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let started_at = Utc::now();
        info!("Starting step: {} (deadline {:?})", step, deadline);

        let mut handle = tokio::spawn(step_fn(input));

        match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(Ok(output))) => match serde_json::to_value(&output) {
                Ok(summary) => {
                    info!("Step '{}' completed successfully", step);
                    StepReport {
                        outcome: StepOutcome::success(step, started_at, summary),
                        output: Some(output),
                    }
                }
                Err(e) => {
                    error!("Step '{}' produced an unencodable result: {}", step, e);
                    StepReport {
                        outcome: StepOutcome::failed(
                            step,
                            started_at,
                            format!("result could not be encoded: {}", e),
                        ),
                        output: None,
                    }
                }
            },
            Ok(Ok(Err(err))) => {
                error!("Step '{}' failed: {}", step, err);
                StepReport {
                    outcome: StepOutcome::failed(step, started_at, err.to_string()),
                    output: None,
                }
            }
            Ok(Err(join_err)) => {
                let message = if join_err.is_panic() {
                    format!("step panicked: {}", panic_message(join_err.into_panic()))
                } else {
                    "step task was cancelled".to_string()
                };
                error!("Step '{}' failed: {}", step, message);
                StepReport {
                    outcome: StepOutcome::failed(step, started_at, message),
                    output: None,
                }
            }
            Err(_) => {
                handle.abort();
                warn!("Step '{}' timed out after {:?}", step, deadline);
                debug!("Abandoned step '{}' task aborted", step);
                StepReport {
                    outcome: StepOutcome::timed_out(
                        step,
                        started_at,
                        format!("Step timed out after {} seconds", deadline.as_secs_f64()),
                    ),
                    output: None,
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StepStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_success_records_summary() {
        let report = StepRunner::new()
            .execute(StepName::Fetch, 3u32, Duration::from_secs(1), |n| async move {
                Ok::<_, CollaboratorError>(vec![n; 2])
            })
            .await;

        assert_eq!(report.outcome.status, StepStatus::Success);
        assert_eq!(report.outcome.result_summary, Some(json!([3, 3])));
        assert!(report.outcome.error_message.is_none());
        assert_eq!(report.output, Some(vec![3, 3]));
    }

    #[tokio::test]
    async fn test_error_message_is_verbatim() {
        let err = CollaboratorError::Credentials("401 Unauthorized".into());
        let expected = err.to_string();

        let report = StepRunner::new()
            .execute(StepName::Publish, err, Duration::from_secs(1), |err| async move {
                Err::<(), _>(err)
            })
            .await;

        assert_eq!(report.outcome.status, StepStatus::Failed);
        assert_eq!(report.outcome.error_message, Some(expected));
        assert!(report.outcome.result_summary.is_none());
        assert!(report.output.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_step_times_out_at_deadline() {
        let deadline = Duration::from_secs(5);
        let start = tokio::time::Instant::now();

        let report = StepRunner::new()
            .execute(StepName::Transform, (), deadline, |_| async {
                std::future::pending::<Result<(), CollaboratorError>>().await
            })
            .await;

        let elapsed = start.elapsed();
        assert_eq!(report.outcome.status, StepStatus::TimedOut);
        assert!(elapsed >= deadline);
        assert!(elapsed < deadline + Duration::from_millis(100));
        assert_eq!(
            report.outcome.error_message.as_deref(),
            Some("Step timed out after 5 seconds")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_step_within_deadline_succeeds() {
        let report = StepRunner::new()
            .execute(StepName::Classify, (), Duration::from_secs(5), |_| async {
                tokio::time::sleep(Duration::from_secs(4)).await;
                Ok::<_, CollaboratorError>("done")
            })
            .await;

        assert_eq!(report.outcome.status, StepStatus::Success);
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let report = StepRunner::new()
            .execute(StepName::Fetch, (), Duration::from_secs(1), |_| async {
                if true {
                    panic!("collaborator exploded");
                }
                Ok::<(), CollaboratorError>(())
            })
            .await;

        assert_eq!(report.outcome.status, StepStatus::Failed);
        let message = report.outcome.error_message.unwrap();
        assert!(message.contains("collaborator exploded"), "got: {}", message);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_task_is_aborted() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let report = StepRunner::new()
            .execute(StepName::Fetch, flag, Duration::from_secs(1), |flag| async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, CollaboratorError>(())
            })
            .await;
        assert_eq!(report.outcome.status, StepStatus::TimedOut);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42)), "unknown panic");
    }
}
