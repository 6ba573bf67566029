//! Single-shot Invocation
//!
//! Entry point for external schedulers (cron, systemd timers). Turns
//! positional arguments into a request, runs it to completion and maps
//! the result onto a process exit code.
//!
//! | Outcome                  | Exit code |
//! |--------------------------|-----------|
//! | COMPLETED                | 0         |
//! | COMPLETED_WITH_ERRORS    | 1         |
//! | FAILED / rejected request| 2         |

use log::{error, info};

use crate::config::Settings;
use crate::content::ContentType;
use crate::error::WorkflowError;
use crate::workflow::{RunRecord, RunRequest, RunStatus};

use super::engine::WorkflowExecutor;

pub const EXIT_COMPLETED: u8 = 0;
pub const EXIT_COMPLETED_WITH_ERRORS: u8 = 1;
pub const EXIT_FAILED: u8 = 2;

/// Builds a request from `[SOURCE] [COUNT] [TYPE]`.
///
/// Missing arguments default from `settings`. `TYPE` accepts a name or
/// its numeric code.
pub fn parse_invocation(args: &[String], settings: &Settings) -> Result<RunRequest, WorkflowError> {
    if args.len() > 3 {
        return Err(WorkflowError::InvalidRequest(format!(
            "unexpected argument: {}",
            args[3]
        )));
    }

    let source = args.first().cloned();

    let count = args
        .get(1)
        .map(|raw| {
            raw.trim().parse::<u32>().map_err(|_| {
                WorkflowError::InvalidRequest(format!("item count must be a positive integer, got '{}'", raw))
            })
        })
        .transpose()?;

    let type_filter = args
        .get(2)
        .map(|raw| raw.parse::<ContentType>().map_err(WorkflowError::InvalidRequest))
        .transpose()?;

    settings.resolve_request(source, count, type_filter, None)
}

pub fn exit_code_for(status: RunStatus) -> u8 {
    match status {
        RunStatus::Completed => EXIT_COMPLETED,
        RunStatus::CompletedWithErrors => EXIT_COMPLETED_WITH_ERRORS,
        RunStatus::Failed | RunStatus::Pending | RunStatus::Running => EXIT_FAILED,
    }
}

/// Result of one invocation: the exit code and, if a run was accepted,
/// its final record.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub exit_code: u8,
    pub record: Option<RunRecord>,
}

/// Runs the pipeline once and waits for it. Never fails.
pub async fn invoke_once(
    executor: &WorkflowExecutor,
    settings: &Settings,
    args: &[String],
) -> Invocation {
    let request = match parse_invocation(args, settings) {
        Ok(request) => request,
        Err(e) => {
            error!("Rejected invocation: {}", e);
            return Invocation {
                exit_code: EXIT_FAILED,
                record: None,
            };
        }
    };

    match executor.run_sync(request).await {
        Ok(record) => {
            let exit_code = exit_code_for(record.overall_status);
            info!(
                "Run {} finished with {} (exit code {})",
                record.run_id, record.overall_status, exit_code
            );
            Invocation {
                exit_code,
                record: Some(record),
            }
        }
        Err(e) => {
            error!("Run could not be executed: {}", e);
            Invocation {
                exit_code: EXIT_FAILED,
                record: None,
            }
        }
    }
}
