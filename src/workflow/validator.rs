//! Request Validation
//!
//! Checks a [`RunRequest`] before a run is created. A rejected request
//! never allocates a run identifier or touches the status store.

use log::{debug, warn};

use super::model::RunRequest;
use crate::error::WorkflowError;

/// Upper bound on items per run when no configuration overrides it.
pub const DEFAULT_MAX_ITEM_COUNT: u32 = 100;

/// Individual validation failures, joined into one `InvalidRequest`.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptySource,
    ItemCountTooSmall(u32),
    ItemCountTooLarge { count: u32, max: u32 },
    InvalidTimeout(f64),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySource => write!(f, "sourceIdentifier must not be empty"),
            Self::ItemCountTooSmall(count) => {
                write!(f, "itemCount must be at least 1 (got {})", count)
            }
            Self::ItemCountTooLarge { count, max } => {
                write!(f, "itemCount must be at most {} (got {})", max, count)
            }
            Self::InvalidTimeout(secs) => {
                write!(f, "perStepTimeoutSeconds must be a positive number (got {})", secs)
            }
        }
    }
}

/// Collects every rule the request breaks.
pub fn check_request(request: &RunRequest, max_item_count: u32) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if request.source_identifier.trim().is_empty() {
        errors.push(ValidationError::EmptySource);
    }

    if request.item_count < 1 {
        errors.push(ValidationError::ItemCountTooSmall(request.item_count));
    } else if request.item_count > max_item_count {
        errors.push(ValidationError::ItemCountTooLarge {
            count: request.item_count,
            max: max_item_count,
        });
    }

    if let Some(secs) = request.per_step_timeout_seconds {
        // Duration::from_secs_f64 panics on values it cannot represent
        if !secs.is_finite() || secs <= 0.0 || secs > u32::MAX as f64 {
            errors.push(ValidationError::InvalidTimeout(secs));
        }
    }

    errors
}

/// Validates a request, returning `InvalidRequest` with every failure.
pub fn validate_request(request: &RunRequest, max_item_count: u32) -> Result<(), WorkflowError> {
    let errors = check_request(request, max_item_count);

    if errors.is_empty() {
        debug!(
            "Request for '{}' accepted ({} items)",
            request.source_identifier, request.item_count
        );
        return Ok(());
    }

    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    warn!("Rejected run request: {}", messages.join("; "));
    Err(WorkflowError::InvalidRequest(messages.join("; ")))
}
