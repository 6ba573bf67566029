//! Workflow Execution Engine
//!
//! Drives the fixed fetch → classify → transform → publish pipeline for
//! each accepted request:
//! - Validates the request and registers a PENDING run record
//! - Checks the publisher's credentials before any step starts
//! - Runs each step through the [`StepRunner`] with its own deadline
//! - Records every outcome in the [`StatusStore`] before the next step begins
//! - Keeps going past failed or timed-out steps, using the best input left
//!
//! Many runs execute concurrently, each on its own task. Steps within one
//! run are strictly sequential.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use serde::Serialize;

use crate::content::{
    ClassifiedItem, CollaboratorError, Collaborators, ContentItem, ContentType, PolishedItem,
};
use crate::error::WorkflowError;
use crate::workflow::{
    validate_request, RunId, RunRecord, RunRequest, RunStatus, StatusStore, StepName,
    StepOutcome, DEFAULT_MAX_ITEM_COUNT,
};

use super::step::{StepReport, StepRunner};

/// Default per-step deadline.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(60);

/// Executor settings taken from the process configuration.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Deadline for every step when the request does not set one.
    pub default_step_timeout: Duration,
    /// Longer deadline for the publish step when the request does not set one.
    pub publish_step_timeout: Option<Duration>,
    /// When false the publish step reports success without posting.
    pub auto_posting_enabled: bool,
    pub max_item_count: u32,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            default_step_timeout: DEFAULT_STEP_TIMEOUT,
            publish_step_timeout: None,
            auto_posting_enabled: true,
            max_item_count: DEFAULT_MAX_ITEM_COUNT,
        }
    }
}

/// Result of the publish step.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummary {
    pub posted_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub message: String,
}

/// The best input available for the next step.
///
/// A failed step leaves the carry untouched, so later steps fall back to
/// the last successful output.
#[derive(Debug, Clone)]
enum Carry {
    Nothing,
    Fetched(Vec<ContentItem>),
    Classified(Vec<ClassifiedItem>),
    Polished(Vec<PolishedItem>),
}

impl Carry {
    fn fetched(&self) -> Option<Vec<ContentItem>> {
        match self {
            Self::Fetched(items) => Some(items.clone()),
            _ => None,
        }
    }

    /// Input for transform: classified items, or fetched items as general content.
    fn classified(&self) -> Option<Vec<ClassifiedItem>> {
        match self {
            Self::Fetched(items) => {
                Some(items.iter().cloned().map(ClassifiedItem::unclassified).collect())
            }
            Self::Classified(items) => Some(items.clone()),
            Self::Nothing | Self::Polished(_) => None,
        }
    }

    /// Input for publish: polished items, or earlier items with their original text.
    fn polished(&self) -> Option<Vec<PolishedItem>> {
        match self {
            Self::Polished(items) => Some(items.clone()),
            Self::Nothing => None,
            other => other
                .classified()
                .map(|items| items.into_iter().map(PolishedItem::unpolished).collect()),
        }
    }
}

/// Runs the content pipeline and tracks run status.
///
/// Cheap to clone; clones share the same store and collaborators.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use contentflow::execution::{ExecutorOptions, WorkflowExecutor};
/// use contentflow::workflow::{RunRequest, StatusStore};
/// # async fn run(collaborators: contentflow::content::Collaborators) -> Result<(), contentflow::WorkflowError> {
/// let store = Arc::new(StatusStore::new());
/// let executor = WorkflowExecutor::new(store, collaborators, ExecutorOptions::default());
///
/// let record = executor.run_sync(RunRequest::new("acct1")).await?;
/// println!("{}", record.overall_status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WorkflowExecutor {
    store: Arc<StatusStore>,
    collaborators: Collaborators,
    options: Arc<ExecutorOptions>,
    runner: StepRunner,
}

impl WorkflowExecutor {
    pub fn new(
        store: Arc<StatusStore>,
        collaborators: Collaborators,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            store,
            collaborators,
            options: Arc::new(options),
            runner: StepRunner::new(),
        }
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Accepts a run and executes it in the background.
    ///
    /// Returns as soon as the PENDING record is registered; callers poll
    /// the store with the returned identifier.
    pub fn start_run(&self, request: RunRequest) -> Result<RunId, WorkflowError> {
        let run_id = self.accept(request.clone())?;

        let executor = self.clone();
        tokio::spawn(async move {
            if let Err(e) = executor.drive(run_id, request).await {
                error!("Run {} stopped on an internal error: {}", run_id, e);
            }
        });

        Ok(run_id)
    }

    /// Accepts a run and waits for it to reach a terminal status.
    ///
    /// The run is driven on its own task, so dropping the returned future
    /// stops the wait but not the run.
    pub async fn run_sync(&self, request: RunRequest) -> Result<RunRecord, WorkflowError> {
        let run_id = self.accept(request.clone())?;

        let executor = self.clone();
        let handle = tokio::spawn(async move { executor.drive(run_id, request).await });

        handle.await.map_err(|e| {
            error!("Run {} task ended abnormally: {}", run_id, e);
            WorkflowError::Invariant(format!("run {} task ended abnormally: {}", run_id, e))
        })?
    }

    /// Validates the request and registers a PENDING record.
    fn accept(&self, request: RunRequest) -> Result<RunId, WorkflowError> {
        validate_request(&request, self.options.max_item_count)?;

        let run_id = RunId::new();
        self.store.create(run_id, RunRecord::new(run_id, request.clone()))?;

        info!(
            "Accepted run {} for '{}' ({} items, filter: {})",
            run_id,
            request.source_identifier,
            request.item_count,
            request
                .type_filter
                .map(|t| t.to_string())
                .unwrap_or_else(|| "any".to_string())
        );
        Ok(run_id)
    }

    /// Executes the pipeline for an accepted run and returns the final record.
    async fn drive(&self, run_id: RunId, request: RunRequest) -> Result<RunRecord, WorkflowError> {
        if self.options.auto_posting_enabled {
            if let Err(e) = self.collaborators.publisher.check_ready().await {
                warn!("Run {} aborted before start: {}", run_id, e);
                return self.store.update(&run_id, |record| {
                    record.abort(e.to_string())?;
                    Ok::<_, WorkflowError>(record.clone())
                })?;
            }
        }

        self.store.update(&run_id, |record| record.begin())??;

        let mut carry = Carry::Nothing;

        // fetch
        self.enter(&run_id, StepName::Fetch)?;
        let fetcher = Arc::clone(&self.collaborators.fetcher);
        let report = self
            .runner
            .execute(
                StepName::Fetch,
                (request.source_identifier.clone(), request.item_count),
                self.step_timeout(&request, StepName::Fetch),
                |(source, count)| async move { fetcher.fetch(&source, count).await },
            )
            .await;
        if let Some(items) = self.record(&run_id, report)? {
            carry = Carry::Fetched(items);
        }

        // classify
        match carry.fetched() {
            Some(items) => {
                self.enter(&run_id, StepName::Classify)?;
                let classifier = Arc::clone(&self.collaborators.classifier);
                let report = self
                    .runner
                    .execute(
                        StepName::Classify,
                        items,
                        self.step_timeout(&request, StepName::Classify),
                        |items| async move { classifier.classify(items).await },
                    )
                    .await;
                if let Some(items) = self.record(&run_id, report)? {
                    carry = Carry::Classified(items);
                }
            }
            None => self.skip(&run_id, StepName::Classify, StepName::Fetch)?,
        }

        // transform
        match carry.classified() {
            Some(items) => {
                self.enter(&run_id, StepName::Transform)?;
                let transformer = Arc::clone(&self.collaborators.transformer);
                let report = self
                    .runner
                    .execute(
                        StepName::Transform,
                        items,
                        self.step_timeout(&request, StepName::Transform),
                        |items| async move {
                            let mut polished = Vec::with_capacity(items.len());
                            for item in items {
                                polished.push(transformer.transform(item).await?);
                            }
                            Ok::<_, CollaboratorError>(polished)
                        },
                    )
                    .await;
                if let Some(items) = self.record(&run_id, report)? {
                    carry = Carry::Polished(items);
                }
            }
            None => self.skip(&run_id, StepName::Transform, StepName::Classify)?,
        }

        // publish
        match carry.polished() {
            Some(items) => {
                self.enter(&run_id, StepName::Publish)?;
                let publisher = Arc::clone(&self.collaborators.publisher);
                let auto_posting = self.options.auto_posting_enabled;
                let filter = request.type_filter;
                let report = self
                    .runner
                    .execute(
                        StepName::Publish,
                        items,
                        self.step_timeout(&request, StepName::Publish),
                        move |items| async move {
                            if !auto_posting {
                                return Ok(PublishSummary {
                                    posted_count: 0,
                                    published_id: None,
                                    item_id: None,
                                    message: "Auto posting disabled".to_string(),
                                });
                            }
                            let Some(item) = select_for_publish(&items, filter) else {
                                return Ok(PublishSummary {
                                    posted_count: 0,
                                    published_id: None,
                                    item_id: None,
                                    message: "No polished items matched the type filter"
                                        .to_string(),
                                });
                            };
                            let published = publisher.publish(item).await?;
                            Ok::<_, CollaboratorError>(PublishSummary {
                                posted_count: 1,
                                published_id: Some(published.0),
                                item_id: Some(item.item_id().to_string()),
                                message: format!("Published item '{}'", item.item_id()),
                            })
                        },
                    )
                    .await;
                self.record(&run_id, report)?;
            }
            None => self.skip(&run_id, StepName::Publish, StepName::Transform)?,
        }

        let record = self.store.update(&run_id, |record| {
            record.finish()?;
            Ok::<_, WorkflowError>(record.clone())
        })??;

        match record.overall_status {
            RunStatus::Completed => info!("Run {} completed", run_id),
            status => warn!("Run {} finished with status {}", run_id, status),
        }
        Ok(record)
    }

    /// Effective deadline for a step.
    fn step_timeout(&self, request: &RunRequest, step: StepName) -> Duration {
        if let Some(secs) = request.per_step_timeout_seconds {
            return Duration::from_secs_f64(secs);
        }
        match (step, self.options.publish_step_timeout) {
            (StepName::Publish, Some(timeout)) => timeout,
            _ => self.options.default_step_timeout,
        }
    }

    fn enter(&self, run_id: &RunId, step: StepName) -> Result<(), WorkflowError> {
        self.store.update(run_id, |record| record.enter_step(step))?
    }

    /// Stores the outcome and hands back the typed output on success.
    fn record<T>(&self, run_id: &RunId, report: StepReport<T>) -> Result<Option<T>, WorkflowError> {
        self.store
            .update(run_id, |record| record.record_step(report.outcome))??;
        Ok(report.output)
    }

    fn skip(&self, run_id: &RunId, step: StepName, missing: StepName) -> Result<(), WorkflowError> {
        let reason = format!("skipped: no input available because {} did not succeed", missing);
        info!("Run {}: step '{}' {}", run_id, step, reason);
        self.store
            .update(run_id, |record| record.record_step(StepOutcome::skipped(step, reason)))?
    }
}

/// Picks the newest item matching the filter (any type when `None`).
fn select_for_publish(items: &[PolishedItem], filter: Option<ContentType>) -> Option<&PolishedItem> {
    items
        .iter()
        .filter(|item| filter.map_or(true, |t| item.content_type() == t))
        .max_by_key(|item| item.created_at())
}
