//! Collaborator Interfaces
//!
//! The executor drives four external subsystems through these traits.
//! Implementations own their transport, credentials and rate limits; the
//! executor only sees a value or a [`CollaboratorError`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::model::{ClassifiedItem, ContentItem, PolishedItem, PublishedId};

/// Failure reported by a collaborator.
///
/// The `Display` text is recorded verbatim as the step's error message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("credential error: {0}")]
    Credentials(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::ExternalService(format!("malformed payload: {}", err))
    }
}

/// Retrieves raw content for a source.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        source_identifier: &str,
        item_count: u32,
    ) -> Result<Vec<ContentItem>, CollaboratorError>;
}

/// Assigns a category to each fetched item.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        items: Vec<ContentItem>,
    ) -> Result<Vec<ClassifiedItem>, CollaboratorError>;
}

/// Rewrites a single item's text.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, item: ClassifiedItem) -> Result<PolishedItem, CollaboratorError>;
}

/// Posts a single item to the destination.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Checks that the publisher can post at all (credentials present).
    ///
    /// Called once per run before any step starts.
    async fn check_ready(&self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    async fn publish(&self, item: &PolishedItem) -> Result<PublishedId, CollaboratorError>;
}

/// The four collaborators a pipeline run needs.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub classifier: Arc<dyn Classifier>,
    pub transformer: Arc<dyn Transformer>,
    pub publisher: Arc<dyn Publisher>,
}

impl Collaborators {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        classifier: Arc<dyn Classifier>,
        transformer: Arc<dyn Transformer>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            transformer,
            publisher,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
