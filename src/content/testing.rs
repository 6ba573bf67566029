//! Scripted collaborators for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::collaborator::{
    Classifier, CollaboratorError, Collaborators, Fetcher, Publisher, Transformer,
};
use super::model::{ClassifiedItem, ContentItem, PolishedItem, PublishedId};
use super::rules::KeywordClassifier;

/// What a scripted collaborator does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(CollaboratorError),
    /// Never returns.
    Hang,
    /// Succeeds after the delay.
    Delay(Duration),
    Panic,
}

impl Behavior {
    async fn perform(&self) -> Result<(), CollaboratorError> {
        match self {
            Self::Succeed => Ok(()),
            Self::Fail(err) => Err(err.clone()),
            Self::Hang => std::future::pending().await,
            Self::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Self::Panic => panic!("scripted collaborator panic"),
        }
    }
}

pub struct ScriptedFetcher {
    pub behavior: Behavior,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        source_identifier: &str,
        item_count: u32,
    ) -> Result<Vec<ContentItem>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.perform().await?;
        Ok((0..item_count)
            .map(|i| {
                ContentItem::new(
                    format!("{}-{}", source_identifier, i),
                    source_identifier,
                    format!("breaking news item {}", i),
                )
            })
            .collect())
    }
}

pub struct ScriptedClassifier {
    pub behavior: Behavior,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        items: Vec<ContentItem>,
    ) -> Result<Vec<ClassifiedItem>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.perform().await?;
        Ok(items
            .into_iter()
            .map(|item| {
                let t = KeywordClassifier::classify_text(&item.text);
                ClassifiedItem::new(item, t)
            })
            .collect())
    }
}

pub struct ScriptedTransformer {
    pub behavior: Behavior,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Transformer for ScriptedTransformer {
    async fn transform(&self, item: ClassifiedItem) -> Result<PolishedItem, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.perform().await?;
        let text = format!("polished: {}", item.item.text);
        Ok(PolishedItem::new(item, text))
    }
}

pub struct ScriptedPublisher {
    pub behavior: Behavior,
    pub ready: Result<(), CollaboratorError>,
    pub calls: AtomicUsize,
    pub published: Mutex<Vec<PolishedItem>>,
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    async fn check_ready(&self) -> Result<(), CollaboratorError> {
        self.ready.clone()
    }

    async fn publish(&self, item: &PolishedItem) -> Result<PublishedId, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.perform().await?;
        self.published.lock().unwrap().push(item.clone());
        Ok(PublishedId(format!("pub-{}", item.item_id())))
    }
}

/// A full set of scripted collaborators, all succeeding by default.
pub struct ScriptedPipeline {
    pub fetcher: Arc<ScriptedFetcher>,
    pub classifier: Arc<ScriptedClassifier>,
    pub transformer: Arc<ScriptedTransformer>,
    pub publisher: Arc<ScriptedPublisher>,
}

impl ScriptedPipeline {
    pub fn new() -> Self {
        Self::with(Behavior::Succeed, Behavior::Succeed, Behavior::Succeed, Behavior::Succeed)
    }

    pub fn with(fetch: Behavior, classify: Behavior, transform: Behavior, publish: Behavior) -> Self {
        Self {
            fetcher: Arc::new(ScriptedFetcher {
                behavior: fetch,
                calls: AtomicUsize::new(0),
            }),
            classifier: Arc::new(ScriptedClassifier {
                behavior: classify,
                calls: AtomicUsize::new(0),
            }),
            transformer: Arc::new(ScriptedTransformer {
                behavior: transform,
                calls: AtomicUsize::new(0),
            }),
            publisher: Arc::new(ScriptedPublisher {
                behavior: publish,
                ready: Ok(()),
                calls: AtomicUsize::new(0),
                published: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Makes the publisher's readiness check fail.
    pub fn not_ready(mut self, err: CollaboratorError) -> Self {
        self.publisher = Arc::new(ScriptedPublisher {
            behavior: self.publisher.behavior.clone(),
            ready: Err(err),
            calls: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.fetcher.clone(),
            self.classifier.clone(),
            self.transformer.clone(),
            self.publisher.clone(),
        )
    }
}
