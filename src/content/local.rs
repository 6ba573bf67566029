//! Filesystem-Backed Collaborators
//!
//! `DirectoryFetcher` reads items dropped into `{data_dir}/raw` by an
//! external scraper, and `ArchivePublisher` records posted items under
//! `{data_dir}/posted`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use uuid::Uuid;

use super::collaborator::{CollaboratorError, Fetcher, Publisher};
use super::model::{ContentItem, ContentType, PolishedItem, PublishedId};

/// True if `name` can be used as a file name inside a data directory
/// without escaping it.
fn is_safe_file_stem(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !name.starts_with('.')
}

/// Reads `{raw_dir}/{source}.json`, an array of content items.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    raw_dir: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    fn source_path(&self, source_identifier: &str) -> Result<PathBuf, CollaboratorError> {
        if !is_safe_file_stem(source_identifier) {
            return Err(CollaboratorError::Transport(format!(
                "unsupported source identifier '{}'",
                source_identifier
            )));
        }
        Ok(self.raw_dir.join(format!("{}.json", source_identifier)))
    }
}

#[async_trait]
impl Fetcher for DirectoryFetcher {
    async fn fetch(
        &self,
        source_identifier: &str,
        item_count: u32,
    ) -> Result<Vec<ContentItem>, CollaboratorError> {
        let path = self.source_path(source_identifier)?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            CollaboratorError::Transport(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut items: Vec<ContentItem> = serde_json::from_str(&content)?;

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(item_count as usize);

        info!(
            "Fetched {} items for '{}' from {}",
            items.len(),
            source_identifier,
            path.display()
        );
        Ok(items)
    }
}

/// Record written for every published item.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PostedRecord<'a> {
    published_id: &'a str,
    item_id: &'a str,
    source_identifier: &'a str,
    original_text: &'a str,
    polished_text: &'a str,
    content_type: ContentType,
    posted_at: chrono::DateTime<Utc>,
}

/// Publisher that archives each posted item as JSON.
///
/// Requires a publish token; without one the run is aborted before any
/// step starts.
#[derive(Debug, Clone)]
pub struct ArchivePublisher {
    posted_dir: PathBuf,
    token: Option<String>,
}

impl ArchivePublisher {
    pub fn new(posted_dir: impl Into<PathBuf>, token: Option<String>) -> Self {
        Self {
            posted_dir: posted_dir.into(),
            token,
        }
    }

    pub fn posted_dir(&self) -> &Path {
        &self.posted_dir
    }
}

#[async_trait]
impl Publisher for ArchivePublisher {
    async fn check_ready(&self) -> Result<(), CollaboratorError> {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(()),
            _ => Err(CollaboratorError::Credentials(
                "no publish token configured (set WORKFLOW_PUBLISH_TOKEN)".to_string(),
            )),
        }
    }

    async fn publish(&self, item: &PolishedItem) -> Result<PublishedId, CollaboratorError> {
        self.check_ready().await?;

        if !is_safe_file_stem(item.item_id()) {
            return Err(CollaboratorError::ExternalService(format!(
                "unsupported item id '{}'",
                item.item_id()
            )));
        }

        tokio::fs::create_dir_all(&self.posted_dir).await?;

        let published_id = format!("post-{}", Uuid::new_v4().simple());
        let record = PostedRecord {
            published_id: &published_id,
            item_id: item.item_id(),
            source_identifier: &item.classified.item.source_identifier,
            original_text: &item.classified.item.text,
            polished_text: &item.polished_text,
            content_type: item.content_type(),
            posted_at: Utc::now(),
        };

        let path = self.posted_dir.join(format!("{}.json", item.item_id()));
        let json = serde_json::to_string_pretty(&record)?;
        tokio::fs::write(&path, json).await?;

        debug!("Archived posted item to {}", path.display());
        info!("Published item '{}' as {}", item.item_id(), published_id);

        Ok(PublishedId(published_id))
    }
}
