//! Demo Content Source
//!
//! Synthetic items used when demo mode is on, so the pipeline can run
//! without touching a rate-limited remote source.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::info;

use super::collaborator::{CollaboratorError, Fetcher};
use super::model::ContentItem;

const DEMO_TEXTS: &[&str] = &[
    "Limited offer: 20% discount on all plans this week",
    "Breaking news: the new release has been announced",
    "RT @partner: great write-up on pipeline design",
    "Morning coffee and a quiet start to the day",
    "My first attempt at sourdough went better than expected",
];

/// Fetcher that fabricates `item_count` items for any source.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoFetcher;

impl DemoFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Fetcher for DemoFetcher {
    async fn fetch(
        &self,
        source_identifier: &str,
        item_count: u32,
    ) -> Result<Vec<ContentItem>, CollaboratorError> {
        info!(
            "Demo mode: generating {} items for '{}'",
            item_count, source_identifier
        );

        let now = Utc::now();
        Ok((0..item_count as usize)
            .map(|i| {
                let text = DEMO_TEXTS[i % DEMO_TEXTS.len()];
                ContentItem::new(format!("demo-{}-{}", source_identifier, i + 1), source_identifier, text)
                    .created(now - Duration::minutes(i as i64))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_fetch_count_and_order() {
        let items = DemoFetcher::new().fetch("acct1", 7).await.unwrap();

        assert_eq!(items.len(), 7);
        assert_eq!(items[0].item_id, "demo-acct1-1");
        assert!(items.iter().all(|i| i.source_identifier == "acct1"));
        // newest first
        assert!(items[0].created_at > items[1].created_at);
        // texts cycle
        assert_eq!(items[0].text, items[5].text);
    }
}
