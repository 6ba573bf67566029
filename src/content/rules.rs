//! Rule-Based Classify and Transform
//!
//! In-process collaborators that need no external service: a keyword
//! classifier and a text tidier that enforces the destination's length
//! limit.

use async_trait::async_trait;
use log::debug;

use super::collaborator::{Classifier, CollaboratorError, Transformer};
use super::model::{ClassifiedItem, ContentItem, ContentType, PolishedItem};

/// Maximum length of a published post, in characters.
pub const MAX_POST_CHARS: usize = 280;

/// Texts longer than this are assumed to belong to a thread.
const THREAD_THRESHOLD_CHARS: usize = 200;

const PROMOTIONAL_WORDS: &[&str] = &["buy", "sale", "discount", "offer", "promo"];
const NEWS_WORDS: &[&str] = &["news", "breaking", "announced", "update"];
const PERSONAL_WORDS: &[&str] = &["i", "me", "my", "personal"];

/// Classifies text by keyword. First matching rule wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns the category for a single text.
    pub fn classify_text(text: &str) -> ContentType {
        let lower = text.to_lowercase();

        if PROMOTIONAL_WORDS.iter().any(|w| lower.contains(w)) {
            ContentType::Promotional
        } else if NEWS_WORDS.iter().any(|w| lower.contains(w)) {
            ContentType::News
        } else if text.starts_with("RT @") {
            ContentType::Retweet
        } else if text.chars().count() > THREAD_THRESHOLD_CHARS {
            ContentType::Thread
        } else if lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| PERSONAL_WORDS.contains(&word))
        {
            ContentType::Personal
        } else {
            ContentType::General
        }
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(
        &self,
        items: Vec<ContentItem>,
    ) -> Result<Vec<ClassifiedItem>, CollaboratorError> {
        Ok(items
            .into_iter()
            .map(|item| {
                let content_type = Self::classify_text(&item.text);
                debug!("Item '{}' classified as {}", item.item_id, content_type);
                ClassifiedItem::new(item, content_type)
            })
            .collect())
    }
}

/// Normalizes whitespace and caps text at [`MAX_POST_CHARS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TidyTransformer;

impl TidyTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn tidy(text: &str) -> String {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        truncate_chars(&collapsed, MAX_POST_CHARS)
    }
}

#[async_trait]
impl Transformer for TidyTransformer {
    async fn transform(&self, item: ClassifiedItem) -> Result<PolishedItem, CollaboratorError> {
        let polished = Self::tidy(&item.item.text);
        if polished.is_empty() {
            return Err(CollaboratorError::ExternalService(format!(
                "item '{}' has no text to polish",
                item.item.item_id
            )));
        }
        Ok(PolishedItem::new(item, polished))
    }
}

/// Truncates on character boundaries, ending with "..." when shortened.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rules_in_order() {
        assert_eq!(KeywordClassifier::classify_text("Big SALE today"), ContentType::Promotional);
        assert_eq!(KeywordClassifier::classify_text("Breaking: rates cut"), ContentType::News);
        assert_eq!(KeywordClassifier::classify_text("RT @someone: nice"), ContentType::Retweet);
        assert_eq!(KeywordClassifier::classify_text(&"a".repeat(201)), ContentType::Thread);
        assert_eq!(KeywordClassifier::classify_text("I walked the dog"), ContentType::Personal);
        assert_eq!(KeywordClassifier::classify_text("Sunny afternoon"), ContentType::General);
    }

    #[test]
    fn test_promotional_beats_news() {
        assert_eq!(
            KeywordClassifier::classify_text("News: discount on everything"),
            ContentType::Promotional
        );
    }

    #[test]
    fn test_personal_requires_whole_word() {
        // "this" contains an "i" but is not the word "i"
        assert_eq!(KeywordClassifier::classify_text("this works"), ContentType::General);
    }

    #[test]
    fn test_tidy_collapses_whitespace() {
        assert_eq!(TidyTransformer::tidy("  hello \n\t world  "), "hello world");
    }

    #[test]
    fn test_tidy_truncates_long_text() {
        let long = "é".repeat(300);
        let tidied = TidyTransformer::tidy(&long);

        assert_eq!(tidied.chars().count(), MAX_POST_CHARS);
        assert!(tidied.ends_with("..."));
    }

    #[tokio::test]
    async fn test_classifier_keeps_order() {
        let items = vec![
            ContentItem::new("1", "acct", "promo code inside"),
            ContentItem::new("2", "acct", "plain text"),
        ];
        let classified = KeywordClassifier::new().classify(items).await.unwrap();

        assert_eq!(classified.len(), 2);
        assert_eq!(classified[0].item.item_id, "1");
        assert_eq!(classified[0].content_type, ContentType::Promotional);
        assert_eq!(classified[1].content_type, ContentType::General);
    }

    #[tokio::test]
    async fn test_transform_rejects_blank_text() {
        let item = ClassifiedItem::unclassified(ContentItem::new("9", "acct", "   "));
        let err = TidyTransformer::new().transform(item).await.unwrap_err();

        assert!(matches!(err, CollaboratorError::ExternalService(_)));
    }
}
