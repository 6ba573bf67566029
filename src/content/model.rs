//! Content Data Model
//!
//! Values exchanged between pipeline steps. Each step consumes the
//! previous step's output: fetched items are classified, classified
//! items are polished, and one polished item is published.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content category assigned by the classify step.
///
/// Also used as the optional type filter on a run request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    General,
    Promotional,
    News,
    Personal,
    Retweet,
    Thread,
}

impl ContentType {
    /// All content types in code order (1 through 6).
    pub const ALL: [ContentType; 6] = [
        ContentType::General,
        ContentType::Promotional,
        ContentType::News,
        ContentType::Personal,
        ContentType::Retweet,
        ContentType::Thread,
    ];

    /// Numeric code used by schedulers and legacy callers.
    pub fn code(self) -> u8 {
        match self {
            Self::General => 1,
            Self::Promotional => 2,
            Self::News => 3,
            Self::Personal => 4,
            Self::Retweet => 5,
            Self::Thread => 6,
        }
    }

    /// Looks up a content type by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Promotional => "promotional",
            Self::News => "news",
            Self::Personal => "personal",
            Self::Retweet => "retweet",
            Self::Thread => "thread",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    /// Accepts either a name (`news`, case-insensitive) or a code (`3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code)
                .ok_or_else(|| format!("Unknown content type code: {}", code));
        }

        let lower = trimmed.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown content type: {}", trimmed))
    }
}

/// A raw item returned by the fetch collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub item_id: String,
    pub source_identifier: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(
        item_id: impl Into<String>,
        source_identifier: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            source_identifier: source_identifier.into(),
            text: text.into(),
            media_urls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Sets the creation timestamp.
    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

/// A fetched item together with its assigned category.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedItem {
    #[serde(flatten)]
    pub item: ContentItem,
    pub content_type: ContentType,
}

impl ClassifiedItem {
    pub fn new(item: ContentItem, content_type: ContentType) -> Self {
        Self { item, content_type }
    }

    /// Treats an item that never went through classification as general content.
    pub fn unclassified(item: ContentItem) -> Self {
        Self::new(item, ContentType::General)
    }
}

/// A classified item with its rewritten text, ready to publish.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolishedItem {
    #[serde(flatten)]
    pub classified: ClassifiedItem,
    pub polished_text: String,
}

impl PolishedItem {
    pub fn new(classified: ClassifiedItem, polished_text: impl Into<String>) -> Self {
        Self {
            classified,
            polished_text: polished_text.into(),
        }
    }

    /// Publishes the original text unchanged when polishing was unavailable.
    pub fn unpolished(classified: ClassifiedItem) -> Self {
        let text = classified.item.text.clone();
        Self::new(classified, text)
    }

    pub fn item_id(&self) -> &str {
        &self.classified.item.item_id
    }

    pub fn content_type(&self) -> ContentType {
        self.classified.content_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.classified.item.created_at
    }
}

/// Identifier returned by the publish collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct PublishedId(pub String);

impl fmt::Display for PublishedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
