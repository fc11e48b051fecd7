//! Publisher-supplied content items
//!
//! A `ContentItem` is immutable once a publish run has ingested it. The body
//! is a tagged union keyed on `kind`; each variant carries only what it needs.

use crate::error::ContentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME marker for text/article content.
pub const TEXT_MIME: &str = "text/html";

/// Discriminant of a content body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Video,
    Binary,
}

impl ContentKind {
    pub fn is_text(&self) -> bool {
        matches!(self, ContentKind::Text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Binary => "binary",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentBody {
    Text {
        body: String,
    },
    Image {
        locator: String,
        #[serde(default = "default_image_mime")]
        mime: String,
    },
    Video {
        locator: String,
        #[serde(default = "default_video_mime")]
        mime: String,
    },
    Binary {
        locator: String,
        #[serde(default = "default_binary_mime")]
        mime: String,
    },
}

fn default_image_mime() -> String {
    "image/jpeg".to_string()
}

fn default_video_mime() -> String {
    "video/mp4".to_string()
}

fn default_binary_mime() -> String {
    "application/octet-stream".to_string()
}

impl ContentBody {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentBody::Text { .. } => ContentKind::Text,
            ContentBody::Image { .. } => ContentKind::Image,
            ContentBody::Video { .. } => ContentKind::Video,
            ContentBody::Binary { .. } => ContentKind::Binary,
        }
    }

    /// MIME type written to the record's `type` field.
    pub fn mime(&self) -> &str {
        match self {
            ContentBody::Text { .. } => TEXT_MIME,
            ContentBody::Image { mime, .. }
            | ContentBody::Video { mime, .. }
            | ContentBody::Binary { mime, .. } => mime,
        }
    }

    /// Remote locator of a binary body; `None` for text.
    pub fn locator(&self) -> Option<&str> {
        match self {
            ContentBody::Text { .. } => None,
            ContentBody::Image { locator, .. }
            | ContentBody::Video { locator, .. }
            | ContentBody::Binary { locator, .. } => Some(locator),
        }
    }
}

/// Whether the publisher owns the content or licenses it from someone else
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Ownership {
    Owned,
    Licensed { from: String },
}

impl Default for Ownership {
    fn default() -> Self {
        Ownership::Owned
    }
}

/// Article an owned text item belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    /// Canonical URL of the article
    pub uri: String,
    /// Publisher-side article identifier
    pub id: String,
}

/// Storage requirements for an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePolicy {
    #[serde(default)]
    pub encrypt: bool,
}

/// Content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(flatten)]
    pub body: ContentBody,
    #[serde(default)]
    pub ownership: Ownership,
    pub title: String,
    pub description: String,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub article: Option<ArticleRef>,
    #[serde(default)]
    pub credited_source: Option<String>,
    #[serde(default)]
    pub storage: StoragePolicy,
}

impl ContentItem {
    /// Build a text item with default ownership and storage policy.
    pub fn text(body: impl Into<String>, title: impl Into<String>, published: DateTime<Utc>) -> Self {
        let title = title.into();
        Self {
            body: ContentBody::Text { body: body.into() },
            ownership: Ownership::Owned,
            description: title.clone(),
            title,
            published,
            article: None,
            credited_source: None,
            storage: StoragePolicy::default(),
        }
    }

    /// Build an image item fetched from `locator`.
    pub fn image(locator: impl Into<String>, title: impl Into<String>, published: DateTime<Utc>) -> Self {
        let title = title.into();
        Self {
            body: ContentBody::Image {
                locator: locator.into(),
                mime: default_image_mime(),
            },
            ownership: Ownership::Owned,
            description: title.clone(),
            title,
            published,
            article: None,
            credited_source: None,
            storage: StoragePolicy::default(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.body.kind()
    }

    /// Reject items that cannot be published before touching any collaborator.
    pub fn validate(&self) -> Result<(), ContentError> {
        match &self.body {
            ContentBody::Text { body } if body.is_empty() => return Err(ContentError::EmptyBody),
            ContentBody::Text { .. } => {}
            ContentBody::Image { locator, .. }
            | ContentBody::Video { locator, .. }
            | ContentBody::Binary { locator, .. } => {
                if locator.trim().is_empty() {
                    return Err(ContentError::EmptyLocator);
                }
            }
        }
        if self.description.trim().is_empty() {
            return Err(ContentError::MissingField("description"));
        }
        if let Ownership::Licensed { from } = &self.ownership {
            if from.trim().is_empty() {
                return Err(ContentError::MissingField("ownership.from"));
            }
        }
        Ok(())
    }
}
