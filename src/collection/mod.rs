//! Template document collections.
//!
//! A collection is the source of truth for template documents. Subscribers
//! receive a [`Snapshot`] of the complete document set on the first load and
//! again after every change; snapshots are never diffs.
//!
//! Two implementations are provided:
//! - [`MemoryCollection`]: in-process, driven by explicit publishes
//! - [`RedisCollection`]: a Redis hash plus a pub/sub change channel

mod memory;
mod redis_backend;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::template::TemplateField;

pub use self::memory::MemoryCollection;
pub use self::redis_backend::{snapshot_from_hash, RedisCollection};

/// Stream of full collection snapshots, in delivery order
pub type SnapshotStream = BoxStream<'static, Snapshot>;

/// A source of template documents that announces every change
pub trait TemplateCollection: Send + Sync {
    /// Register a persistent subscription to the collection's change stream
    fn subscribe(&self) -> SnapshotStream;
}

/// A stored email template document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDocument {
    /// Document id, used as the template name
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amp: Option<String>,
}

impl TemplateDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn subject(mut self, source: impl Into<String>) -> Self {
        self.subject = Some(source.into());
        self
    }

    pub fn html(mut self, source: impl Into<String>) -> Self {
        self.html = Some(source.into());
        self
    }

    pub fn text(mut self, source: impl Into<String>) -> Self {
        self.text = Some(source.into());
        self
    }

    pub fn amp(mut self, source: impl Into<String>) -> Self {
        self.amp = Some(source.into());
        self
    }

    /// Template source for a field, treating an empty string as absent
    pub fn source(&self, field: TemplateField) -> Option<&str> {
        let source = match field {
            TemplateField::Subject => self.subject.as_deref(),
            TemplateField::Html => self.html.as_deref(),
            TemplateField::Text => self.text.as_deref(),
            TemplateField::Amp => self.amp.as_deref(),
        };
        source.filter(|s| !s.is_empty())
    }
}

/// Point-in-time view of every document in a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    docs: Vec<TemplateDocument>,
}

impl Snapshot {
    pub fn new(docs: Vec<TemplateDocument>) -> Self {
        Self { docs }
    }

    pub fn docs(&self) -> &[TemplateDocument] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl FromIterator<TemplateDocument> for Snapshot {
    fn from_iter<I: IntoIterator<Item = TemplateDocument>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_skips_empty_fields() {
        let doc = TemplateDocument::new("welcome").subject("Hi").html("");

        assert_eq!(doc.source(TemplateField::Subject), Some("Hi"));
        assert_eq!(doc.source(TemplateField::Html), None);
        assert_eq!(doc.source(TemplateField::Text), None);
    }

    #[test]
    fn test_document_deserializes_partial_json() {
        let doc: TemplateDocument =
            serde_json::from_str(r#"{"subject": "Hi {{name}}", "text": "Hello"}"#).unwrap();

        assert_eq!(doc.id, "");
        assert_eq!(doc.subject.as_deref(), Some("Hi {{name}}"));
        assert_eq!(doc.text.as_deref(), Some("Hello"));
        assert!(doc.html.is_none());
        assert!(doc.amp.is_none());
    }
}
