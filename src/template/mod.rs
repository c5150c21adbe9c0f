//! Email template cache.
//!
//! This module provides:
//! - Compiled Handlebars renderers for the subject, HTML, text and AMP parts of an email
//! - A cache that keeps those renderers in sync with a template collection
//! - Readiness gating: renders issued before the first load wait for it
//!
//! Subject and text parts insert values verbatim; HTML and AMP parts escape them.
//!
//! # Example
//!
//! ```ignore
//! let collection = MemoryCollection::new();
//! let cache = TemplateCache::new(&collection);
//!
//! collection.upsert(
//!     TemplateDocument::new("welcome")
//!         .subject("Hi {{name}}")
//!         .text("Hello {{name}}"),
//! );
//!
//! let email = cache.render("welcome", &json!({"name": "Ana"})).await?;
//! assert_eq!(email.subject.as_deref(), Some("Hi Ana"));
//! assert_eq!(email.html, None);
//! ```

mod cache;
mod compiled;
mod ready;
mod types;

pub use cache::{CacheStats, TemplateCache};
pub use compiled::{CompiledTemplate, TemplateSet};
pub use ready::ReadySignal;
pub use types::{EscapeMode, RenderedEmail, TemplateError, TemplateField, TemplateResult};
