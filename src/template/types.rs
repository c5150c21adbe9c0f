//! Template types and error definitions

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("tried to render non-existent template '{0}'")]
    NotFound(String),

    /// Malformed template source, reported by the engine when the field is rendered
    #[error(transparent)]
    Compile(Arc<handlebars::TemplateError>),

    #[error(transparent)]
    Render(#[from] handlebars::RenderError),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// How interpolated values are written into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// HTML-sensitive characters are replaced with entities
    Html,
    /// Values are inserted verbatim
    NoEscape,
}

/// One of the four renderable parts of an email template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateField {
    Subject,
    Html,
    Text,
    Amp,
}

impl TemplateField {
    pub const ALL: [TemplateField; 4] = [
        TemplateField::Subject,
        TemplateField::Html,
        TemplateField::Text,
        TemplateField::Amp,
    ];

    /// Subject lines and plain text are never HTML-escaped
    pub fn escape_mode(self) -> EscapeMode {
        match self {
            TemplateField::Subject | TemplateField::Text => EscapeMode::NoEscape,
            TemplateField::Html | TemplateField::Amp => EscapeMode::Html,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateField::Subject => "subject",
            TemplateField::Html => "html",
            TemplateField::Text => "text",
            TemplateField::Amp => "amp",
        }
    }
}

impl fmt::Display for TemplateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of rendering a template set; fields without a template are `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    pub amp: Option<String>,
}
