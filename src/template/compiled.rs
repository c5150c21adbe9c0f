//! Compiled template renderers

use std::fmt;
use std::sync::Arc;

use handlebars::Handlebars;
use serde::Serialize;

use super::types::{EscapeMode, RenderedEmail, TemplateError, TemplateField, TemplateResult};
use crate::collection::TemplateDocument;

const TEMPLATE_NAME: &str = "template";

/// A template source compiled once and rendered many times.
///
/// Compilation failures are kept and reported on every render attempt, so a
/// malformed template only breaks the field it belongs to.
#[derive(Clone)]
pub struct CompiledTemplate {
    mode: EscapeMode,
    registry: Result<Arc<Handlebars<'static>>, Arc<handlebars::TemplateError>>,
}

impl CompiledTemplate {
    pub fn compile(source: &str, mode: EscapeMode) -> Self {
        let mut registry = Handlebars::new();
        if mode == EscapeMode::NoEscape {
            registry.register_escape_fn(handlebars::no_escape);
        }

        let registry = match registry.register_template_string(TEMPLATE_NAME, source) {
            Ok(()) => Ok(Arc::new(registry)),
            Err(e) => Err(Arc::new(e)),
        };

        Self { mode, registry }
    }

    /// Compilation error, if the source was malformed
    pub fn compile_error(&self) -> Option<&handlebars::TemplateError> {
        self.registry.as_ref().err().map(|e| e.as_ref())
    }

    pub fn render<T: Serialize>(&self, data: &T) -> TemplateResult<String> {
        let registry = self
            .registry
            .as_ref()
            .map_err(|e| TemplateError::Compile(Arc::clone(e)))?;

        Ok(registry.render(TEMPLATE_NAME, data)?)
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("mode", &self.mode)
            .field("valid", &self.registry.is_ok())
            .finish()
    }
}

/// Compiled renderers for one email template
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    pub subject: Option<CompiledTemplate>,
    pub html: Option<CompiledTemplate>,
    pub text: Option<CompiledTemplate>,
    pub amp: Option<CompiledTemplate>,
}

impl TemplateSet {
    /// Compile every non-empty field of a document
    pub fn compile(doc: &TemplateDocument) -> Self {
        let compile = |field: TemplateField| {
            doc.source(field)
                .map(|source| CompiledTemplate::compile(source, field.escape_mode()))
        };

        Self {
            subject: compile(TemplateField::Subject),
            html: compile(TemplateField::Html),
            text: compile(TemplateField::Text),
            amp: compile(TemplateField::Amp),
        }
    }

    pub fn get(&self, field: TemplateField) -> Option<&CompiledTemplate> {
        match field {
            TemplateField::Subject => self.subject.as_ref(),
            TemplateField::Html => self.html.as_ref(),
            TemplateField::Text => self.text.as_ref(),
            TemplateField::Amp => self.amp.as_ref(),
        }
    }

    /// Fields whose source failed to compile
    pub fn compile_errors(
        &self,
    ) -> impl Iterator<Item = (TemplateField, &handlebars::TemplateError)> + '_ {
        TemplateField::ALL.into_iter().filter_map(|field| {
            self.get(field)
                .and_then(CompiledTemplate::compile_error)
                .map(|e| (field, e))
        })
    }

    /// Render every present field; absent fields stay `None`
    pub fn render<T: Serialize>(&self, data: &T) -> TemplateResult<RenderedEmail> {
        let render = |template: &Option<CompiledTemplate>| {
            template.as_ref().map(|t| t.render(data)).transpose()
        };

        Ok(RenderedEmail {
            subject: render(&self.subject)?,
            html: render(&self.html)?,
            text: render(&self.text)?,
            amp: render(&self.amp)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_mode_escapes_values() {
        let template = CompiledTemplate::compile("<p>{{name}}</p>", EscapeMode::Html);

        let rendered = template.render(&json!({"name": "<b>Ana"})).unwrap();
        assert_eq!(rendered, "<p>&lt;b&gt;Ana</p>");
    }

    #[test]
    fn test_no_escape_mode_keeps_values() {
        let template = CompiledTemplate::compile("Hi {{name}} & co", EscapeMode::NoEscape);

        let rendered = template.render(&json!({"name": "<b>Ana</b>"})).unwrap();
        assert_eq!(rendered, "Hi <b>Ana</b> & co");
    }

    #[test]
    fn test_missing_value_renders_empty() {
        let template = CompiledTemplate::compile("Hi {{name}}!", EscapeMode::NoEscape);

        assert_eq!(template.render(&json!({})).unwrap(), "Hi !");
    }

    #[test]
    fn test_compile_error_surfaces_on_render() {
        let template = CompiledTemplate::compile("{{#if name}}Hi{{/each}}", EscapeMode::Html);

        assert!(template.compile_error().is_some());
        assert!(matches!(
            template.render(&json!({"name": "Ana"})),
            Err(TemplateError::Compile(_))
        ));
    }

    #[test]
    fn test_set_renders_only_present_fields() {
        let doc = TemplateDocument::new("welcome").subject("Hi {{name}}");
        let set = TemplateSet::compile(&doc);

        let rendered = set.render(&json!({"name": "Ana"})).unwrap();
        assert_eq!(
            rendered,
            RenderedEmail {
                subject: Some("Hi Ana".to_string()),
                html: None,
                text: None,
                amp: None,
            }
        );
    }

    #[test]
    fn test_set_skips_empty_sources() {
        let doc = TemplateDocument::new("welcome").text("").amp("<p>{{x}}</p>");
        let set = TemplateSet::compile(&doc);

        assert!(set.text.is_none());
        assert!(set.amp.is_some());
    }

    #[test]
    fn test_set_reports_broken_fields() {
        let doc = TemplateDocument::new("broken")
            .subject("ok")
            .html("{{#each items}}{{this}}{{/if}}");
        let set = TemplateSet::compile(&doc);

        let errors: Vec<_> = set.compile_errors().map(|(field, _)| field).collect();
        assert_eq!(errors, vec![TemplateField::Html]);
        assert!(set.render(&json!({})).is_err());
    }
}
