use std::sync::Arc;

use crate::config::Settings;
use crate::template::TemplateCache;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub templates: Arc<TemplateCache>,
}

impl AppState {
    pub fn new(settings: Settings, templates: Arc<TemplateCache>) -> Self {
        Self {
            settings: Arc::new(settings),
            templates,
        }
    }
}
