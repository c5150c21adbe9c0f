//! API layer - HTTP endpoint handlers.

mod health;
mod routes;
mod template;

pub use health::{health, HealthResponse};
pub use routes::api_routes;
pub use template::{list_templates, render_template, TemplateErrorResponse, TemplateListResponse};
