//! Template listing and rendering endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::server::AppState;
use crate::template::{RenderedEmail, TemplateError};

#[derive(Debug, Serialize)]
pub struct TemplateErrorResponse {
    pub error: TemplateErrorInfo,
}

#[derive(Debug, Serialize)]
pub struct TemplateErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<TemplateError> for (StatusCode, Json<TemplateErrorResponse>) {
    fn from(err: TemplateError) -> Self {
        let (status, code) = match &err {
            TemplateError::NotFound(_) => (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND"),
            TemplateError::Compile(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "TEMPLATE_COMPILE_FAILED")
            }
            TemplateError::Render(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "TEMPLATE_RENDER_FAILED")
            }
        };

        tracing::warn!(code = %code, error = %err, "Template request failed");

        (
            status,
            Json(TemplateErrorResponse {
                error: TemplateErrorInfo {
                    code: code.to_string(),
                    message: err.to_string(),
                },
            }),
        )
    }
}

/// Response for listing templates
#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    /// Template names, sorted
    pub templates: Vec<String>,

    /// Total count
    pub total: usize,
}

/// GET /api/v1/templates - List loaded templates once the cache is ready
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(State(state): State<AppState>) -> Json<TemplateListResponse> {
    state.templates.wait_until_ready().await;

    let templates = state.templates.template_names();
    let total = templates.len();

    Json(TemplateListResponse { templates, total })
}

/// POST /api/v1/templates/{name}/render - Render a template with the JSON body as data
#[tracing::instrument(name = "http.render_template", skip(state, data))]
pub async fn render_template(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(data): Json<serde_json::Value>,
) -> Result<Json<RenderedEmail>, (StatusCode, Json<TemplateErrorResponse>)> {
    match state.templates.render(&name, &data).await {
        Ok(rendered) => Ok(Json(rendered)),
        Err(e) => Err(e.into()),
    }
}
