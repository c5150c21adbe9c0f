use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::health;
use super::template::{list_templates, render_template};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api/v1",
            Router::new()
                .route("/templates", get(list_templates))
                .route("/templates/{name}/render", post(render_template)),
        )
}
