use crate::state::AppState;
use axum::Router;
use axum::routing::post;
use tower_http::limit::RequestBodyLimitLayer;

pub mod dto;
pub mod handler;
pub mod model;
pub mod service;

/// Command bodies are short text; anything larger is not a command.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ffmpeg", post(handler::execute_command))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}
