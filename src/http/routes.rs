use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn events() -> Router<AppState> {
    Router::new()
        .route("/v1/events/thumbnails", post(handlers::generate_thumbnails))
        .route("/v1/events/resize", post(handlers::resize_image))
}
