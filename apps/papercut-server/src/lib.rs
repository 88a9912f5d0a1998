//! Papercut Server
//! REST API turning text prompts into cut-paper art and scene mock-ups

pub mod api;
pub mod config;
pub mod models;
pub mod storage;
pub mod studio;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Cli, ServerConfig};
pub use studio::Studio;

/// Build the API router
pub fn router(studio: Arc<Studio>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/generate", post(api::generate))
        .route("/api/generations", get(api::list_generations))
        .route("/api/generations/:id", get(api::get_generation))
        .route("/api/generations/:id/image", get(api::get_image))
        .route("/api/generations/:id/raw", get(api::get_raw))
        .route("/api/generations/:id/download", get(api::download))
        .route("/api/generations/:id/scenes/:scene", get(api::get_scene))
        .route("/api/effects", get(api::list_effects))
        .layer(TraceLayer::new_for_http())
        // CORS for local development
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(studio)
}
