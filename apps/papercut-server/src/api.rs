/// REST API endpoints for papercut generation
/// Handles generation, record lookup, image serving and downloads

use ai_pipeline::{ComfyError, GenerationRequest};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use renderer::Scene;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::models::*;
use crate::storage::ImageKind;
use crate::studio::Studio;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    StorageError(String),
    GenerationFailed(String),
    ProcessingFailed(String),
    NotFound,
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::StorageError(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {}", e))
            }
            ApiError::GenerationFailed(e) => {
                (StatusCode::BAD_GATEWAY, format!("Generation failed: {}", e))
            }
            ApiError::ProcessingFailed(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Processing failed: {}", e))
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ComfyError> for ApiError {
    fn from(e: ComfyError) -> Self {
        match e {
            ComfyError::InvalidPrompt(msg) => ApiError::BadRequest(msg),
            other => ApiError::GenerationFailed(other.to_string()),
        }
    }
}

fn png(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

fn find(studio: &Studio, id: &str) -> Result<Generation, ApiError> {
    studio.store().get(id).ok_or(ApiError::NotFound)
}

fn read(studio: &Studio, kind: ImageKind, name: &str) -> Result<Vec<u8>, ApiError> {
    studio.store().read_image(kind, name).map_err(|e| {
        error!("failed to read {} {}: {}", kind.dir_name(), name, e);
        ApiError::StorageError(e.to_string())
    })
}

/// GET /api/health - Backend status
pub async fn health(State(studio): State<Arc<Studio>>) -> Json<HealthResponse> {
    let comfyui_available = studio.comfyui_available().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        comfyui_available,
        placeholder_mode: studio.placeholder_forced() || !comfyui_available,
        generations: studio.store().len(),
    })
}

/// POST /api/generate - Generate, process and store a papercut
pub async fn generate(
    State(studio): State<Arc<Studio>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Generation>, ApiError> {
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    }

    let mut request = GenerationRequest::new(prompt);
    request.seed = req.seed;

    let image = studio.generate_image(&request).await?;
    let processed = studio.process(&image).await.map_err(|e| {
        error!("failed to process generated image: {:#}", e);
        ApiError::ProcessingFailed(format!("{:#}", e))
    })?;
    studio.save(image, processed).map(Json).map_err(|e| {
        error!("failed to store generation: {:#}", e);
        ApiError::StorageError(format!("{:#}", e))
    })
}

/// GET /api/generations - All generations, newest first
pub async fn list_generations(State(studio): State<Arc<Studio>>) -> Json<Vec<Generation>> {
    Json(studio.store().list())
}

/// GET /api/generations/:id - Generation record
pub async fn get_generation(
    State(studio): State<Arc<Studio>>,
    Path(id): Path<String>,
) -> Result<Json<Generation>, ApiError> {
    find(&studio, &id).map(Json)
}

/// GET /api/generations/:id/image - Processed papercut PNG
pub async fn get_image(
    State(studio): State<Arc<Studio>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let generation = find(&studio, &id)?;
    read(&studio, ImageKind::Processed, &generation.processed_file).map(png)
}

/// GET /api/generations/:id/raw - Image as returned by the backend
pub async fn get_raw(
    State(studio): State<Arc<Studio>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let generation = find(&studio, &id)?;
    read(&studio, ImageKind::Raw, &generation.raw_file).map(png)
}

/// GET /api/generations/:id/download - Processed PNG as an attachment
pub async fn download(
    State(studio): State<Arc<Studio>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let generation = find(&studio, &id)?;
    let bytes = read(&studio, ImageKind::Processed, &generation.processed_file)?;
    let disposition = format!("attachment; filename=\"{}\"", generation.download_name);

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/generations/:id/scenes/:scene - Rendered mock-up PNG
pub async fn get_scene(
    State(studio): State<Arc<Studio>>,
    Path((id, scene)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let generation = find(&studio, &id)?;
    let scene: Scene = scene.parse().map_err(|_| ApiError::NotFound)?;
    if !generation.has_scene(scene.as_str()) {
        return Err(ApiError::NotFound);
    }
    read(&studio, ImageKind::Rendered, &generation.scene_file(scene.as_str())).map(png)
}

/// GET /api/effects - Registered effects and the active papercut stages
pub async fn list_effects(State(studio): State<Arc<Studio>>) -> Json<serde_json::Value> {
    let pipeline = studio.pipeline();
    Json(json!({
        "effects": pipeline.registry().descriptors(),
        "pipeline": pipeline.stages(),
        "options": pipeline.options(),
    }))
}
