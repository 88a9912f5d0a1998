// Error types for the generation pipeline

use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, ComfyError>;

/// Errors that can occur while talking to ComfyUI or preparing a job
#[derive(Error, Debug)]
pub enum ComfyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ComfyUI API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Timed out after {0}s waiting for ComfyUI")]
    Timeout(u64),

    #[error("ComfyUI reported a failed execution: {0}")]
    Execution(String),

    #[error("No images returned from ComfyUI")]
    NoImages,

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<image::ImageError> for ComfyError {
    fn from(err: image::ImageError) -> Self {
        ComfyError::ImageProcessing(err.to_string())
    }
}
