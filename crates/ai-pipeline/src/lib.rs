//! AI pipeline for papercut generation
//!
//! Turns a user prompt into a cut-paper style bitmap by driving a ComfyUI
//! Flux workflow, with a placeholder backend for when ComfyUI is unreachable.

pub mod backends;
pub mod error;
pub mod prompt;
pub mod workflow;

pub use backends::{
    ComfyUiConfig, ComfyUiGenerator, FallbackGenerator, PlaceholderGenerator,
};
pub use error::{ComfyError, Result};
pub use prompt::{build_full_prompt, output_filename, random_seed, MAX_SEED};
pub use workflow::Workflow;

use serde::{Deserialize, Serialize};

/// A request to generate one papercut image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// User supplied subject, e.g. "tiger" or a full sentence
    pub prompt: String,

    /// Fixed seed for reproducibility (None for random)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Result of a generation, still encoded as returned by the backend
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Encoded image bytes (PNG from ComfyUI and the placeholder)
    pub bytes: Vec<u8>,

    /// Prompt as typed by the user
    pub prompt: String,

    /// Prompt actually sent to the model
    pub full_prompt: String,

    /// Seed used for generation
    pub seed: u64,

    /// Suggested file name for the raw image
    pub filename: String,

    /// True when the image came from placeholder mode
    pub placeholder: bool,
}

impl GeneratedImage {
    /// Decode the bytes into an image
    pub fn decode(&self) -> Result<image::DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

/// Trait for image generation backends
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Check if the backend can currently serve requests
    async fn is_available(&self) -> bool;

    /// Generate an image for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;
}
