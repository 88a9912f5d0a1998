/// Papercut Server Data Models
/// Generation records and request/response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finished generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Unique generation ID (uuid v4)
    pub id: String,

    /// Subject as typed by the user
    pub prompt: String,

    /// Prompt sent to the model
    pub full_prompt: String,

    /// Sampler seed (0 for placeholder images without a seed)
    pub seed: u64,

    /// Produced by placeholder mode rather than ComfyUI
    pub placeholder: bool,

    /// File name under image_raw/
    pub raw_file: String,

    /// File name under image_processed/
    pub processed_file: String,

    /// Name offered to the browser on download
    pub download_name: String,

    /// Scenes rendered under image_rendered/
    pub scenes: Vec<String>,

    /// SHA256 of the processed PNG
    pub sha256: String,

    pub width: u32,
    pub height: u32,

    pub created_at: DateTime<Utc>,
}

impl Generation {
    /// File name of a rendered scene under image_rendered/
    pub fn scene_file(&self, scene: &str) -> String {
        format!("{}_{}.png", self.id, scene)
    }

    pub fn has_scene(&self, scene: &str) -> bool {
        self.scenes.iter().any(|s| s == scene)
    }
}

/// POST /api/generate body
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// GET /api/health body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub comfyui_available: bool,
    pub placeholder_mode: bool,
    pub generations: usize,
}
