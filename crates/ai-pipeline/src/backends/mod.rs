/// Generation backends
///
/// - ComfyUI running a Flux workflow (local or remote)
/// - Placeholder sample image
/// - Fallback wrapper that switches to the placeholder when ComfyUI fails

pub mod comfyui;
pub mod placeholder;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub use comfyui::{ComfyUiClient, ComfyUiGenerator};
pub use placeholder::PlaceholderGenerator;

use crate::{ComfyError, GeneratedImage, GenerationRequest, ImageGenerator, Result};

/// ComfyUI connection and polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfyUiConfig {
    /// Base URL of the ComfyUI server
    pub api_url: String,

    /// API-format workflow file (None for the built-in Flux graph)
    pub workflow_path: Option<PathBuf>,

    /// Delay between history polls
    pub poll_interval_ms: u64,

    /// Give up waiting for a prompt after this many seconds
    pub timeout_secs: u64,

    /// Title of the node whose images are downloaded
    pub output_node_title: String,
}

impl Default for ComfyUiConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8188".to_string(),
            workflow_path: None,
            poll_interval_ms: 1000,
            timeout_secs: 300,
            output_node_title: crate::workflow::SAVE_IMAGE_NODE.to_string(),
        }
    }
}

impl ComfyUiConfig {
    /// With API endpoint
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// With workflow file
    pub fn with_workflow(mut self, path: PathBuf) -> Self {
        self.workflow_path = Some(path);
        self
    }

    /// With polling interval and timeout
    pub fn with_polling(mut self, interval_ms: u64, timeout_secs: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Save configuration to JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Placeholder mode: serve a sample image whenever the primary backend
/// is unavailable, fails, or placeholder mode is forced.
pub struct FallbackGenerator {
    primary: Box<dyn ImageGenerator>,
    placeholder: PlaceholderGenerator,
    force_placeholder: bool,
}

impl FallbackGenerator {
    pub fn new(primary: Box<dyn ImageGenerator>, placeholder: PlaceholderGenerator) -> Self {
        Self {
            primary,
            placeholder,
            force_placeholder: false,
        }
    }

    /// Always answer with the placeholder
    pub fn force_placeholder(mut self, force: bool) -> Self {
        self.force_placeholder = force;
        self
    }

    pub fn is_forced(&self) -> bool {
        self.force_placeholder
    }

    /// Whether the primary backend answers right now
    pub async fn primary_available(&self) -> bool {
        !self.force_placeholder && self.primary.is_available().await
    }
}

#[async_trait::async_trait]
impl ImageGenerator for FallbackGenerator {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        if self.force_placeholder {
            return self.placeholder.generate(request).await;
        }

        if !self.primary.is_available().await {
            warn!(
                "{} is not reachable, using placeholder image",
                self.primary.name()
            );
            return self.placeholder.generate(request).await;
        }

        match self.primary.generate(request).await {
            Ok(image) => Ok(image),
            Err(e @ ComfyError::InvalidPrompt(_)) => Err(e),
            Err(e) => {
                warn!("{} generation failed: {}, using placeholder image", self.primary.name(), e);
                self.placeholder.generate(request).await
            }
        }
    }
}
