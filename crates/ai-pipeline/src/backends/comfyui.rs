/// ComfyUI backend integration
///
/// Submits the Flux papercut workflow, polls `/history` at a fixed interval
/// until the prompt has outputs, then downloads the first image via `/view`.
use super::ComfyUiConfig;
use crate::workflow::Workflow;
use crate::{
    build_full_prompt, output_filename, random_seed, ComfyError, GeneratedImage,
    GenerationRequest, ImageGenerator, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Low level ComfyUI HTTP client
pub struct ComfyUiClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl ComfyUiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server answers
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/system_stats", self.base_url))
            .timeout(Duration::from_secs(3))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Queue a workflow, returning its prompt id
    pub async fn queue_prompt(&self, workflow: &Workflow) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&QueuePromptRequest {
                prompt: workflow.to_value(),
                client_id: self.client_id.clone(),
            })
            .send()
            .await?;

        let response = check_status(response).await?;
        let queued: QueueResponse = response.json().await?;
        Ok(queued.prompt_id)
    }

    /// History entry for a prompt, None while it is still queued or running
    pub async fn get_history(&self, prompt_id: &str) -> Result<Option<PromptHistory>> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id))
            .send()
            .await?;

        let response = check_status(response).await?;
        let mut history: HashMap<String, PromptHistory> = response.json().await?;
        Ok(history.remove(prompt_id))
    }

    /// Download a generated image
    pub async fn get_image(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(format!("{}/view", self.base_url))
            .query(&[
                ("filename", image.filename.as_str()),
                ("subfolder", image.subfolder.as_str()),
                ("type", image.folder_type.as_str()),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Poll history until the prompt finished with outputs, failed, or timed out
    pub async fn wait_for_outputs(
        &self,
        prompt_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<PromptHistory> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(entry) = self.get_history(prompt_id).await? {
                if let Some(message) = entry.error_message() {
                    return Err(ComfyError::Execution(message));
                }
                if entry.has_images() {
                    return Ok(entry);
                }
                if entry.is_completed() {
                    return Err(ComfyError::NoImages);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ComfyError::Timeout(timeout.as_secs()));
            }
            debug!("prompt {} not finished, polling again", prompt_id);
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ComfyError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Generator running the papercut workflow on ComfyUI
pub struct ComfyUiGenerator {
    config: ComfyUiConfig,
    client: ComfyUiClient,
}

impl ComfyUiGenerator {
    pub fn new(config: ComfyUiConfig) -> Result<Self> {
        let client = ComfyUiClient::new(&config.api_url)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ComfyUiConfig {
        &self.config
    }

    /// Fresh copy of the workflow for every job
    fn load_workflow(&self) -> Result<Workflow> {
        match &self.config.workflow_path {
            Some(path) => Workflow::load(path),
            None => Ok(Workflow::flux_default()),
        }
    }
}

#[async_trait::async_trait]
impl ImageGenerator for ComfyUiGenerator {
    fn name(&self) -> &str {
        "ComfyUI"
    }

    async fn is_available(&self) -> bool {
        self.client.is_available().await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let full_prompt = build_full_prompt(&request.prompt)?;
        let seed = request.seed.unwrap_or_else(random_seed);

        let mut workflow = self.load_workflow()?;
        workflow.prepare(&full_prompt, seed)?;

        let prompt_id = self.client.queue_prompt(&workflow).await?;
        info!("Queued ComfyUI prompt {} (seed {})", prompt_id, seed);

        let entry = self
            .client
            .wait_for_outputs(
                &prompt_id,
                self.config.poll_interval(),
                self.config.timeout(),
            )
            .await?;

        let image_ref = entry
            .select_image(&workflow.node_ids(&self.config.output_node_title))
            .ok_or(ComfyError::NoImages)?;
        let bytes = self.client.get_image(image_ref).await?;
        info!("Downloaded {} ({} bytes)", image_ref.filename, bytes.len());

        let prompt = request.prompt.trim().to_string();
        let generated = GeneratedImage {
            bytes,
            filename: output_filename(&prompt, chrono::Utc::now().timestamp()),
            prompt,
            full_prompt,
            seed,
            placeholder: false,
        };

        // a proxy or a broken node can answer /view with something else
        generated.decode()?;
        Ok(generated)
    }
}

#[derive(Debug, Serialize)]
struct QueuePromptRequest {
    prompt: serde_json::Value,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

/// ComfyUI history entry
#[derive(Debug, Clone, Deserialize)]
pub struct PromptHistory {
    #[serde(default)]
    pub outputs: HashMap<String, NodeOutput>,
    #[serde(default)]
    pub status: Option<PromptStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeOutput {
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// Reference to an image stored by ComfyUI
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_folder_type")]
    pub folder_type: String,
}

fn default_folder_type() -> String {
    "output".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptStatus {
    #[serde(default)]
    pub status_str: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

impl PromptHistory {
    fn has_images(&self) -> bool {
        self.outputs.values().any(|o| !o.images.is_empty())
    }

    fn is_completed(&self) -> bool {
        self.status.as_ref().map(|s| s.completed).unwrap_or(false)
    }

    /// Error text when ComfyUI reports `status_str == "error"`
    fn error_message(&self) -> Option<String> {
        let status = self.status.as_ref()?;
        if status.status_str != "error" {
            return None;
        }

        // messages look like [["execution_error", {"exception_message": "..."}], ...]
        let detail = status.messages.iter().find_map(|m| {
            let pair = m.as_array()?;
            if pair.first()?.as_str()? != "execution_error" {
                return None;
            }
            pair.get(1)?
                .get("exception_message")?
                .as_str()
                .map(str::to_string)
        });
        Some(detail.unwrap_or_else(|| "execution error".to_string()))
    }

    /// First image of the preferred nodes, else of any node (by id order)
    pub fn select_image(&self, preferred: &[String]) -> Option<&ImageRef> {
        for id in preferred {
            if let Some(image) = self.outputs.get(id).and_then(|o| o.images.first()) {
                return Some(image);
            }
        }

        let mut ids: Vec<&String> = self.outputs.keys().collect();
        ids.sort();
        ids.into_iter()
            .find_map(|id| self.outputs.get(id).and_then(|o| o.images.first()))
    }
}
