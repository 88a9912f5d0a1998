//! ComfyUI workflow graphs (API format)
//!
//! A workflow is a map of node id to `{ class_type, inputs, _meta.title }`.
//! Nodes are addressed by their title so that exported workflows can be
//! swapped in without code changes.

use crate::{ComfyError, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

/// Title of the sampler node that receives the seed
pub const SAMPLER_NODE: &str = "KSampler";
/// Title of the Flux text encoder receiving the prompt
pub const TEXT_ENCODER_NODE: &str = "CLIPTextEncodeFlux";
/// Title of the node whose images are collected
pub const SAVE_IMAGE_NODE: &str = "Save Image";

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    nodes: Map<String, Value>,
}

impl Workflow {
    /// Parse an API-format workflow
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                if map.get("nodes").map(Value::is_array).unwrap_or(false) {
                    return Err(ComfyError::Workflow(
                        "workflow is in UI format, export it with 'Save (API Format)'".into(),
                    ));
                }
                Ok(Self { nodes: map })
            }
            _ => Err(ComfyError::Workflow("workflow must be a JSON object".into())),
        }
    }

    /// Load an API-format workflow from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_value(serde_json::from_str(&json)?)
    }

    /// Built-in Flux text-to-image graph
    pub fn flux_default() -> Self {
        let graph = json!({
            "3": {
                "inputs": {
                    "seed": 1,
                    "steps": 20,
                    "cfg": 1.0,
                    "sampler_name": "euler",
                    "scheduler": "simple",
                    "denoise": 1.0,
                    "model": ["12", 0],
                    "positive": ["6", 0],
                    "negative": ["7", 0],
                    "latent_image": ["5", 0]
                },
                "class_type": "KSampler",
                "_meta": { "title": SAMPLER_NODE }
            },
            "5": {
                "inputs": { "width": 1024, "height": 1024, "batch_size": 1 },
                "class_type": "EmptyLatentImage",
                "_meta": { "title": "Empty Latent Image" }
            },
            "6": {
                "inputs": {
                    "clip_l": "",
                    "t5xxl": "",
                    "guidance": 3.5,
                    "clip": ["11", 0]
                },
                "class_type": "CLIPTextEncodeFlux",
                "_meta": { "title": TEXT_ENCODER_NODE }
            },
            "7": {
                "inputs": { "text": "", "clip": ["11", 0] },
                "class_type": "CLIPTextEncode",
                "_meta": { "title": "Negative Prompt" }
            },
            "8": {
                "inputs": { "samples": ["3", 0], "vae": ["10", 0] },
                "class_type": "VAEDecode",
                "_meta": { "title": "VAE Decode" }
            },
            "9": {
                "inputs": { "filename_prefix": "papercut", "images": ["8", 0] },
                "class_type": "SaveImage",
                "_meta": { "title": SAVE_IMAGE_NODE }
            },
            "10": {
                "inputs": { "vae_name": "ae.safetensors" },
                "class_type": "VAELoader",
                "_meta": { "title": "Load VAE" }
            },
            "11": {
                "inputs": {
                    "clip_name1": "t5xxl_fp8_e4m3fn.safetensors",
                    "clip_name2": "clip_l.safetensors",
                    "type": "flux"
                },
                "class_type": "DualCLIPLoader",
                "_meta": { "title": "DualCLIPLoader" }
            },
            "12": {
                "inputs": { "unet_name": "flux1-dev.safetensors", "weight_dtype": "default" },
                "class_type": "UNETLoader",
                "_meta": { "title": "Load Diffusion Model" }
            }
        });

        match graph {
            Value::Object(nodes) => Self { nodes },
            _ => unreachable!("json! object literal"),
        }
    }

    /// Ids of nodes matching `title`, by `_meta.title` first and `class_type` second
    pub fn node_ids(&self, title: &str) -> Vec<String> {
        let ids = self.ids_where(|node| {
            node.pointer("/_meta/title").and_then(Value::as_str) == Some(title)
        });
        if !ids.is_empty() {
            return ids;
        }
        self.ids_where(|node| node.get("class_type").and_then(Value::as_str) == Some(title))
    }

    fn ids_where(&self, pred: impl Fn(&Value) -> bool) -> Vec<String> {
        let mut ids: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| pred(node))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Set `inputs.param` on every node matching `title`
    pub fn set_node_param(&mut self, title: &str, param: &str, value: Value) -> Result<usize> {
        let ids = self.node_ids(title);
        if ids.is_empty() {
            return Err(ComfyError::Workflow(format!("no node titled '{}'", title)));
        }

        for id in &ids {
            let inputs = self
                .nodes
                .get_mut(id)
                .and_then(Value::as_object_mut)
                .map(|node| {
                    node.entry("inputs")
                        .or_insert_with(|| Value::Object(Map::new()))
                })
                .and_then(Value::as_object_mut)
                .ok_or_else(|| ComfyError::Workflow(format!("node {} has no inputs", id)))?;
            inputs.insert(param.to_string(), value.clone());
        }

        Ok(ids.len())
    }

    /// Read `inputs.param` of the first node matching `title`
    pub fn node_param(&self, title: &str, param: &str) -> Option<&Value> {
        let id = self.node_ids(title).into_iter().next()?;
        self.nodes.get(&id)?.get("inputs")?.get(param)
    }

    /// Inject the seed and the full prompt into the graph
    pub fn prepare(&mut self, full_prompt: &str, seed: u64) -> Result<()> {
        self.set_node_param(SAMPLER_NODE, "seed", json!(seed))?;
        self.set_node_param(TEXT_ENCODER_NODE, "clip_l", json!(full_prompt))?;
        self.set_node_param(TEXT_ENCODER_NODE, "t5xxl", json!(full_prompt))?;
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.nodes.clone())
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::flux_default()
    }
}
