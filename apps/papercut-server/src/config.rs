/// Server configuration
/// JSON file with command line / environment overrides

use ai_pipeline::ComfyUiConfig;
use anyhow::Context;
use clap::Parser;
use effects::PapercutOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,

    /// Records and images live here
    pub data_dir: PathBuf,

    /// Scene background photos (Base_Window.jpg, ...)
    pub assets_dir: PathBuf,

    /// Sample image served in placeholder mode (built-in art when None)
    pub placeholder_image: Option<PathBuf>,

    /// Skip ComfyUI entirely
    pub force_placeholder: bool,

    /// Draw stand-in backgrounds for missing scene photos
    pub scene_placeholders: bool,

    pub comfyui: ComfyUiConfig,

    pub papercut: PapercutOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            data_dir: PathBuf::from("papercut_data"),
            assets_dir: PathBuf::from("assets"),
            placeholder_image: None,
            force_placeholder: false,
            scene_placeholders: true,
            comfyui: ComfyUiConfig::default(),
            papercut: PapercutOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Config file (if any) with CLI flags applied on top
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        cli.apply(&mut config);
        Ok(config)
    }
}

#[derive(Debug, Parser)]
#[command(name = "papercut-server")]
#[command(about = "Papercut generation server - ComfyUI Flux to cut-paper mock-ups")]
#[command(version)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, env = "PAPERCUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3000
    #[arg(long, env = "PAPERCUT_ADDR")]
    pub addr: Option<String>,

    /// ComfyUI base URL
    #[arg(long, env = "PAPERCUT_COMFYUI_URL")]
    pub comfyui_url: Option<String>,

    /// Data directory
    #[arg(long, env = "PAPERCUT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Serve the placeholder image instead of calling ComfyUI
    #[arg(long, env = "PAPERCUT_PLACEHOLDER")]
    pub placeholder: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(addr) = &self.addr {
            config.addr = addr.clone();
        }
        if let Some(url) = &self.comfyui_url {
            config.comfyui.api_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if self.placeholder {
            config.force_placeholder = true;
        }
    }
}
