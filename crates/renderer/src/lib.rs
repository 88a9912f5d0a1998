use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

mod compose;
mod placeholder;

pub use compose::{render, rotate_expand, INK_COLOR};
pub use placeholder::{placeholder_scene, PLACEHOLDER_SIZE};

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Unknown scene: {0}")]
    UnknownScene(String),
    #[error("Papercut too small for {scene}: {width}x{height}")]
    EmptyPapercut {
        scene: Scene,
        width: u32,
        height: u32,
    },
    #[error("Background missing for {0}")]
    MissingBackground(Scene),
}

/// Mock-up scenes a papercut can be previewed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    Window,
    Wall,
    Door,
    Package,
}

impl Scene {
    pub const ALL: [Scene; 4] = [Scene::Window, Scene::Wall, Scene::Door, Scene::Package];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scene::Window => "window",
            Scene::Wall => "wall",
            Scene::Door => "door",
            Scene::Package => "package",
        }
    }

    /// Background photo expected in the assets directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Scene::Window => "Base_Window.jpg",
            Scene::Wall => "Base_wall.jpeg",
            Scene::Door => "Base_door.jpg",
            Scene::Package => "Base_package.jpg",
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scene {
    type Err = RendererError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "window" => Ok(Scene::Window),
            "wall" => Ok(Scene::Wall),
            "door" => Ok(Scene::Door),
            "package" => Ok(Scene::Package),
            other => Err(RendererError::UnknownScene(other.to_string())),
        }
    }
}

/// Background photos on disk, with generated stand-ins for missing ones
#[derive(Debug, Clone)]
pub struct SceneLibrary {
    assets_dir: PathBuf,
    use_placeholders: bool,
}

impl SceneLibrary {
    pub fn new(assets_dir: impl Into<PathBuf>, use_placeholders: bool) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            use_placeholders,
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn background_path(&self, scene: Scene) -> PathBuf {
        self.assets_dir.join(scene.file_name())
    }

    /// `Ok(None)` when the photo is missing and placeholders are disabled
    pub fn background(&self, scene: Scene) -> Result<Option<RgbImage>> {
        let path = self.background_path(scene);
        if path.exists() {
            let img = image::open(&path)
                .with_context(|| format!("failed to load background {}", path.display()))?;
            return Ok(Some(img.to_rgb8()));
        }
        if self.use_placeholders {
            debug!("{} missing, using placeholder scene", path.display());
            return Ok(Some(placeholder_scene(
                scene,
                PLACEHOLDER_SIZE,
                PLACEHOLDER_SIZE,
            )));
        }
        Ok(None)
    }

    pub fn render_scene(&self, scene: Scene, papercut: &RgbaImage) -> Result<RgbImage> {
        let background = self
            .background(scene)?
            .ok_or(RendererError::MissingBackground(scene))?;
        render(scene, papercut, &background)
    }

    /// Every scene that has a background; failures are logged and skipped
    pub fn render_all(&self, papercut: &DynamicImage) -> Vec<(Scene, RgbImage)> {
        let papercut = papercut.to_rgba8();
        Scene::ALL
            .iter()
            .filter_map(|&scene| match self.render_scene(scene, &papercut) {
                Ok(img) => Some((scene, img)),
                Err(e) => {
                    warn!("skipping {} scene: {:#}", scene, e);
                    None
                }
            })
            .collect()
    }
}
