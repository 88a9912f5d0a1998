/// Papercut post-processing pipeline
///
/// Turns a generated illustration into a single-colour cut-out:
/// desaturate, boost contrast, optionally sharpen, key out the white
/// paper and paint what is left with the ink colour.

use crate::EffectRegistry;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PapercutOptions {
    /// Contrast multiplier around the mean gray level
    pub contrast: f32,
    /// Channels strictly above this are treated as paper
    pub threshold: u8,
    /// Ink colour
    pub color: [u8; 3],
    /// Alpha multiplier for the ink
    pub opacity: f32,
    /// Unsharp mask sigma, disabled when `None`
    pub sharpen: Option<f32>,
}

impl Default for PapercutOptions {
    fn default() -> Self {
        Self {
            contrast: 3.0,
            threshold: 230,
            color: [255, 0, 0],
            opacity: 1.0,
            sharpen: None,
        }
    }
}

impl PapercutOptions {
    /// Harsher preset for busy or low-contrast generations
    pub fn high_contrast() -> Self {
        Self {
            contrast: 10.0,
            threshold: 200,
            ..Self::default()
        }
    }
}

/// One named effect invocation
#[derive(Debug, Clone, Serialize)]
pub struct Stage {
    pub effect: String,
    pub params: HashMap<String, f32>,
}

impl Stage {
    fn new(effect: &str, params: &[(&str, f32)]) -> Self {
        Self {
            effect: effect.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

pub struct PapercutPipeline {
    registry: EffectRegistry,
    options: PapercutOptions,
}

impl PapercutPipeline {
    pub fn new(options: PapercutOptions) -> Self {
        Self::with_registry(EffectRegistry::with_defaults(), options)
    }

    pub fn with_registry(registry: EffectRegistry, options: PapercutOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &PapercutOptions {
        &self.options
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Stages in execution order
    pub fn stages(&self) -> Vec<Stage> {
        let o = &self.options;
        let mut stages = vec![
            Stage::new("saturation", &[("saturation", 0.0)]),
            Stage::new("contrast", &[("contrast", o.contrast)]),
        ];
        if let Some(sigma) = o.sharpen {
            stages.push(Stage::new("sharpen", &[("sigma", sigma), ("threshold", 0.0)]));
        }
        stages.push(Stage::new("white_key", &[("threshold", o.threshold as f32)]));
        stages.push(Stage::new(
            "recolor",
            &[
                ("red", o.color[0] as f32),
                ("green", o.color[1] as f32),
                ("blue", o.color[2] as f32),
                ("opacity", o.opacity),
            ],
        ));
        stages
    }

    pub fn process(&self, input: &DynamicImage) -> Result<RgbaImage> {
        self.process_rgba(input.to_rgba8())
    }

    pub fn process_rgba(&self, input: RgbaImage) -> Result<RgbaImage> {
        let (w, h) = input.dimensions();
        let mut image = input;
        for stage in self.stages() {
            debug!("papercut stage '{}' on {}x{}", stage.effect, w, h);
            image = self
                .registry
                .apply(&stage.effect, &image, &stage.params)
                .with_context(|| format!("papercut stage '{}' failed", stage.effect))?;
        }
        Ok(image)
    }

    /// Decode any supported image, process it and encode the result as PNG
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(bytes).context("failed to decode source image")?;
        let processed = self.process(&decoded)?;
        encode_png(&processed)
    }
}

impl Default for PapercutPipeline {
    fn default() -> Self {
        Self::new(PapercutOptions::default())
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .context("failed to encode PNG")?;
    Ok(buf.into_inner())
}
