/// Recolor effect
///
/// Paints every visible pixel a single ink color, keeping its coverage.

use crate::{Effect, EffectCategory, EffectParameter, ParameterType};
use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;

pub struct RecolorEffect;

impl Effect for RecolorEffect {
    fn name(&self) -> &str {
        "recolor"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Stylize
    }

    fn parameters(&self) -> Vec<EffectParameter> {
        vec![
            EffectParameter::slider("red", "Red", 255.0, 0.0, 255.0, "Ink red channel")
                .with_type(ParameterType::Color),
            EffectParameter::slider("green", "Green", 0.0, 0.0, 255.0, "Ink green channel")
                .with_type(ParameterType::Color),
            EffectParameter::slider("blue", "Blue", 0.0, 0.0, 255.0, "Ink blue channel")
                .with_type(ParameterType::Color),
            EffectParameter::slider(
                "opacity",
                "Opacity",
                1.0,
                0.0,
                1.0,
                "Multiplier applied to the existing alpha",
            )
            .with_type(ParameterType::Percentage),
        ]
    }

    fn apply(&self, input: &RgbaImage, params: &HashMap<String, f32>) -> Result<RgbaImage> {
        let channel = |name: &str| self.get_param(params, name).clamp(0.0, 255.0) as u8;
        let color = [channel("red"), channel("green"), channel("blue")];
        Ok(recolor(input, color, self.get_param(params, "opacity")))
    }
}

/// Visible pixels take `color` with alpha `a * opacity` (truncated),
/// fully transparent pixels become (0, 0, 0, 0).
pub fn recolor(input: &RgbaImage, color: [u8; 3], opacity: f32) -> RgbaImage {
    let opacity = opacity.clamp(0.0, 1.0);
    let mut out = input.clone();
    for px in out.pixels_mut() {
        let a = px[3];
        px.0 = if a > 0 {
            [color[0], color[1], color[2], (a as f32 * opacity) as u8]
        } else {
            [0, 0, 0, 0]
        };
    }
    out
}
