/// Saturation effect
///
/// factor 0 gives grayscale (RGB channels kept), 1 is the identity.

use crate::{lerp_u8, luma, Effect, EffectCategory, EffectParameter};
use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;

pub struct SaturationEffect;

impl Effect for SaturationEffect {
    fn name(&self) -> &str {
        "saturation"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::ColorCorrection
    }

    fn parameters(&self) -> Vec<EffectParameter> {
        vec![EffectParameter::slider(
            "saturation",
            "Saturation",
            1.0,
            0.0,
            2.0,
            "Color intensity, 0 removes all color",
        )]
    }

    fn apply(&self, input: &RgbaImage, params: &HashMap<String, f32>) -> Result<RgbaImage> {
        Ok(adjust_saturation(input, self.get_param(params, "saturation")))
    }
}

/// Blend every pixel with its own luma: `gray + factor * (c - gray)`
pub fn adjust_saturation(input: &RgbaImage, factor: f32) -> RgbaImage {
    let mut out = input.clone();
    for px in out.pixels_mut() {
        let [r, g, b, a] = px.0;
        let gray = luma(r, g, b);
        px.0 = [
            lerp_u8(gray, r, factor),
            lerp_u8(gray, g, factor),
            lerp_u8(gray, b, factor),
            a,
        ];
    }
    out
}

/// Saturation 0
pub fn desaturate(input: &RgbaImage) -> RgbaImage {
    adjust_saturation(input, 0.0)
}
