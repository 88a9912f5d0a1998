/// Contrast effect
///
/// Pushes channels away from the mean luma of the whole image.

use crate::{lerp_u8, luma, Effect, EffectCategory, EffectParameter};
use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;

pub struct ContrastEffect;

impl Effect for ContrastEffect {
    fn name(&self) -> &str {
        "contrast"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::ColorCorrection
    }

    fn parameters(&self) -> Vec<EffectParameter> {
        vec![EffectParameter::slider(
            "contrast",
            "Contrast",
            1.0,
            0.0,
            10.0,
            "Contrast multiplier around the mean gray level",
        )]
    }

    fn apply(&self, input: &RgbaImage, params: &HashMap<String, f32>) -> Result<RgbaImage> {
        Ok(adjust_contrast(input, self.get_param(params, "contrast")))
    }
}

/// Rounded mean luma of all pixels (alpha ignored)
pub fn mean_luma(input: &RgbaImage) -> u8 {
    let count = input.width() as u64 * input.height() as u64;
    if count == 0 {
        return 0;
    }
    let sum: u64 = input
        .pixels()
        .map(|px| luma(px[0], px[1], px[2]) as u64)
        .sum();
    ((sum as f64 / count as f64) + 0.5) as u8
}

/// `mean + factor * (c - mean)` per channel, alpha kept
pub fn adjust_contrast(input: &RgbaImage, factor: f32) -> RgbaImage {
    let mean = mean_luma(input);
    let mut out = input.clone();
    for px in out.pixels_mut() {
        let [r, g, b, a] = px.0;
        px.0 = [
            lerp_u8(mean, r, factor),
            lerp_u8(mean, g, factor),
            lerp_u8(mean, b, factor),
            a,
        ];
    }
    out
}
