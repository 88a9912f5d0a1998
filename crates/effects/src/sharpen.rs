/// Sharpen effect (unsharp mask)

use crate::{Effect, EffectCategory, EffectParameter};
use anyhow::Result;
use image::{imageops, RgbaImage};
use std::collections::HashMap;

pub struct SharpenEffect;

impl Effect for SharpenEffect {
    fn name(&self) -> &str {
        "sharpen"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Sharpen
    }

    fn parameters(&self) -> Vec<EffectParameter> {
        vec![
            EffectParameter::slider("sigma", "Radius", 1.0, 0.1, 10.0, "Blur radius of the mask"),
            EffectParameter::slider(
                "threshold",
                "Threshold",
                0.0,
                0.0,
                255.0,
                "Minimum difference before a pixel is sharpened",
            ),
        ]
    }

    fn apply(&self, input: &RgbaImage, params: &HashMap<String, f32>) -> Result<RgbaImage> {
        let sigma = self.get_param(params, "sigma");
        let threshold = self.get_param(params, "threshold") as i32;
        Ok(sharpen_edges(input, sigma, threshold))
    }
}

/// Unsharp mask on the RGB channels. Alpha is left as it was so keyed
/// areas stay exactly transparent.
pub fn sharpen_edges(input: &RgbaImage, sigma: f32, threshold: i32) -> RgbaImage {
    if sigma <= 0.0 || input.width() == 0 || input.height() == 0 {
        return input.clone();
    }
    let mut out = imageops::unsharpen(input, sigma, threshold);
    for (dst, src) in out.pixels_mut().zip(input.pixels()) {
        dst[3] = src[3];
    }
    out
}
