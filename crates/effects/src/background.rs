/// White key effect
///
/// Knocks out near-white paper so only the cut shapes remain.

use crate::{Effect, EffectCategory, EffectParameter, ParameterType};
use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;

pub struct WhiteKeyEffect;

impl Effect for WhiteKeyEffect {
    fn name(&self) -> &str {
        "white_key"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Keying
    }

    fn parameters(&self) -> Vec<EffectParameter> {
        vec![EffectParameter::slider(
            "threshold",
            "Threshold",
            230.0,
            0.0,
            255.0,
            "Pixels with R, G and B all above this become transparent",
        )
        .with_type(ParameterType::Byte)]
    }

    fn apply(&self, input: &RgbaImage, params: &HashMap<String, f32>) -> Result<RgbaImage> {
        let threshold = self.get_param(params, "threshold").clamp(0.0, 255.0) as u8;
        Ok(remove_white_background(input, threshold))
    }
}

/// Zero the alpha of every pixel whose R, G and B are all strictly above `threshold`
pub fn remove_white_background(input: &RgbaImage, threshold: u8) -> RgbaImage {
    let mut out = input.clone();
    for px in out.pixels_mut() {
        if px[0] > threshold && px[1] > threshold && px[2] > threshold {
            px[3] = 0;
        }
    }
    out
}
