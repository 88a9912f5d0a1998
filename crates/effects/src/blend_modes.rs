/// Color blend mode
///
/// Keeps the value (brightness) of the base pixel and takes hue and
/// saturation from a flat color layer.

use crate::{Effect, EffectCategory, EffectParameter, ParameterType};
use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;

pub struct ColorBlendEffect;

impl Effect for ColorBlendEffect {
    fn name(&self) -> &str {
        "color_blend"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Stylize
    }

    fn parameters(&self) -> Vec<EffectParameter> {
        vec![
            EffectParameter::slider("red", "Red", 255.0, 0.0, 255.0, "Blend layer red")
                .with_type(ParameterType::Color),
            EffectParameter::slider("green", "Green", 0.0, 0.0, 255.0, "Blend layer green")
                .with_type(ParameterType::Color),
            EffectParameter::slider("blue", "Blue", 0.0, 0.0, 255.0, "Blend layer blue")
                .with_type(ParameterType::Color),
        ]
    }

    fn apply(&self, input: &RgbaImage, params: &HashMap<String, f32>) -> Result<RgbaImage> {
        let channel = |name: &str| self.get_param(params, name).clamp(0.0, 255.0) as u8;
        Ok(apply_color_blend(
            input,
            [channel("red"), channel("green"), channel("blue")],
        ))
    }
}

/// Hue and saturation from `color`, value from each base pixel. Alpha kept.
pub fn apply_color_blend(input: &RgbaImage, color: [u8; 3]) -> RgbaImage {
    let (h, s, _) = rgb_to_hsv(color);
    let mut out = input.clone();
    for px in out.pixels_mut() {
        let v = px[0].max(px[1]).max(px[2]) as f32 / 255.0;
        let [r, g, b] = hsv_to_rgb(h, s, v);
        px.0 = [r, g, b, px[3]];
    }
    out
}

/// Hue in [0, 1), saturation and value in [0, 1]
fn rgb_to_hsv([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if max <= 0.0 || delta <= 0.0 {
        return (0.0, 0.0, max);
    }

    let s = delta / max;
    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    (h / 6.0, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let to_u8 = |c: f32| (c * 255.0 + 0.5).clamp(0.0, 255.0) as u8;
    if s <= 0.0 {
        let c = to_u8(v);
        return [c, c, c];
    }

    let h6 = (h * 6.0).rem_euclid(6.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), (0.0, 1.0, 1.0));
        let (h, s, v) = rgb_to_hsv([0, 255, 0]);
        assert!((h - 1.0 / 3.0).abs() < 1e-5);
        assert_eq!((s, v), (1.0, 1.0));
        assert_eq!(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), [0, 0, 255]);
    }

    #[test]
    fn test_gray_takes_color_hue() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([200, 200, 200, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 90]));

        let out = apply_color_blend(&img, [255, 0, 0]);
        assert_eq!(*out.get_pixel(0, 0), Rgba([200, 0, 0, 255]));
        assert_eq!(*out.get_pixel(1, 0), Rgba([0, 0, 0, 90]));
    }

    #[test]
    fn test_gray_color_keeps_value() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([10, 120, 60, 255]));
        let out = apply_color_blend(&img, [128, 128, 128]);
        assert_eq!(*out.get_pixel(0, 0), Rgba([120, 120, 120, 255]));
    }
}
