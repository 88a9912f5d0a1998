/// CPU image effects for papercut post-processing
///
/// Every effect maps an RGBA bitmap to a new RGBA bitmap of the same size.

use anyhow::{anyhow, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Effect trait - all effects must implement this
pub trait Effect: Send + Sync {
    /// Effect name (unique identifier)
    fn name(&self) -> &str;

    /// Effect category
    fn category(&self) -> EffectCategory;

    /// Effect parameters
    fn parameters(&self) -> Vec<EffectParameter>;

    /// Apply effect to an image
    fn apply(&self, input: &RgbaImage, params: &HashMap<String, f32>) -> Result<RgbaImage>;

    /// Get parameter value (with default if not set)
    fn get_param(&self, params: &HashMap<String, f32>, name: &str) -> f32 {
        params.get(name).copied().unwrap_or_else(|| {
            self.parameters()
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.default)
                .unwrap_or(0.0)
        })
    }
}

/// Effect category for UI organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectCategory {
    ColorCorrection,
    Stylize,
    Sharpen,
    Keying,
}

/// Effect parameter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectParameter {
    pub name: String,
    pub display_name: String,
    pub param_type: ParameterType,
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub description: String,
}

impl EffectParameter {
    pub fn slider(name: &str, display_name: &str, default: f32, min: f32, max: f32, description: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            param_type: ParameterType::Slider,
            default,
            min,
            max,
            description: description.to_string(),
        }
    }

    pub fn with_type(mut self, param_type: ParameterType) -> Self {
        self.param_type = param_type;
        self
    }
}

/// Parameter type for UI rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParameterType {
    Slider,
    Percentage, // 0-1
    Color,      // one 0-255 channel
    Byte,       // 0-255 threshold
}

/// Serializable summary of a registered effect
#[derive(Debug, Clone, Serialize)]
pub struct EffectDescriptor {
    pub name: String,
    pub category: EffectCategory,
    pub parameters: Vec<EffectParameter>,
}

/// Effect registry - named effects available to pipelines
pub struct EffectRegistry {
    effects: HashMap<String, Box<dyn Effect>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self {
            effects: HashMap::new(),
        }
    }

    /// Registry holding every built-in effect
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SaturationEffect));
        registry.register(Box::new(ContrastEffect));
        registry.register(Box::new(SharpenEffect));
        registry.register(Box::new(WhiteKeyEffect));
        registry.register(Box::new(RecolorEffect));
        registry.register(Box::new(ColorBlendEffect));
        registry
    }

    /// Register an effect
    pub fn register(&mut self, effect: Box<dyn Effect>) {
        let name = effect.name().to_string();
        self.effects.insert(name, effect);
    }

    /// Get effect by name
    pub fn get(&self, name: &str) -> Option<&dyn Effect> {
        self.effects.get(name).map(|e| e.as_ref())
    }

    /// Apply a named effect
    pub fn apply(
        &self,
        name: &str,
        input: &RgbaImage,
        params: &HashMap<String, f32>,
    ) -> Result<RgbaImage> {
        let effect = self
            .get(name)
            .ok_or_else(|| anyhow!("unknown effect '{}'", name))?;
        effect.apply(input, params)
    }

    /// List all effect names, sorted
    pub fn list_effects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.effects.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get effects by category
    pub fn effects_in_category(&self, category: EffectCategory) -> Vec<&dyn Effect> {
        self.effects
            .values()
            .filter(|e| e.category() == category)
            .map(|e| e.as_ref())
            .collect()
    }

    /// Descriptors for every effect, sorted by name
    pub fn descriptors(&self) -> Vec<EffectDescriptor> {
        self.list_effects()
            .into_iter()
            .filter_map(|name| self.get(name))
            .map(|e| EffectDescriptor {
                name: e.name().to_string(),
                category: e.category(),
                parameters: e.parameters(),
            })
            .collect()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// ITU-R 601-2 luma, rounded the same way as common imaging libraries
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// `a + t * (b - a)` truncated into 0..=255
#[inline]
pub(crate) fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let v = a as f32 + t * (b as f32 - a as f32);
    if v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        v as u8
    }
}

pub mod background;
pub mod blend_modes;
pub mod contrast;
pub mod papercut;
pub mod recolor;
pub mod saturation;
pub mod sharpen;

// Re-exports
pub use background::{remove_white_background, WhiteKeyEffect};
pub use blend_modes::{apply_color_blend, ColorBlendEffect};
pub use contrast::{adjust_contrast, ContrastEffect};
pub use papercut::{encode_png, PapercutOptions, PapercutPipeline, Stage};
pub use recolor::{recolor, RecolorEffect};
pub use saturation::{adjust_saturation, desaturate, SaturationEffect};
pub use sharpen::{sharpen_edges, SharpenEffect};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_extremes() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(lerp_u8(100, 200, 0.5), 150);
        assert_eq!(lerp_u8(100, 200, 3.0), 255);
        assert_eq!(lerp_u8(100, 0, 3.0), 0);
    }

    #[test]
    fn test_registry_defaults() {
        let registry = EffectRegistry::with_defaults();
        assert_eq!(
            registry.list_effects(),
            vec!["color_blend", "contrast", "recolor", "saturation", "sharpen", "white_key"]
        );
        assert_eq!(registry.effects_in_category(EffectCategory::Keying).len(), 1);
        assert!(registry.get("blur").is_none());
    }

    #[test]
    fn test_unknown_effect_errors() {
        let registry = EffectRegistry::with_defaults();
        let img = RgbaImage::new(1, 1);
        assert!(registry.apply("blur", &img, &HashMap::new()).is_err());
    }

    #[test]
    fn test_get_param_uses_default() {
        let effect = ContrastEffect;
        let mut params = HashMap::new();
        assert_eq!(effect.get_param(&params, "contrast"), 1.0);
        params.insert("contrast".to_string(), 3.0);
        assert_eq!(effect.get_param(&params, "contrast"), 3.0);
    }
}
