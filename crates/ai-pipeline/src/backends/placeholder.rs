/// Placeholder backend
///
/// Serves a pre-supplied sample image, or a small built-in cut-paper motif
/// when no sample is configured.
use crate::{build_full_prompt, GeneratedImage, GenerationRequest, ImageGenerator, Result};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_ellipse_mut};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::warn;

const SAMPLE_SIZE: u32 = 512;
const PAPER_RED: Rgb<u8> = Rgb([200, 16, 32]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

pub struct PlaceholderGenerator {
    sample_path: Option<PathBuf>,
}

impl PlaceholderGenerator {
    /// Use the sample image at `path`, falling back to the built-in motif
    pub fn new(sample_path: Option<PathBuf>) -> Self {
        Self { sample_path }
    }

    /// Built-in motif only
    pub fn builtin() -> Self {
        Self { sample_path: None }
    }

    /// Sample image as PNG bytes
    pub fn sample_png(&self) -> Result<Vec<u8>> {
        if let Some(path) = &self.sample_path {
            match image::open(path) {
                Ok(img) => return encode_png(&img),
                Err(e) => warn!("Placeholder image {} unusable: {}", path.display(), e),
            }
        }
        encode_png(&image::DynamicImage::ImageRgb8(builtin_sample()))
    }
}

impl Default for PlaceholderGenerator {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait::async_trait]
impl ImageGenerator for PlaceholderGenerator {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let full_prompt = build_full_prompt(&request.prompt)?;

        Ok(GeneratedImage {
            bytes: self.sample_png()?,
            prompt: request.prompt.trim().to_string(),
            full_prompt,
            seed: request.seed.unwrap_or(0),
            filename: format!("placeholder_{}.png", chrono::Utc::now().timestamp()),
            placeholder: true,
        })
    }
}

fn encode_png(img: &image::DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Red flower medallion on white paper
fn builtin_sample() -> RgbImage {
    let mut img = RgbImage::from_pixel(SAMPLE_SIZE, SAMPLE_SIZE, WHITE);
    let c = (SAMPLE_SIZE / 2) as i32;

    // outer ring
    draw_filled_circle_mut(&mut img, (c, c), 220, PAPER_RED);
    draw_filled_circle_mut(&mut img, (c, c), 190, WHITE);

    // petals
    draw_filled_ellipse_mut(&mut img, (c, c - 95), 38, 80, PAPER_RED);
    draw_filled_ellipse_mut(&mut img, (c, c + 95), 38, 80, PAPER_RED);
    draw_filled_ellipse_mut(&mut img, (c - 95, c), 80, 38, PAPER_RED);
    draw_filled_ellipse_mut(&mut img, (c + 95, c), 80, 38, PAPER_RED);
    for (dx, dy) in [(-1, -1), (1, -1), (-1, 1), (1, 1)] {
        draw_filled_circle_mut(&mut img, (c + dx * 72, c + dy * 72), 34, PAPER_RED);
    }

    // cut-out heart of the flower
    draw_filled_circle_mut(&mut img, (c, c), 40, PAPER_RED);
    draw_filled_circle_mut(&mut img, (c, c), 18, WHITE);

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sample_is_red_on_white() {
        let img = builtin_sample();
        assert_eq!(img.dimensions(), (SAMPLE_SIZE, SAMPLE_SIZE));
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        // on the outer ring
        assert_eq!(*img.get_pixel(SAMPLE_SIZE / 2, SAMPLE_SIZE / 2 - 205), PAPER_RED);
        // center hole
        assert_eq!(*img.get_pixel(SAMPLE_SIZE / 2, SAMPLE_SIZE / 2), WHITE);
    }

    #[tokio::test]
    async fn test_generate_marks_placeholder() {
        let gen = PlaceholderGenerator::builtin();
        let image = gen
            .generate(&GenerationRequest::new(" tiger ").with_seed(3))
            .await
            .unwrap();

        assert!(image.placeholder);
        assert_eq!(image.prompt, "tiger");
        assert_eq!(image.seed, 3);
        assert!(image.filename.starts_with("placeholder_"));

        let decoded = image.decode().unwrap();
        assert_eq!(decoded.width(), SAMPLE_SIZE);
    }

    #[tokio::test]
    async fn test_sample_file_is_reencoded_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.jpg");
        RgbImage::from_pixel(32, 16, Rgb([10, 20, 30]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();

        let gen = PlaceholderGenerator::new(Some(path));
        let bytes = gen.sample_png().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn test_missing_sample_file_falls_back() {
        let gen = PlaceholderGenerator::new(Some(PathBuf::from("/nonexistent/sample.png")));
        let decoded = image::load_from_memory(&gen.sample_png().unwrap()).unwrap();
        assert_eq!(decoded.width(), SAMPLE_SIZE);
    }
}
