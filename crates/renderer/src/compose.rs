use anyhow::Result;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use crate::{RendererError, Scene};

/// Deep cinnabar used for every mock-up (#980015)
pub const INK_COLOR: [u8; 3] = [152, 0, 21];

const PACKAGE_ROTATION_DEG: f32 = 33.0;

/// Window pane on the 5760x3840 reference photo: 1736 px square at (2890, 137)
const WINDOW_REF: (f64, f64) = (5760.0, 3840.0);
const WINDOW_SIDE: f64 = 1736.0;
const WINDOW_ORIGIN: (f64, f64) = (2890.0, 137.0);

/// Composite a processed papercut onto a scene background.
///
/// Placement is expressed as fractions of the background size so any
/// resolution of the reference photos works.
pub fn render(scene: Scene, papercut: &RgbaImage, background: &RgbImage) -> Result<RgbImage> {
    let (pw, ph) = papercut.dimensions();
    if pw == 0 || ph == 0 {
        return Err(RendererError::EmptyPapercut {
            scene,
            width: pw,
            height: ph,
        }
        .into());
    }

    let bw = background.width() as f64;
    let bh = background.height() as f64;
    let aspect = pw as f64 / ph as f64;

    let (width, height, opacity) = match scene {
        Scene::Window => {
            let side = (bh * WINDOW_SIDE / WINDOW_REF.1) as u32;
            (side, side, 0.75)
        }
        Scene::Wall => {
            let h = (bh * 0.4948) as u32;
            ((h as f64 * aspect) as u32, h, 0.9)
        }
        Scene::Door => {
            let h = (bh * 0.18) as u32;
            ((h as f64 * aspect) as u32, h, 0.9)
        }
        Scene::Package => {
            let w = (bw * 0.25) as u32;
            (w, (w as f64 / aspect) as u32, 0.85)
        }
    };
    if width == 0 || height == 0 {
        return Err(RendererError::EmptyPapercut {
            scene,
            width,
            height,
        }
        .into());
    }

    let resized = imageops::resize(papercut, width, height, FilterType::Lanczos3);
    let mut layer = effects::recolor(&resized, INK_COLOR, opacity);
    if scene == Scene::Package {
        layer = rotate_expand(&layer, PACKAGE_ROTATION_DEG);
    }

    let (lw, lh) = layer.dimensions();
    let centred = |cx: f64, cy: f64| {
        (
            cx as i64 - (lw / 2) as i64,
            cy as i64 - (lh / 2) as i64,
        )
    };
    let (x, y) = match scene {
        // fixed top-left corner of the window pane
        Scene::Window => (
            (bw * WINDOW_ORIGIN.0 / WINDOW_REF.0) as i64,
            (bh * WINDOW_ORIGIN.1 / WINDOW_REF.1) as i64,
        ),
        Scene::Wall => centred(bw * 0.6667, bh * 0.373),
        Scene::Door => centred(bw * 0.6245, bh * 0.363),
        Scene::Package => centred(bw * 0.48, bh * 0.4833),
    };

    let mut canvas = DynamicImage::ImageRgb8(background.clone()).to_rgba8();
    imageops::overlay(&mut canvas, &layer, x, y);
    Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

/// Rotate counter-clockwise by `degrees`, growing the canvas so no corner
/// is clipped. New area is transparent.
pub fn rotate_expand(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let new_w = ((w as f32 * cos + h as f32 * sin).ceil() as u32).max(w);
    let new_h = ((w as f32 * sin + h as f32 * cos).ceil() as u32).max(h);

    let mut canvas = RgbaImage::new(new_w, new_h);
    imageops::replace(
        &mut canvas,
        image,
        ((new_w - w) / 2) as i64,
        ((new_h - h) / 2) as i64,
    );
    if degrees == 0.0 {
        return canvas;
    }
    // imageproc turns clockwise for positive angles
    rotate_about_center(&canvas, -theta, Interpolation::Bicubic, Rgba([0, 0, 0, 0]))
}
