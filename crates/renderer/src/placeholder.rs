use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::Scene;

/// Edge length used when a background photo is missing
pub const PLACEHOLDER_SIZE: u32 = 1024;

const PAPER: Rgb<u8> = Rgb([0xF0, 0xF0, 0xF0]);
const LATTICE: Rgb<u8> = Rgb([0x5C, 0x40, 0x33]);
const FRAME: Rgb<u8> = Rgb([0x3E, 0x27, 0x23]);
const PLASTER: Rgb<u8> = Rgb([0xE0, 0xE0, 0xE0]);
const MORTAR: Rgb<u8> = Rgb([0xC0, 0xC0, 0xC0]);

const LATTICE_STEP: u32 = 100;
const LATTICE_WIDTH: u32 = 10;
const FRAME_WIDTH: u32 = 30;
const BRICK_W: i32 = 200;
const BRICK_H: i32 = 100;

/// Simple drawn stand-in for a scene photo
pub fn placeholder_scene(scene: Scene, width: u32, height: u32) -> RgbImage {
    match scene {
        Scene::Window => window(width, height),
        Scene::Wall => wall(width, height),
        Scene::Door | Scene::Package => RgbImage::from_pixel(width, height, PAPER),
    }
}

fn window(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, PAPER);
    if width == 0 || height == 0 {
        return img;
    }

    let half = (LATTICE_WIDTH / 2) as i32;
    for x in (0..width).step_by(LATTICE_STEP as usize) {
        let bar = Rect::at(x as i32 - half, 0).of_size(LATTICE_WIDTH, height);
        draw_filled_rect_mut(&mut img, bar, LATTICE);
    }
    for y in (0..height).step_by(LATTICE_STEP as usize) {
        let bar = Rect::at(0, y as i32 - half).of_size(width, LATTICE_WIDTH);
        draw_filled_rect_mut(&mut img, bar, LATTICE);
    }

    // frame drawn inwards from the border
    let frame = FRAME_WIDTH.min(width).min(height);
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(width, frame), FRAME);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(0, (height - frame) as i32).of_size(width, frame),
        FRAME,
    );
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(frame, height), FRAME);
    draw_filled_rect_mut(
        &mut img,
        Rect::at((width - frame) as i32, 0).of_size(frame, height),
        FRAME,
    );
    img
}

fn wall(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, PLASTER);
    if width == 0 || height == 0 {
        return img;
    }

    for (row, y) in (0..height as i32).step_by(BRICK_H as usize).enumerate() {
        let offset = if row % 2 == 0 { 0 } else { BRICK_W / 2 };
        let mut x = offset - BRICK_W;
        while x < width as i32 {
            // 2 px outline
            let outer = Rect::at(x, y).of_size(BRICK_W as u32 + 1, BRICK_H as u32 + 1);
            let inner = Rect::at(x + 1, y + 1).of_size(BRICK_W as u32 - 1, BRICK_H as u32 - 1);
            draw_hollow_rect_mut(&mut img, outer, MORTAR);
            draw_hollow_rect_mut(&mut img, inner, MORTAR);
            x += BRICK_W;
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_scenes() {
        for scene in [Scene::Door, Scene::Package] {
            let img = placeholder_scene(scene, 64, 48);
            assert_eq!(img.dimensions(), (64, 48));
            assert!(img.pixels().all(|p| *p == PAPER));
        }
    }

    #[test]
    fn test_window_lattice_and_frame() {
        let img = placeholder_scene(Scene::Window, 400, 300);
        assert_eq!(*img.get_pixel(0, 150), FRAME);
        assert_eq!(*img.get_pixel(399, 299), FRAME);
        // lattice bar centred on x = 200
        assert_eq!(*img.get_pixel(200, 150), LATTICE);
        assert_eq!(*img.get_pixel(150, 150), PAPER);
        assert_eq!(*img.get_pixel(150, 100), LATTICE);
    }

    #[test]
    fn test_wall_bricks() {
        let img = placeholder_scene(Scene::Wall, 600, 300);
        assert_eq!(*img.get_pixel(50, 50), PLASTER);
        // even rows start at x = 0, odd rows are shifted by half a brick
        assert_eq!(*img.get_pixel(200, 50), MORTAR);
        assert_eq!(*img.get_pixel(300, 150), MORTAR);
        assert_eq!(*img.get_pixel(200, 150), PLASTER);
        assert_eq!(*img.get_pixel(50, 100), MORTAR);
    }

    #[test]
    fn test_tiny_window_does_not_panic() {
        let img = placeholder_scene(Scene::Window, 10, 10);
        assert!(img.pixels().all(|p| *p == FRAME));
        assert_eq!(placeholder_scene(Scene::Wall, 0, 0).dimensions(), (0, 0));
    }
}
