//! Launcher icon: a speaker with sound waves on a blue disc

use crate::{Result, WspeechError};
use image::{ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::path::Path;

pub const ICON_FILE: &str = "wspeech_icon.png";
pub const SIZE: u32 = 256;

const RING: Rgba<u8> = Rgba([202, 166, 247, 255]); // lavender
const DISC: Rgba<u8> = Rgba([137, 180, 250, 255]); // blue
const SYMBOL: Rgba<u8> = Rgba([30, 30, 46, 255]);

/// Wave radii around the cone tip
const WAVES: [f32; 3] = [60.0, 85.0, 110.0];
const WAVE_WIDTH: f32 = 13.0;
/// Half the angular span of each wave, in degrees
const WAVE_SPAN: f32 = 45.0;

/// Render the icon
pub fn render() -> RgbaImage {
    let mut img = RgbaImage::new(SIZE, SIZE);
    let c = SIZE as f32 / 2.0;

    // Speaker box and cone
    let box_l = c - 66.0;
    let box_r = c - 28.0;
    let box_half = 24.0;
    let cone_len = 52.0;
    let cone_half = 52.0;
    let wave_x = c - 20.0;

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let fx = x as f32 + 0.5;
        let fy = y as f32 + 0.5;
        let dx = fx - c;
        let dy = fy - c;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist > c - 4.0 {
            continue;
        }
        *pixel = if dist > c - 12.0 { RING } else { DISC };

        let in_box = fx >= box_l && fx <= box_r && dy.abs() <= box_half;
        let in_cone = fx > box_r && fx <= box_r + cone_len && {
            let t = (fx - box_r) / cone_len;
            dy.abs() <= box_half + (cone_half - box_half) * t
        };

        let wx = fx - wave_x;
        let wave_dist = (wx * wx + dy * dy).sqrt();
        let angle = dy.atan2(wx).to_degrees();
        let on_wave = wx > 0.0
            && angle.abs() <= WAVE_SPAN
            && WAVES
                .iter()
                .any(|r| (wave_dist - r).abs() <= WAVE_WIDTH / 2.0);

        if in_box || in_cone || on_wave {
            *pixel = SYMBOL;
        }
    }

    img
}

/// Render the icon and save it as PNG
pub fn write_icon(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    render()
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| WspeechError::Other(format!("Failed to save icon: {}", e)))
}
