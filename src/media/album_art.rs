//! Album-art compositing: the game expects a 304x120 texture holding two
//! identical animation frames of the cover, optionally dressed with a
//! faceplate template overlay.

use image::{imageops, imageops::FilterType, RgbaImage};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::texture::{self, TextureConverter};

pub const CANVAS_WIDTH: u32 = 304;
pub const CANVAS_HEIGHT: u32 = 120;

/// Left edges of the two cover frames; both sit at the same height.
const FRAME_X: [i64; 2] = [10, 162];
const FRAME_Y: i64 = 10;
const FRAME_WIDTH: u32 = 132;
const FRAME_HEIGHT: u32 = 100;

#[derive(Debug, Error)]
pub enum ArtError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the final cover image: the user's art stretched into both frame
/// rectangles of a transparent canvas, with the template (if present)
/// alpha-composited on top.
pub fn compose_cover(image_path: &Path, template_path: &Path) -> Result<RgbaImage, ArtError> {
    let mut canvas = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);

    let art = image::open(image_path)?.to_rgba8();
    // Stretch to fill, not crop; both frames reuse the same image.
    let resized = imageops::resize(&art, FRAME_WIDTH, FRAME_HEIGHT, FilterType::Lanczos3);
    for x in FRAME_X {
        imageops::replace(&mut canvas, &resized, x, FRAME_Y);
    }

    if template_path.exists() {
        let mut template = image::open(template_path)?.to_rgba8();
        if template.dimensions() != (CANVAS_WIDTH, CANVAS_HEIGHT) {
            warn!(
                "resizing template to {}x{}",
                CANVAS_WIDTH, CANVAS_HEIGHT
            );
            template = imageops::resize(&template, CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3);
        }
        imageops::overlay(&mut canvas, &template, 0, 0);
        info!("applied cover template {template_path:?}");
    } else {
        warn!("cover template {template_path:?} not found, using the album art alone");
    }

    Ok(canvas)
}

/// Composite the cover and convert it to the station's DDS texture.
///
/// The intermediate PNG is always deleted. On total conversion failure the
/// composited image is kept as `<station>_album_art.png` so the user can
/// convert it by hand; the return value reports whether the DDS exists.
pub async fn process_album_art(
    image_path: &Path,
    gfx_dir: &Path,
    station: &str,
    template_path: &Path,
    converters: &[Box<dyn TextureConverter>],
    timeout: Duration,
) -> Result<bool, ArtError> {
    let final_image = compose_cover(image_path, template_path)?;

    std::fs::create_dir_all(gfx_dir)?;
    let temp_png = gfx_dir.join(format!("{station}_album_art_temp.png"));
    final_image.save(&temp_png)?;

    let dds_path = gfx_dir.join(format!("{station}_album_art.dds"));
    let converted = texture::convert_to_dds(converters, &temp_png, &dds_path, timeout).await;

    if !converted {
        let fallback = gfx_dir.join(format!("{station}_album_art.png"));
        final_image.save(&fallback)?;
        warn!("all DDS conversions failed; saved {fallback:?} for manual conversion");
    }

    if temp_png.exists() {
        let _ = std::fs::remove_file(&temp_png);
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_image(dir: &Path, name: &str, w: u32, h: u32, color: Rgba<u8>) -> std::path::PathBuf {
        let img = RgbaImage::from_pixel(w, h, color);
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_compose_places_art_in_both_frames() {
        let dir = tempfile::TempDir::new().unwrap();
        let art = solid_image(dir.path(), "art.png", 64, 64, Rgba([200, 10, 10, 255]));
        let missing_template = dir.path().join("no_template.png");

        let canvas = compose_cover(&art, &missing_template).unwrap();
        assert_eq!(canvas.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));

        // Corners outside the frames stay transparent.
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
        assert_eq!(canvas.get_pixel(CANVAS_WIDTH - 1, CANVAS_HEIGHT - 1)[3], 0);

        // Both frames carry the same art.
        let left = canvas.get_pixel(10 + 66, 10 + 50);
        let right = canvas.get_pixel(162 + 66, 10 + 50);
        assert_eq!(left, right);
        assert_eq!(left[3], 255);
        assert!(left[0] > 150);
    }

    #[test]
    fn test_compose_applies_mismatched_template() {
        let dir = tempfile::TempDir::new().unwrap();
        let art = solid_image(dir.path(), "art.png", 64, 64, Rgba([0, 0, 200, 255]));
        // Opaque green template in the wrong size gets resized over everything.
        let template = solid_image(dir.path(), "template.png", 10, 10, Rgba([0, 255, 0, 255]));

        let canvas = compose_cover(&art, &template).unwrap();
        let px = canvas.get_pixel(76, 60);
        assert!(px[1] > 200, "template should cover the art: {px:?}");
    }

    #[tokio::test]
    async fn test_process_keeps_png_fallback_and_removes_temp() {
        let dir = tempfile::TempDir::new().unwrap();
        let art = solid_image(dir.path(), "art.png", 32, 32, Rgba([1, 2, 3, 255]));
        let gfx_dir = dir.path().join("gfx");

        // Empty chain: conversion cannot succeed.
        let converters: Vec<Box<dyn TextureConverter>> = Vec::new();
        let ok = process_album_art(
            &art,
            &gfx_dir,
            "my_station",
            &dir.path().join("no_template.png"),
            &converters,
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert!(!ok);
        assert!(gfx_dir.join("my_station_album_art.png").exists());
        assert!(!gfx_dir.join("my_station_album_art_temp.png").exists());
        assert!(!gfx_dir.join("my_station_album_art.dds").exists());
    }
}
