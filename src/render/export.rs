// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattened full-resolution export.
//!
//! The scene is redrawn onto a copy of the background at its native size
//! with the same routine the preview uses, then encoded as PNG either for
//! a local file or as a data URL for submission.

use super::surface::Surface;
use super::typeface::Typeface;
use super::{draw_annotations, Projection, RenderPass};
use crate::models::scene::Scene;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Flatten the scene at the background's native resolution. `None` unless a
/// background is loaded and at least one annotation exists.
pub fn flatten(scene: &Scene, typeface: &Typeface) -> Option<RgbaImage> {
    if !scene.is_exportable() {
        return None;
    }
    let background = scene.background()?;
    let projection = Projection::between(background.working_size(), background.native_size());

    let mut surface = Surface::from_background(&background.native);
    draw_annotations(
        &mut surface,
        scene.annotations(),
        scene.selected_id(),
        projection,
        RenderPass::Export,
        typeface,
    );
    Some(surface.into_image())
}

/// Encode as PNG bytes.
pub fn to_png_bytes(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(bytes)
}

/// Encode as a `data:image/png;base64,` URL for upload.
pub fn to_data_url(image: &RgbaImage) -> Result<String> {
    let bytes = to_png_bytes(image)?;
    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(bytes)
    ))
}

/// Timestamped download name, e.g. `meme-1700000000000.png`.
pub fn export_file_name(timestamp_millis: i64) -> String {
    format!("meme-{}.png", timestamp_millis)
}

/// Write the flattened image to `path`.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let bytes = to_png_bytes(image)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Exported meme to {}", path.display());
    Ok(())
}

/// Write the flattened image into `dir` under a timestamped name.
pub fn save_png_in(image: &RgbaImage, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export_file_name(crate::util::time::now_millis()));
    save_png(image, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::style::StyleControls;
    use image::Rgba;

    const BACKGROUND: Rgba<u8> = Rgba([10, 20, 30, 255]);

    fn hello_scene() -> (Scene, String) {
        let mut scene = Scene::default();
        scene.load_background("test".to_string(), RgbaImage::from_pixel(1600, 1200, BACKGROUND));
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        scene.update_text(&id, "Hello");
        scene.update_font_size(&id, 50);
        (scene, id)
    }

    #[test]
    fn test_flatten_requires_background_and_annotation() {
        let typeface = Typeface::bitmap();
        assert!(flatten(&Scene::default(), &typeface).is_none());

        let mut scene = Scene::default();
        scene.load_background("test".to_string(), RgbaImage::new(100, 100));
        assert!(flatten(&scene, &typeface).is_none());
    }

    #[test]
    fn test_flatten_at_native_resolution() {
        let typeface = Typeface::bitmap();
        let (scene, _) = hello_scene();
        let image = flatten(&scene, &typeface).unwrap();
        assert_eq!(image.dimensions(), (1600, 1200));

        // "Hello" is 500px wide at 100px, centered on (800, 600): the 'H'
        // starts at x = 550 and its top row at y = 550.
        assert_eq!(image.get_pixel(556, 556), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(20, 20), &BACKGROUND);
    }

    #[test]
    fn test_export_never_draws_selection() {
        let typeface = Typeface::bitmap();
        let (scene, id) = hello_scene();
        assert_eq!(scene.selected_id(), Some(id.as_str()));
        let image = flatten(&scene, &typeface).unwrap();
        let outline = Rgba([0xff, 0x57, 0x22, 255]);
        assert!(image.pixels().all(|pixel| *pixel != outline));
    }

    #[test]
    fn test_fill_uses_annotation_color() {
        let typeface = Typeface::bitmap();
        let (mut scene, id) = hello_scene();
        scene.update_color(&id, "#00ff00");
        let image = flatten(&scene, &typeface).unwrap();
        assert_eq!(image.get_pixel(556, 556), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_data_url_is_png() {
        let url = to_data_url(&RgbaImage::new(2, 2)).unwrap();
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_save_png_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_png_in(&RgbaImage::new(3, 3), dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("meme-") && name.ends_with(".png"));
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 3));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(1_700_000_000_000), "meme-1700000000000.png");
    }
}
