// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene rendering.
//!
//! One draw routine serves both the live preview (working canvas size,
//! selection outline shown) and the flattened export (native image size,
//! never an outline). The only differences between the two passes are the
//! target surface and the scale applied to every geometric quantity.

pub mod export;
pub mod surface;
pub mod typeface;

use crate::models::annotation::{Annotation, Point};
use crate::models::scene::Scene;
use crate::util::color;
use crate::util::geometry::Rect;
use image::RgbaImage;
use surface::Surface;
use typeface::{TextMetrics, Typeface};

const BACKDROP_ALPHA: f32 = 0.35;
const SHADOW_ALPHA: f32 = 0.35;
const SHADOW_OFFSET_Y: i32 = 1;
const SELECTION_COLOR: [u8; 3] = [0xff, 0x57, 0x22];
const SELECTION_MARGIN: f64 = 5.0;
const SELECTION_LINE_WIDTH: f64 = 2.0;
const SELECTION_DASH: f64 = 5.0;

/// Which surface is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    Preview,
    Export,
}

/// Working-space to target-space scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Projection {
    pub const IDENTITY: Projection = Projection {
        scale_x: 1.0,
        scale_y: 1.0,
    };

    /// Scale from the working canvas to a target of another size.
    pub fn between(working: (u32, u32), target: (u32, u32)) -> Self {
        Self {
            scale_x: target.0 as f64 / working.0.max(1) as f64,
            scale_y: target.1 as f64 / working.1.max(1) as f64,
        }
    }
}

/// Geometry of one annotation on the target surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub center: Point,
    pub font_px: f32,
    pub text_width: f32,
    pub padding: f64,
    pub backdrop: Rect,
    pub stroke_width: f64,
    pub shadow_blur: f64,
    pub selection: Rect,
}

/// Compute where and how large an annotation is drawn under `projection`.
/// Font size follows the horizontal scale, the same as the position's x.
pub fn layout_annotation(
    annotation: &Annotation,
    projection: Projection,
    metrics: &dyn TextMetrics,
) -> TextLayout {
    let font_px = annotation.font_size as f64 * projection.scale_x;
    let center = Point::new(
        annotation.x * projection.scale_x,
        annotation.y * projection.scale_y,
    );
    let text_width = metrics.text_width(&annotation.text, font_px as f32);
    let padding = (font_px * 0.3).round().max(6.0);
    let backdrop = Rect::centered(
        center,
        text_width as f64 + padding * 2.0,
        font_px + padding * 2.0,
    );

    TextLayout {
        center,
        font_px: font_px as f32,
        text_width,
        padding,
        backdrop,
        stroke_width: (font_px / 6.0).round().max(2.0),
        shadow_blur: (font_px / 12.0).round().max(2.0),
        selection: Rect::centered(center, text_width as f64, font_px).expand(SELECTION_MARGIN),
    }
}

/// Draw one annotation: backdrop, shadowed stroke, fill, and the selection
/// outline when asked for.
pub fn draw_annotation(
    surface: &mut Surface,
    annotation: &Annotation,
    layout: &TextLayout,
    typeface: &Typeface,
    show_selection: bool,
) {
    surface.fill_rect(layout.backdrop, [0, 0, 0], BACKDROP_ALPHA);

    let glyphs = typeface.rasterize(&annotation.text, layout.font_px);
    if !glyphs.is_empty() {
        let origin_x = (layout.center.x - layout.text_width as f64 / 2.0).round() as i32;
        let origin_y = layout.center.y.round() as i32;

        let stroke = glyphs.dilate(layout.stroke_width as f32 / 2.0);
        let shadow = stroke.blur((layout.shadow_blur / 2.0).ceil() as u32);
        surface.stamp(&shadow, origin_x, origin_y + SHADOW_OFFSET_Y, [0, 0, 0], SHADOW_ALPHA);
        surface.stamp(&stroke, origin_x, origin_y, [0, 0, 0], 1.0);
        surface.stamp(&glyphs, origin_x, origin_y, color::fill_or_white(&annotation.color), 1.0);
    }

    if show_selection {
        surface.stroke_dashed_rect(
            layout.selection,
            SELECTION_LINE_WIDTH,
            SELECTION_DASH,
            SELECTION_COLOR,
        );
    }
}

/// Draw every annotation in insertion order. The selection outline is only
/// ever drawn in the preview pass.
pub fn draw_annotations(
    surface: &mut Surface,
    annotations: &[Annotation],
    selected: Option<&str>,
    projection: Projection,
    pass: RenderPass,
    typeface: &Typeface,
) {
    for annotation in annotations {
        let layout = layout_annotation(annotation, projection, typeface);
        let show_selection =
            pass == RenderPass::Preview && selected == Some(annotation.id.as_str());
        draw_annotation(surface, annotation, &layout, typeface, show_selection);
    }
}

/// Render the scene at working size for display. `None` until a background
/// is loaded.
pub fn render_preview(scene: &Scene, typeface: &Typeface) -> Option<RgbaImage> {
    let background = scene.background()?;
    let mut surface = Surface::from_background(&background.working);
    draw_annotations(
        &mut surface,
        scene.annotations(),
        scene.selected_id(),
        Projection::IDENTITY,
        RenderPass::Preview,
        typeface,
    );
    Some(surface.into_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::style::StyleControls;
    use image::Rgba;

    fn scene_with(native: (u32, u32)) -> (Scene, String) {
        let mut scene = Scene::default();
        scene.load_background(
            "test".to_string(),
            RgbaImage::from_pixel(native.0, native.1, Rgba([10, 20, 30, 255])),
        );
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        (scene, id)
    }

    #[test]
    fn test_layout_padding_and_stroke() {
        let typeface = Typeface::bitmap();
        let (mut scene, id) = scene_with((800, 600));
        scene.update_text(&id, "Hello");
        scene.update_font_size(&id, 50);
        let layout = layout_annotation(scene.get(&id).unwrap(), Projection::IDENTITY, &typeface);

        assert_eq!(layout.center, Point::new(400.0, 300.0));
        assert_eq!(layout.text_width, 250.0);
        assert_eq!(layout.padding, 15.0);
        assert_eq!(layout.backdrop.width, 280.0);
        assert_eq!(layout.backdrop.height, 80.0);
        assert_eq!(layout.stroke_width, 8.0);
        assert_eq!(layout.shadow_blur, 4.0);
    }

    #[test]
    fn test_small_text_uses_minimum_padding() {
        let typeface = Typeface::bitmap();
        let (mut scene, id) = scene_with((800, 600));
        scene.update_font_size(&id, 10);
        let layout = layout_annotation(scene.get(&id).unwrap(), Projection::IDENTITY, &typeface);
        assert_eq!(layout.padding, 6.0);
        assert_eq!(layout.stroke_width, 2.0);
        assert_eq!(layout.shadow_blur, 2.0);
    }

    #[test]
    fn test_export_layout_is_preview_scaled() {
        let typeface = Typeface::bitmap();
        let (mut scene, id) = scene_with((1600, 1200));
        scene.move_annotation(&id, 250.0, 120.0, &typeface);
        let annotation = scene.get(&id).unwrap();

        let preview = layout_annotation(annotation, Projection::IDENTITY, &typeface);
        let projection = Projection::between((800, 600), (1600, 1200));
        let export = layout_annotation(annotation, projection, &typeface);

        assert_eq!(export.center.x, preview.center.x * 2.0);
        assert_eq!(export.center.y, preview.center.y * 2.0);
        assert_eq!(export.font_px, preview.font_px * 2.0);
        assert_eq!(export.text_width, preview.text_width * 2.0);
    }

    #[test]
    fn test_preview_shows_selection_outline() {
        let typeface = Typeface::bitmap();
        let (mut scene, id) = scene_with((800, 600));
        scene.update_text(&id, "Hello");
        scene.update_font_size(&id, 50);

        let preview = render_preview(&scene, &typeface).unwrap();
        assert_eq!(preview.dimensions(), (800, 600));
        // Outline corner: 400 - 125 - 5, 300 - 25 - 5.
        assert_eq!(preview.get_pixel(270, 270), &Rgba([0xff, 0x57, 0x22, 255]));

        scene.clear_selection();
        let unselected = render_preview(&scene, &typeface).unwrap();
        assert_ne!(unselected.get_pixel(270, 270), &Rgba([0xff, 0x57, 0x22, 255]));
    }

    #[test]
    fn test_preview_leaves_far_background_untouched() {
        let typeface = Typeface::bitmap();
        let (scene, _) = scene_with((800, 600));
        let preview = render_preview(&scene, &typeface).unwrap();
        assert_eq!(preview.get_pixel(5, 5), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_no_preview_without_background() {
        assert!(render_preview(&Scene::default(), &Typeface::bitmap()).is_none());
    }
}
