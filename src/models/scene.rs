// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene state management.
//!
//! The scene is the single source of truth for the editor: one optional
//! background image, the annotations in insertion order, and the current
//! selection. It is only changed through the methods below; rendering
//! reads it and never mutates it.

use super::annotation::{Annotation, Point};
use super::style::StyleControls;
use crate::render::typeface::TextMetrics;
use crate::util::geometry::{self, clamp_center};
use image::{imageops, RgbaImage};

/// Default bounds of the working canvas.
pub const MAX_WORKING_WIDTH: u32 = 800;
pub const MAX_WORKING_HEIGHT: u32 = 600;

/// Background image at native resolution plus its working-size copy.
pub struct Background {
    /// Reference the image was loaded from (stored as the meme's base image).
    pub source: String,
    pub native: RgbaImage,
    pub working: RgbaImage,
}

impl Background {
    pub fn native_size(&self) -> (u32, u32) {
        self.native.dimensions()
    }

    pub fn working_size(&self) -> (u32, u32) {
        self.working.dimensions()
    }
}

/// Background, annotations and selection.
pub struct Scene {
    background: Option<Background>,
    annotations: Vec<Annotation>,
    selected: Option<String>,
    max_size: (u32, u32),
    /// Largest numeric id issued or seen, so ids are never reused.
    last_id: u64,
    revision: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(MAX_WORKING_WIDTH, MAX_WORKING_HEIGHT)
    }
}

impl Scene {
    /// Create an empty scene whose working canvas fits `max_width` x `max_height`.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            background: None,
            annotations: Vec::new(),
            selected: None,
            max_size: (max_width.max(1), max_height.max(1)),
            last_id: 0,
            revision: 0,
        }
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn working_size(&self) -> Option<(u32, u32)> {
        self.background.as_ref().map(Background::working_size)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Bumped by every mutation; the preview redraws when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Background loaded and at least one annotation present.
    pub fn is_exportable(&self) -> bool {
        self.background.is_some() && !self.annotations.is_empty()
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Replace the background. The working canvas is the image scaled down
    /// to fit the scene bounds; annotations and selection are kept.
    pub fn load_background(&mut self, source: String, native: RgbaImage) -> (u32, u32) {
        let (native_width, native_height) = native.dimensions();
        let (width, height) =
            geometry::fit_within(native_width, native_height, self.max_size.0, self.max_size.1);

        let working = if (width, height) == (native_width, native_height) {
            native.clone()
        } else {
            imageops::resize(&native, width, height, imageops::FilterType::Triangle)
        };

        log::info!(
            "Loaded background {}x{} (working canvas {}x{})",
            native_width,
            native_height,
            width,
            height
        );

        self.background = Some(Background {
            source,
            native,
            working,
        });
        self.touch();
        (width, height)
    }

    fn next_id(&mut self) -> String {
        let now = crate::util::time::now_millis().max(0) as u64;
        let mut id = now.max(self.last_id + 1);
        while self.get(&id.to_string()).is_some() {
            id += 1;
        }
        self.last_id = id;
        id.to_string()
    }

    /// Add an annotation at the center of the working canvas and select it.
    /// Returns `None` when no background is loaded.
    pub fn add_annotation(&mut self, style: &StyleControls) -> Option<String> {
        let (width, height) = self.working_size()?;
        let id = self.next_id();
        let center = Point::new(width as f64 / 2.0, height as f64 / 2.0);

        self.annotations.push(Annotation::new(id.clone(), center, style));
        self.selected = Some(id.clone());
        self.touch();
        log::info!("Added annotation {}, total: {}", id, self.annotations.len());
        Some(id)
    }

    fn with_annotation(&mut self, id: &str, change: impl FnOnce(&mut Annotation)) {
        if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
            change(annotation);
            self.revision += 1;
        }
    }

    pub fn update_text(&mut self, id: &str, text: &str) {
        self.with_annotation(id, |a| a.text = text.to_string());
    }

    pub fn update_font_size(&mut self, id: &str, font_size: u32) {
        self.with_annotation(id, |a| a.font_size = font_size.max(1));
    }

    pub fn update_color(&mut self, id: &str, color: &str) {
        self.with_annotation(id, |a| a.color = color.to_string());
    }

    /// Select an annotation and return its style for the controls.
    /// Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: &str) -> Option<StyleControls> {
        let style = self.get(id).map(StyleControls::of)?;
        if self.selected.as_deref() != Some(id) {
            self.selected = Some(id.to_string());
            self.touch();
        }
        Some(style)
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.touch();
        }
    }

    /// Remove an annotation. Returns true when it was the selection, which
    /// is then cleared.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        if self.annotations.len() == before {
            return false;
        }
        self.touch();
        log::info!("Deleted annotation {}, total: {}", id, self.annotations.len());

        if self.selected.as_deref() == Some(id) {
            self.selected = None;
            true
        } else {
            false
        }
    }

    /// Move an annotation's center, clamped so its measured box plus drag
    /// padding stays inside the working canvas. Returns the applied center.
    pub fn move_annotation(
        &mut self,
        id: &str,
        x: f64,
        y: f64,
        metrics: &dyn TextMetrics,
    ) -> Option<Point> {
        let canvas = self.working_size()?;
        let annotation = self.get(id)?;
        let bounds = annotation.measured_box(metrics);
        let center = clamp_center(
            Point::new(x, y),
            bounds.width,
            bounds.height,
            annotation.drag_padding(),
            canvas,
        );

        self.with_annotation(id, |a| a.set_center(center));
        Some(center)
    }

    /// Topmost annotation whose measured box contains `point`. Later
    /// insertions win over earlier ones.
    pub fn annotation_at(&self, point: Point, metrics: &dyn TextMetrics) -> Option<&Annotation> {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.measured_box(metrics).contains(point))
    }

    /// Replace the annotations with a stored list (edit mode seeding).
    pub fn seed_annotations(&mut self, annotations: Vec<Annotation>) {
        let highest = annotations
            .iter()
            .filter_map(|a| a.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.last_id = self.last_id.max(highest);
        self.annotations = annotations;
        self.selected = None;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::typeface::Typeface;
    use crate::util::geometry::Rect;
    use image::Rgba;

    fn scene_with_background(width: u32, height: u32) -> Scene {
        let mut scene = Scene::default();
        scene.load_background(
            "template://relatable.jpg".to_string(),
            RgbaImage::from_pixel(width, height, Rgba([30, 30, 30, 255])),
        );
        scene
    }

    #[test]
    fn test_load_background_downscales_once() {
        let mut scene = Scene::default();
        let size = scene.load_background(
            "a".to_string(),
            RgbaImage::new(1600, 1200),
        );
        assert_eq!(size, (800, 600));
        let background = scene.background().unwrap();
        assert_eq!(background.native_size(), (1600, 1200));
        assert_eq!(background.working_size(), (800, 600));
    }

    #[test]
    fn test_reloading_background_keeps_annotations() {
        let mut scene = scene_with_background(800, 600);
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        scene.load_background("b".to_string(), RgbaImage::new(400, 400));
        assert_eq!(scene.annotations().len(), 1);
        assert_eq!(scene.selected_id(), Some(id.as_str()));
        assert_eq!(scene.background().unwrap().source, "b");
    }

    #[test]
    fn test_add_without_background_creates_nothing() {
        let mut scene = Scene::default();
        assert!(scene.add_annotation(&StyleControls::default()).is_none());
        assert!(scene.annotations().is_empty());
        assert_eq!(scene.revision(), 0);
    }

    #[test]
    fn test_add_centers_and_selects() {
        let mut scene = scene_with_background(1600, 1200);
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        let annotation = scene.get(&id).unwrap();
        assert_eq!(annotation.center(), Point::new(400.0, 300.0));
        assert_eq!(scene.selected_id(), Some(id.as_str()));
    }

    #[test]
    fn test_ids_stay_unique_and_ordered() {
        let mut scene = scene_with_background(800, 600);
        let style = StyleControls::default();
        let mut expected = Vec::new();
        for round in 0..20 {
            let id = scene.add_annotation(&style).unwrap();
            expected.push(id);
            if round % 3 == 2 {
                let victim = expected.remove(round % expected.len());
                scene.delete(&victim);
            }
        }
        let ids: Vec<&str> = scene.annotations().iter().map(|a| a.id.as_str()).collect();
        let expected_refs: Vec<&str> = expected.iter().map(String::as_str).collect();
        assert_eq!(ids, expected_refs);

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let mut scene = scene_with_background(800, 600);
        let first = scene.add_annotation(&StyleControls::default()).unwrap();
        scene.delete(&first);
        let second = scene.add_annotation(&StyleControls::default()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_updates_ignore_unknown_ids() {
        let mut scene = scene_with_background(800, 600);
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        let revision = scene.revision();
        scene.update_text("missing", "x");
        scene.update_font_size("missing", 90);
        scene.update_color("missing", "#000000");
        assert_eq!(scene.revision(), revision);

        scene.update_text(&id, "");
        scene.update_font_size(&id, 72);
        scene.update_color(&id, "#00ff00");
        let annotation = scene.get(&id).unwrap();
        assert_eq!(annotation.text, "");
        assert_eq!(annotation.font_size, 72);
        assert_eq!(annotation.color, "#00ff00");
        assert_eq!(scene.selected_id(), Some(id.as_str()));
    }

    #[test]
    fn test_delete_reports_selection_cleared() {
        let mut scene = scene_with_background(800, 600);
        let a = scene.add_annotation(&StyleControls::default()).unwrap();
        let b = scene.add_annotation(&StyleControls::default()).unwrap();
        assert!(!scene.delete(&a));
        assert_eq!(scene.selected_id(), Some(b.as_str()));
        assert!(scene.delete(&b));
        assert_eq!(scene.selected_id(), None);
        assert!(!scene.delete("missing"));
    }

    #[test]
    fn test_move_clamps_measured_box_inside_canvas() {
        let typeface = Typeface::bitmap();
        let mut scene = scene_with_background(800, 600);
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        scene.update_text(&id, "Hello");

        let targets = [(5.0, 5.0), (795.0, 595.0), (-100.0, 300.0), (400.0, 900.0), (123.0, 456.0)];
        for (x, y) in targets {
            scene.move_annotation(&id, x, y, &typeface).unwrap();
            let annotation = scene.get(&id).unwrap();
            let bounds: Rect = annotation
                .measured_box(&typeface)
                .expand(annotation.drag_padding());
            assert!(bounds.left >= 0.0 && bounds.top >= 0.0, "{:?}", bounds);
            assert!(bounds.right() <= 800.0 && bounds.bottom() <= 600.0, "{:?}", bounds);
        }
    }

    #[test]
    fn test_move_uses_measured_not_nominal_size() {
        let typeface = Typeface::bitmap();
        let mut scene = scene_with_background(800, 600);
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        scene.update_text(&id, "Hi");

        // "Hi" at 40px measures 80 wide; padding is max(8, 14) = 14.
        let center = scene.move_annotation(&id, 0.0, 0.0, &typeface).unwrap();
        assert_eq!(center, Point::new(54.0, 34.0));
    }

    #[test]
    fn test_hit_test_prefers_latest() {
        let typeface = Typeface::bitmap();
        let mut scene = scene_with_background(800, 600);
        let first = scene.add_annotation(&StyleControls::default()).unwrap();
        let second = scene.add_annotation(&StyleControls::default()).unwrap();

        let hit = scene.annotation_at(Point::new(400.0, 300.0), &typeface).unwrap();
        assert_eq!(hit.id, second);

        scene.move_annotation(&second, 100.0, 100.0, &typeface);
        let hit = scene.annotation_at(Point::new(400.0, 300.0), &typeface).unwrap();
        assert_eq!(hit.id, first);

        assert!(scene.annotation_at(Point::new(799.0, 599.0), &typeface).is_none());
    }

    #[test]
    fn test_empty_text_occupies_only_its_center() {
        let typeface = Typeface::bitmap();
        let mut scene = scene_with_background(800, 600);
        let id = scene.add_annotation(&StyleControls::default()).unwrap();
        scene.update_text(&id, "");
        assert!(scene.annotation_at(Point::new(400.0, 300.0), &typeface).is_some());
        assert!(scene.annotation_at(Point::new(401.0, 300.0), &typeface).is_none());
    }

    #[test]
    fn test_seeded_ids_are_never_reissued() {
        let mut scene = scene_with_background(800, 600);
        let future = (crate::util::time::now_millis() + 1_000_000).to_string();
        let mut seeded = Annotation::new(
            future.clone(),
            Point::new(10.0, 10.0),
            &StyleControls::default(),
        );
        seeded.text = "old".to_string();
        scene.seed_annotations(vec![seeded]);

        let fresh = scene.add_annotation(&StyleControls::default()).unwrap();
        assert!(fresh.parse::<u64>().unwrap() > future.parse::<u64>().unwrap());
        assert_eq!(scene.annotations()[0].id, future);
    }
}
