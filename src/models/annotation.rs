// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the text box overlaid on a meme and its wire
//! format. Serialized fields use the camelCase names the feed store
//! has always persisted (`fontSize`), so existing records round-trip.

use crate::models::style::StyleControls;
use crate::render::typeface::TextMetrics;
use crate::util::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Text placed on a freshly added annotation.
pub const DEFAULT_TEXT: &str = "Your text here";

/// Nominal box stored on new annotations. Kept for wire compatibility only.
pub const NOMINAL_WIDTH: f64 = 200.0;
pub const NOMINAL_HEIGHT: f64 = 40.0;

/// A 2D point in working-canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// A positioned, styled text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub text: String,
    /// Center of the text in working-canvas pixels.
    pub x: f64,
    pub y: f64,
    pub font_size: u32,
    /// `#RRGGBB` fill for the glyph body.
    pub color: String,
    pub width: f64,
    pub height: f64,
}

impl Annotation {
    /// Create a new annotation centered on `center` with the given style.
    pub fn new(id: String, center: Point, style: &StyleControls) -> Self {
        Self {
            id,
            text: DEFAULT_TEXT.to_string(),
            x: center.x,
            y: center.y,
            font_size: style.font_size.max(1),
            color: style.color.clone(),
            width: NOMINAL_WIDTH,
            height: NOMINAL_HEIGHT,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_center(&mut self, center: Point) {
        self.x = center.x;
        self.y = center.y;
    }

    /// Box occupied by the text at working scale: measured width by
    /// `fontSize` height. Always recomputed; the stored `width`/`height`
    /// are never consulted.
    pub fn measured_box(&self, metrics: &dyn TextMetrics) -> Rect {
        let width = metrics.text_width(&self.text, self.font_size as f32) as f64;
        Rect::centered(self.center(), width, self.font_size as f64)
    }

    /// Margin kept between the measured box and the canvas edge while
    /// dragging.
    pub fn drag_padding(&self) -> f64 {
        (self.font_size as f64 * 0.35).round().max(8.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::typeface::Typeface;

    #[test]
    fn test_new_annotation_uses_style() {
        let style = StyleControls {
            font_size: 64,
            color: "#ff0000".to_string(),
        };
        let annotation = Annotation::new("1".to_string(), Point::new(10.0, 20.0), &style);
        assert_eq!(annotation.text, DEFAULT_TEXT);
        assert_eq!(annotation.font_size, 64);
        assert_eq!(annotation.color, "#ff0000");
        assert_eq!(annotation.center(), Point::new(10.0, 20.0));
        assert_eq!((annotation.width, annotation.height), (NOMINAL_WIDTH, NOMINAL_HEIGHT));
    }

    #[test]
    fn test_measured_box_ignores_nominal_size() {
        let typeface = Typeface::bitmap();
        let mut annotation =
            Annotation::new("1".to_string(), Point::new(100.0, 100.0), &StyleControls::default());
        annotation.text = "abc".to_string();
        annotation.width = 9999.0;
        annotation.height = 9999.0;

        let bounds = annotation.measured_box(&typeface);
        assert_eq!(bounds.width, 120.0);
        assert_eq!(bounds.height, 40.0);
        assert_eq!(bounds.left, 40.0);
        assert_eq!(bounds.top, 80.0);
    }

    #[test]
    fn test_measured_box_tracks_text_edits() {
        let typeface = Typeface::bitmap();
        let mut annotation =
            Annotation::new("1".to_string(), Point::new(0.0, 0.0), &StyleControls::default());
        annotation.text = "ab".to_string();
        let before = annotation.measured_box(&typeface).width;
        annotation.text = "abcd".to_string();
        annotation.font_size = 20;
        let after = annotation.measured_box(&typeface);
        assert_eq!(before, 80.0);
        assert_eq!(after.width, 80.0);
        assert_eq!(after.height, 20.0);
    }

    #[test]
    fn test_drag_padding() {
        let mut annotation =
            Annotation::new("1".to_string(), Point::new(0.0, 0.0), &StyleControls::default());
        annotation.font_size = 10;
        assert_eq!(annotation.drag_padding(), 8.0);
        annotation.font_size = 50;
        assert_eq!(annotation.drag_padding(), 18.0);
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let annotation = Annotation {
            id: "1700000000000".to_string(),
            text: "Hi".to_string(),
            x: 400.0,
            y: 300.5,
            font_size: 40,
            color: "#ffffff".to_string(),
            width: 200.0,
            height: 40.0,
        };
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["fontSize"], 40);
        assert_eq!(json["y"], 300.5);
        assert!(json.get("font_size").is_none());
    }
}
