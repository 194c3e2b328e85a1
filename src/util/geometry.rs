// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transformations between the
//! on-screen canvas, the working canvas and the native image, plus the
//! box math used for hit-testing and drag clamping.

use crate::models::annotation::Point;

/// Axis-aligned rectangle in scene or surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rectangle of the given size centered on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            left: center.x - width / 2.0,
            top: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Edges are inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }
}

/// Scale `(width, height)` down so it fits within the maxima, preserving
/// aspect ratio. Images that already fit are never scaled up.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width.max(1), height.max(1));
    }

    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    // Canvas dimensions truncate; the epsilon keeps 1000 * 0.8 at 800.
    let fitted_width = (width as f64 * scale + 1e-9).floor() as u32;
    let fitted_height = (height as f64 * scale + 1e-9).floor() as u32;
    (fitted_width.max(1), fitted_height.max(1))
}

/// Convert a position relative to the displayed canvas into working-canvas
/// coordinates. The displayed size differs from the working size whenever
/// the canvas is shown stretched or shrunk.
pub fn screen_to_scene(
    offset_x: f64,
    offset_y: f64,
    displayed: (f64, f64),
    working: (u32, u32),
) -> Point {
    let scale_x = if displayed.0 > 0.0 { working.0 as f64 / displayed.0 } else { 1.0 };
    let scale_y = if displayed.1 > 0.0 { working.1 as f64 / displayed.1 } else { 1.0 };
    Point::new(offset_x * scale_x, offset_y * scale_y)
}

/// Clamp a proposed center so a `box_width` x `box_height` box plus
/// `padding` stays inside the canvas. When the box cannot fit, the
/// top/left bound wins.
pub fn clamp_center(
    proposed: Point,
    box_width: f64,
    box_height: f64,
    padding: f64,
    canvas: (u32, u32),
) -> Point {
    let min_x = box_width / 2.0 + padding;
    let max_x = canvas.0 as f64 - box_width / 2.0 - padding;
    let min_y = box_height / 2.0 + padding;
    let max_y = canvas.1 as f64 - box_height / 2.0 - padding;

    Point::new(
        proposed.x.min(max_x).max(min_x),
        proposed.y.min(max_y).max(min_y),
    )
}
