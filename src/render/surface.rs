// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! RGBA target the scene is painted onto, with source-over blending.

use super::typeface::GlyphMask;
use crate::util::geometry::Rect;
use image::{Rgba, RgbaImage};

pub struct Surface {
    image: RgbaImage,
}

fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    if alpha >= 1.0 {
        *pixel = Rgba([color[0], color[1], color[2], 255]);
        return;
    }

    let dst_alpha = pixel[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    for channel in 0..3 {
        let src = color[channel] as f32;
        let dst = pixel[channel] as f32;
        let value = (src * alpha + dst * dst_alpha * (1.0 - alpha)) / out_alpha;
        pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (out_alpha * 255.0).round() as u8;
}

impl Surface {
    /// Start from a copy of `background`.
    pub fn from_background(background: &RgbaImage) -> Self {
        Self {
            image: background.clone(),
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Fill the pixels whose centers fall inside `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 3], alpha: f32) {
        let (width, height) = self.image.dimensions();
        let x0 = rect.left.round().max(0.0) as u32;
        let y0 = rect.top.round().max(0.0) as u32;
        let x1 = (rect.right().round().max(0.0) as u32).min(width);
        let y1 = (rect.bottom().round().max(0.0) as u32).min(height);
        for y in y0..y1 {
            for x in x0..x1 {
                blend(self.image.get_pixel_mut(x, y), color, alpha);
            }
        }
    }

    /// Paint `mask` with its origin at `(x, y)`, scaling `alpha` by coverage.
    pub fn stamp(&mut self, mask: &GlyphMask, x: i32, y: i32, color: [u8; 3], alpha: f32) {
        let (width, height) = self.image.dimensions();
        for my in 0..mask.height {
            let ty = y + mask.top + my as i32;
            if ty < 0 || ty >= height as i32 {
                continue;
            }
            for mx in 0..mask.width {
                let tx = x + mask.left + mx as i32;
                if tx < 0 || tx >= width as i32 {
                    continue;
                }
                let coverage = mask.get(mx, my);
                if coverage > 0.0 {
                    blend(self.image.get_pixel_mut(tx as u32, ty as u32), color, alpha * coverage);
                }
            }
        }
    }

    /// Dashed outline; dashes and gaps are both `dash` long and the pattern
    /// runs continuously around the corners.
    pub fn stroke_dashed_rect(&mut self, rect: Rect, line_width: f64, dash: f64, color: [u8; 3]) {
        let corners = [
            (rect.left, rect.top),
            (rect.right(), rect.top),
            (rect.right(), rect.bottom()),
            (rect.left, rect.bottom()),
            (rect.left, rect.top),
        ];
        let half = line_width / 2.0;
        let mut travelled = 0.0;

        for edge in corners.windows(2) {
            let (x0, y0) = edge[0];
            let (x1, y1) = edge[1];
            let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
            if length <= 0.0 {
                continue;
            }
            let steps = length.ceil() as u32;
            for step in 0..=steps {
                let t = (step as f64).min(length);
                if ((travelled + t) / dash).floor() as i64 % 2 != 0 {
                    continue;
                }
                let px = x0 + (x1 - x0) * t / length;
                let py = y0 + (y1 - y0) * t / length;
                self.fill_block(px - half, py - half, line_width, color);
            }
            travelled += length;
        }
    }

    fn fill_block(&mut self, left: f64, top: f64, size: f64, color: [u8; 3]) {
        let (width, height) = self.image.dimensions();
        let x0 = left.floor().max(0.0) as u32;
        let y0 = top.floor().max(0.0) as u32;
        let x1 = ((left + size).ceil().max(0.0) as u32).min(width);
        let y1 = ((top + size).ceil().max(0.0) as u32).min(height);
        for y in y0..y1 {
            for x in x0..x1 {
                blend(self.image.get_pixel_mut(x, y), color, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Point;

    #[test]
    fn test_translucent_fill_darkens_opaque_background() {
        let mut surface = Surface::from_background(&RgbaImage::from_pixel(4, 4, Rgba([200, 200, 200, 255])));
        surface.fill_rect(Rect::centered(Point::new(2.0, 2.0), 2.0, 2.0), [0, 0, 0], 0.35);
        let image = surface.into_image();
        assert_eq!(image.get_pixel(1, 1), &Rgba([130, 130, 130, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_stamp_clips_to_surface() {
        let mut surface = Surface::from_background(&RgbaImage::new(3, 3));
        let mask = GlyphMask {
            width: 2,
            height: 2,
            left: 0,
            top: 0,
            coverage: vec![1.0; 4],
        };
        surface.stamp(&mask, 2, 2, [255, 0, 0], 1.0);
        surface.stamp(&mask, -5, -5, [0, 255, 0], 1.0);
        let image = surface.into_image();
        assert_eq!(image.get_pixel(2, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_dashed_rect_alternates() {
        let mut surface = Surface::from_background(&RgbaImage::new(40, 10));
        surface.stroke_dashed_rect(
            Rect { left: 2.0, top: 4.0, width: 30.0, height: 4.0 },
            2.0,
            5.0,
            [255, 87, 34],
        );
        let image = surface.into_image();
        assert_eq!(image.get_pixel(3, 4), &Rgba([255, 87, 34, 255]));
        assert_eq!(image.get_pixel(10, 4)[3], 0);
        assert_eq!(image.get_pixel(14, 4), &Rgba([255, 87, 34, 255]));
    }
}
