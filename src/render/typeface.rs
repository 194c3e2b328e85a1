// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bold face used for measuring and rasterizing annotation text.
//!
//! A system sans-serif is located with font-kit and rasterized with
//! ab_glyph. When no system font can be loaded the 8x8 bitmap face from
//! font8x8 is used instead; it is also what the tests measure with, since
//! its metrics are exact: every character advances by one em.

use ab_glyph::{point, Font, FontArc, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};

/// Families tried in order before falling back to the generic sans-serif.
const PREFERRED_FAMILIES: [&str; 4] = ["Arial", "Helvetica", "Liberation Sans", "DejaVu Sans"];

/// Text measurement, the one capability hit-testing and clamping need.
pub trait TextMetrics {
    /// Advance width of `text` set in the bold face at `font_px`.
    fn text_width(&self, text: &str, font_px: f32) -> f32;
}

/// Single-channel coverage for a run of text.
///
/// `left` is the offset of column 0 from the start of the text's advance
/// box; `top` is the offset of row 0 from the text's vertical center.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub coverage: Vec<f32>,
}

impl GlyphMask {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            left: 0,
            top: 0,
            coverage: Vec::new(),
        }
    }

    fn blank(width: u32, height: u32, left: i32, top: i32) -> Self {
        Self {
            width,
            height,
            left,
            top,
            coverage: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    fn raise(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.coverage[idx] = self.coverage[idx].max(value.min(1.0));
        }
    }

    /// Grow the glyph shapes by `radius` pixels with round corners. This is
    /// how a centered stroke of width `2 * radius` with round joins covers.
    pub fn dilate(&self, radius: f32) -> GlyphMask {
        if self.is_empty() || radius <= 0.0 {
            return self.clone();
        }

        let reach = radius.ceil() as i32;
        let limit = radius * radius + 0.25;
        let disk: Vec<(i32, i32)> = (-reach..=reach)
            .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| (dx * dx + dy * dy) as f32 <= limit)
            .collect();

        let pad = reach as u32;
        let mut grown = GlyphMask::blank(
            self.width + pad * 2,
            self.height + pad * 2,
            self.left - reach,
            self.top - reach,
        );

        for y in 0..self.height {
            for x in 0..self.width {
                let value = self.get(x, y);
                if value <= 0.0 {
                    continue;
                }
                for &(dx, dy) in &disk {
                    let gx = (x as i32 + reach + dx) as u32;
                    let gy = (y as i32 + reach + dy) as u32;
                    grown.raise(gx, gy, value);
                }
            }
        }
        grown
    }

    /// Separable box blur, padding the mask so nothing is cut off.
    pub fn blur(&self, radius: u32) -> GlyphMask {
        if self.is_empty() || radius == 0 {
            return self.clone();
        }

        let r = radius as i32;
        let width = self.width + radius * 2;
        let height = self.height + radius * 2;
        let window = (radius * 2 + 1) as f32;

        let mut padded = GlyphMask::blank(width, height, self.left - r, self.top - r);
        for y in 0..self.height {
            for x in 0..self.width {
                padded.coverage[(y + radius) as usize * width as usize + (x + radius) as usize] =
                    self.get(x, y);
            }
        }

        let mut horizontal = GlyphMask::blank(width, height, padded.left, padded.top);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let sum: f32 = (x - r..=x + r)
                    .filter(|sx| *sx >= 0 && *sx < width as i32)
                    .map(|sx| padded.get(sx as u32, y as u32))
                    .sum();
                horizontal.coverage[y as usize * width as usize + x as usize] = sum / window;
            }
        }

        let mut blurred = GlyphMask::blank(width, height, padded.left, padded.top);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let sum: f32 = (y - r..=y + r)
                    .filter(|sy| *sy >= 0 && *sy < height as i32)
                    .map(|sy| horizontal.get(x as u32, sy as u32))
                    .sum();
                blurred.coverage[y as usize * width as usize + x as usize] = sum / window;
            }
        }
        blurred
    }
}

/// The bold face annotations are drawn with.
#[derive(Clone)]
pub enum Typeface {
    Outline { font: FontArc, family: String },
    Bitmap,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Typeface {
    /// Locate a bold system sans-serif, falling back to the bitmap face.
    pub fn system_bold() -> Self {
        match load_system_bold() {
            Some((font, family)) => {
                log::info!("Using system font {} (bold)", family);
                Typeface::Outline { font, family }
            }
            None => {
                log::warn!("No bold sans-serif system font found, using bitmap face");
                Typeface::Bitmap
            }
        }
    }

    pub fn bitmap() -> Self {
        Typeface::Bitmap
    }

    pub fn name(&self) -> &str {
        match self {
            Typeface::Outline { family, .. } => family,
            Typeface::Bitmap => "font8x8",
        }
    }

    /// Coverage for `text` at `font_px`, positioned relative to the start
    /// of the text and its vertical center (the em box middle).
    pub fn rasterize(&self, text: &str, font_px: f32) -> GlyphMask {
        if text.is_empty() || font_px <= 0.0 {
            return GlyphMask::empty();
        }
        match self {
            Typeface::Outline { font, .. } => rasterize_outline(font, text, font_px),
            Typeface::Bitmap => rasterize_bitmap(text, font_px),
        }
    }
}

impl TextMetrics for Typeface {
    fn text_width(&self, text: &str, font_px: f32) -> f32 {
        match self {
            Typeface::Outline { font, .. } => {
                let scaled = font.as_scaled(font_px);
                let mut width = 0.0f32;
                let mut previous = None;
                for ch in text.chars() {
                    let glyph = font.glyph_id(ch);
                    if let Some(prev) = previous {
                        width += scaled.kern(prev, glyph);
                    }
                    width += scaled.h_advance(glyph);
                    previous = Some(glyph);
                }
                width
            }
            Typeface::Bitmap => text.chars().count() as f32 * font_px,
        }
    }
}

fn load_system_bold() -> Option<(FontArc, String)> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = Weight::BOLD;

    let mut families: Vec<FamilyName> = PREFERRED_FAMILIES
        .iter()
        .map(|name| FamilyName::Title(name.to_string()))
        .collect();
    families.push(FamilyName::SansSerif);

    let handle = SystemSource::new().select_best_match(&families, &props).ok()?;
    let font = handle.load().ok()?;
    let family = font.family_name();
    let data = font.copy_font_data()?;
    let arc = FontArc::try_from_vec((*data).clone()).ok()?;
    Some((arc, family))
}

fn rasterize_outline(font: &FontArc, text: &str, font_px: f32) -> GlyphMask {
    let scaled = font.as_scaled(font_px);
    // Canvas "middle" baseline: the em box middle sits on the center line.
    let baseline = (scaled.ascent() + scaled.descent()) / 2.0;

    let mut outlines = Vec::new();
    let mut caret = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(font_px, point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);
        if let Some(outlined) = font.outline_glyph(glyph) {
            outlines.push(outlined);
        }
    }

    if outlines.is_empty() {
        return GlyphMask::empty();
    }

    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for outlined in &outlines {
        let bounds = outlined.px_bounds();
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }

    let left = min_x.floor() as i32;
    let top = min_y.floor() as i32;
    let width = (max_x.ceil() as i32 - left).max(0) as u32;
    let height = (max_y.ceil() as i32 - top).max(0) as u32;
    let mut mask = GlyphMask::blank(width, height, left, top);

    for outlined in &outlines {
        let bounds = outlined.px_bounds();
        let ox = bounds.min.x as i32 - left;
        let oy = bounds.min.y as i32 - top;
        outlined.draw(|x, y, coverage| {
            let mx = ox + x as i32;
            let my = oy + y as i32;
            if mx >= 0 && my >= 0 {
                mask.raise(mx as u32, my as u32, coverage);
            }
        });
    }
    mask
}

/// Each character fills a square em cell; its 8x8 bitmap is scaled to fit.
fn rasterize_bitmap(text: &str, font_px: f32) -> GlyphMask {
    let count = text.chars().count();
    let cell = font_px / 8.0;
    let width = (count as f32 * font_px).ceil() as u32;
    let height = font_px.ceil() as u32;
    let mut mask = GlyphMask::blank(width, height, 0, -(font_px / 2.0).round() as i32);

    for (index, ch) in text.chars().enumerate() {
        let Some(rows) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..8 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let x0 = ((index * 8 + col) as f32 * cell).floor() as u32;
                let x1 = ((index * 8 + col + 1) as f32 * cell).ceil() as u32;
                let y0 = (row as f32 * cell).floor() as u32;
                let y1 = ((row + 1) as f32 * cell).ceil() as u32;
                for y in y0..y1.min(height) {
                    for x in x0..x1.min(width) {
                        mask.raise(x, y, 1.0);
                    }
                }
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_metrics_are_one_em_per_char() {
        let face = Typeface::bitmap();
        assert_eq!(face.text_width("Hello", 50.0), 250.0);
        assert_eq!(face.text_width("", 50.0), 0.0);
        assert_eq!(face.text_width("héllo", 10.0), 50.0);
    }

    #[test]
    fn test_bitmap_mask_is_centered_vertically() {
        let mask = Typeface::bitmap().rasterize("H", 16.0);
        assert_eq!((mask.width, mask.height), (16, 16));
        assert_eq!(mask.top, -8);
        // 'H' has both stems set on the first row.
        assert_eq!(mask.get(0, 0), 1.0);
        assert_eq!(mask.get(3, 0), 1.0);
        assert_eq!(mask.get(4, 0), 0.0);
    }

    #[test]
    fn test_empty_text_has_empty_mask() {
        assert!(Typeface::bitmap().rasterize("", 40.0).is_empty());
    }

    #[test]
    fn test_dilate_grows_by_radius() {
        let mut dot = GlyphMask::blank(1, 1, 5, 5);
        dot.coverage[0] = 1.0;
        let grown = dot.dilate(2.0);
        assert_eq!((grown.width, grown.height), (5, 5));
        assert_eq!((grown.left, grown.top), (3, 3));
        assert_eq!(grown.get(2, 0), 1.0);
        assert_eq!(grown.get(0, 2), 1.0);
        // Round corners: the corner of the square stays clear.
        assert_eq!(grown.get(0, 0), 0.0);
    }

    #[test]
    fn test_blur_spreads_and_preserves_mass() {
        let mut dot = GlyphMask::blank(1, 1, 0, 0);
        dot.coverage[0] = 1.0;
        let blurred = dot.blur(1);
        assert_eq!((blurred.width, blurred.height), (3, 3));
        let total: f32 = blurred.coverage.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(blurred.get(0, 0) > 0.0);
        assert!(blurred.get(1, 1) < 1.0);
    }
}
