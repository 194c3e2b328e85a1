// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Style controls shared by the selection and the next added annotation.

use super::annotation::Annotation;
use std::ops::RangeInclusive;

pub const DEFAULT_FONT_SIZE: u32 = 40;
pub const DEFAULT_COLOR: &str = "#ffffff";

/// Range offered by the font size slider.
pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 20..=100;

/// Current values of the font size and color controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleControls {
    pub font_size: u32,
    pub color: String,
}

impl Default for StyleControls {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl StyleControls {
    /// Style carried by an existing annotation. An empty color reads as white.
    pub fn of(annotation: &Annotation) -> Self {
        let color = if annotation.color.is_empty() {
            DEFAULT_COLOR.to_string()
        } else {
            annotation.color.clone()
        };
        Self {
            font_size: annotation.font_size,
            color,
        }
    }
}
