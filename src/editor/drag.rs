// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hit-test and drag controller.
//!
//! Pointer and touch input both arrive here as one stream of gestures in
//! scene coordinates. A press on an annotation captures it together with
//! the offset between the pointer and its center; every move then places
//! the center at `pointer - offset` (recomputed from the absolute position,
//! never accumulated) and clamps it inside the canvas.

use crate::models::annotation::Point;
use crate::models::scene::Scene;
use crate::models::style::StyleControls;
use crate::render::typeface::TextMetrics;

/// Normalized input, already in working-canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Down(Point),
    Move(Point),
    /// Release or the pointer leaving the canvas.
    Up,
}

/// Cursor shown over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorAffordance {
    #[default]
    Default,
    Grab,
    Grabbing,
}

/// What a gesture did to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    None,
    /// A press captured an annotation; the style controls should show this.
    Grabbed(StyleControls),
    Moved,
    Released,
}

#[derive(Debug, Clone)]
struct DragState {
    id: String,
    offset: Point,
}

/// Tracks the gesture in progress and the cursor affordance.
#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragState>,
    cursor: CursorAffordance,
}

impl DragController {
    pub fn cursor(&self) -> CursorAffordance {
        self.cursor
    }

    /// Apply one gesture to the scene.
    pub fn handle(
        &mut self,
        gesture: Gesture,
        scene: &mut Scene,
        metrics: &dyn TextMetrics,
    ) -> DragOutcome {
        if scene.background().is_none() {
            return DragOutcome::None;
        }

        match gesture {
            Gesture::Down(pointer) => {
                let Some((id, center)) = scene
                    .annotation_at(pointer, metrics)
                    .map(|hit| (hit.id.clone(), hit.center()))
                else {
                    return DragOutcome::None;
                };
                let Some(style) = scene.select(&id) else {
                    return DragOutcome::None;
                };

                log::debug!("Grabbed annotation {} at ({:.1}, {:.1})", id, pointer.x, pointer.y);
                self.active = Some(DragState {
                    id,
                    offset: pointer.offset_from(center),
                });
                self.cursor = CursorAffordance::Grabbing;
                DragOutcome::Grabbed(style)
            }
            Gesture::Move(pointer) => {
                let Some((id, offset)) = self
                    .active
                    .as_ref()
                    .map(|state| (state.id.clone(), state.offset))
                else {
                    self.cursor = if scene.annotation_at(pointer, metrics).is_some() {
                        CursorAffordance::Grab
                    } else {
                        CursorAffordance::Default
                    };
                    return DragOutcome::None;
                };

                let proposed = pointer.offset_from(offset);
                match scene.move_annotation(&id, proposed.x, proposed.y, metrics) {
                    Some(_) => DragOutcome::Moved,
                    None => {
                        // The annotation went away mid-drag.
                        self.active = None;
                        self.cursor = CursorAffordance::Default;
                        DragOutcome::Released
                    }
                }
            }
            Gesture::Up => {
                self.cursor = CursorAffordance::Default;
                match self.active.take() {
                    Some(state) => {
                        log::debug!("Released annotation {}", state.id);
                        DragOutcome::Released
                    }
                    None => DragOutcome::None,
                }
            }
        }
    }
}
