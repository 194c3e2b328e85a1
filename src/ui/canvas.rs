// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor canvas.
//!
//! Shows the rendered preview and turns raw egui pointer and touch events
//! into the editor's gesture stream. Mouse and touch are two adapters over
//! the same down/move/up gestures; only the primary touch point is
//! followed, and leaving the canvas ends a gesture exactly like releasing.

use crate::editor::drag::{CursorAffordance, Gesture};
use crate::util::geometry::screen_to_scene;

/// Normalizes egui input into scene-space gestures.
#[derive(Debug, Default)]
pub struct InputAdapter {
    /// Primary touch being followed.
    touch: Option<egui::TouchId>,
    /// Primary mouse button held after a press on the canvas.
    pressed: bool,
    /// Pointer currently over the canvas.
    hovering: bool,
}

impl InputAdapter {
    /// Reset after the canvas is replaced.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Translate one frame of events. `canvas` is where the working canvas
    /// (of size `working`) is displayed on screen.
    pub fn translate(
        &mut self,
        events: &[egui::Event],
        canvas: egui::Rect,
        working: (u32, u32),
    ) -> Vec<Gesture> {
        let to_scene = |pos: egui::Pos2| {
            screen_to_scene(
                (pos.x - canvas.min.x) as f64,
                (pos.y - canvas.min.y) as f64,
                (canvas.width() as f64, canvas.height() as f64),
                working,
            )
        };

        // Touch input also arrives as emulated mouse events; when the frame
        // carries real touches, those win.
        let has_touch = events.iter().any(|e| matches!(e, egui::Event::Touch { .. }));

        let mut gestures = Vec::new();
        for event in events {
            match event {
                egui::Event::Touch { id, phase, pos, .. } => {
                    self.touch_event(*id, *phase, *pos, canvas, &to_scene, &mut gestures);
                }
                _ if has_touch || self.touch.is_some() => {}
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    if *pressed && canvas.contains(*pos) {
                        self.pressed = true;
                        self.hovering = true;
                        gestures.push(Gesture::Down(to_scene(*pos)));
                    } else if !*pressed && self.pressed {
                        self.pressed = false;
                        gestures.push(Gesture::Up);
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    if canvas.contains(*pos) {
                        self.hovering = true;
                        gestures.push(Gesture::Move(to_scene(*pos)));
                    } else if self.hovering {
                        self.hovering = false;
                        self.pressed = false;
                        gestures.push(Gesture::Up);
                    }
                }
                egui::Event::PointerGone => {
                    if self.hovering || self.pressed {
                        self.hovering = false;
                        self.pressed = false;
                        gestures.push(Gesture::Up);
                    }
                }
                _ => {}
            }
        }
        gestures
    }

    fn touch_event(
        &mut self,
        id: egui::TouchId,
        phase: egui::TouchPhase,
        pos: egui::Pos2,
        canvas: egui::Rect,
        to_scene: &dyn Fn(egui::Pos2) -> crate::models::annotation::Point,
        gestures: &mut Vec<Gesture>,
    ) {
        match phase {
            egui::TouchPhase::Start => {
                if self.touch.is_none() && canvas.contains(pos) {
                    self.touch = Some(id);
                    gestures.push(Gesture::Down(to_scene(pos)));
                }
            }
            egui::TouchPhase::Move => {
                if self.touch == Some(id) {
                    gestures.push(Gesture::Move(to_scene(pos)));
                }
            }
            egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                if self.touch == Some(id) {
                    self.touch = None;
                    gestures.push(Gesture::Up);
                }
            }
        }
    }
}

/// Display size for a working canvas inside `available`, never enlarged.
pub fn display_size(working: (u32, u32), available: egui::Vec2) -> egui::Vec2 {
    let (width, height) = (working.0 as f32, working.1 as f32);
    let scale = (available.x / width).min(available.y / height).min(1.0).max(0.0);
    egui::vec2(width * scale, height * scale)
}

/// Show the canvas and return the gestures produced this frame.
pub fn show(
    ui: &mut egui::Ui,
    preview: Option<&egui::TextureHandle>,
    working: Option<(u32, u32)>,
    adapter: &mut InputAdapter,
    cursor: CursorAffordance,
    loading: bool,
) -> Vec<Gesture> {
    let mut gestures = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);
    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        if loading {
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.spinner();
                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new("Loading image...")
                            .size(16.0)
                            .color(egui::Color32::from_gray(200)),
                    );
                });
            });
            return;
        }

        let (Some(texture), Some(working)) = (preview, working) else {
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.heading(
                        egui::RichText::new("memeforge")
                            .size(32.0)
                            .color(egui::Color32::from_gray(200)),
                    );
                    ui.add_space(20.0);
                    ui.label(
                        egui::RichText::new("Upload an image or pick a template to begin")
                            .color(egui::Color32::from_gray(180)),
                    );
                });
            });
            return;
        };

        let size = display_size(working, ui.available_size());
        let offset = (ui.available_size() - size) / 2.0;
        let canvas_rect = egui::Rect::from_min_size(ui.min_rect().min + offset, size);

        ui.painter().image(
            texture.id(),
            canvas_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        // Claim the pointer so drags move text instead of the window.
        let response = ui.allocate_rect(canvas_rect, egui::Sense::click_and_drag());

        let events = ui.input(|i| i.events.clone());
        gestures = adapter.translate(&events, canvas_rect, working);

        if response.hovered() || cursor == CursorAffordance::Grabbing {
            ui.ctx().set_cursor_icon(match cursor {
                CursorAffordance::Default => egui::CursorIcon::Default,
                CursorAffordance::Grab => egui::CursorIcon::Grab,
                CursorAffordance::Grabbing => egui::CursorIcon::Grabbing,
            });
        }
    });

    gestures
}
