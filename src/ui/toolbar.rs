// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor toolbar.
//!
//! Image sources, the style controls and the export/submit buttons.

use crate::io::media::TEMPLATES;
use crate::models::style::{StyleControls, FONT_SIZE_RANGE};
use crate::util::color;
use std::path::PathBuf;

/// Something the user asked for from the toolbar.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    OpenFile(PathBuf),
    OpenTemplate(String),
    AddText,
    FontSize(u32),
    Color(String),
    Download,
    Submit,
}

/// What the toolbar needs to know to label and enable its buttons.
pub struct ToolbarState<'a> {
    pub style: &'a StyleControls,
    pub editing: bool,
    pub submitting: bool,
    /// A stored meme is still loading; its background must not be replaced.
    pub hydrating: bool,
}

pub fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", &["jpg", "jpeg", "png", "gif", "webp", "bmp"])
        .pick_file()
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, state: &ToolbarState) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.add_enabled_ui(!state.hydrating, |ui| {
            if ui.button("📁 Upload Image").clicked() {
                if let Some(path) = pick_image_file() {
                    action = ToolbarAction::OpenFile(path);
                }
            }

            ui.menu_button("🖼 Templates", |ui| {
                for name in TEMPLATES {
                    if ui.button(name.trim_end_matches(".jpg")).clicked() {
                        action = ToolbarAction::OpenTemplate(name.to_string());
                        ui.close_menu();
                    }
                }
            });
        });

        ui.separator();

        if ui.button("➕ Add Text Box").clicked() {
            action = ToolbarAction::AddText;
        }

        let mut font_size = state.style.font_size;
        if ui
            .add(egui::Slider::new(&mut font_size, FONT_SIZE_RANGE).text("Font size"))
            .changed()
        {
            action = ToolbarAction::FontSize(font_size);
        }

        ui.label("Color");
        let mut rgb = color::fill_or_white(&state.style.color);
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            action = ToolbarAction::Color(color::to_hex(rgb));
        }

        ui.separator();

        if ui.button("⬇ Download").clicked() {
            action = ToolbarAction::Download;
        }

        let label = match (state.editing, state.submitting) {
            (false, false) => "Post Meme",
            (false, true) => "Posting...",
            (true, false) => "Update Meme",
            (true, true) => "Updating...",
        };
        if ui
            .add_enabled(!state.submitting, egui::Button::new(label))
            .clicked()
        {
            action = ToolbarAction::Submit;
        }
    });

    action
}
