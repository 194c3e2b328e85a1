// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text box list.
//!
//! Lists every annotation with an editable text field, and lets the user
//! select or delete each one.

use crate::models::annotation::Annotation;

/// Result of properties panel interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesAction {
    None,
    Select(String),
    Delete(String),
    EditText(String, String),
}

/// Display the text box list.
pub fn show(ui: &mut egui::Ui, annotations: &[Annotation], selected: Option<&str>) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Text Boxes");
    ui.separator();

    if annotations.is_empty() {
        ui.label(egui::RichText::new("No text boxes yet").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, annotation) in annotations.iter().enumerate() {
            let is_selected = selected == Some(annotation.id.as_str());

            let frame = if is_selected {
                egui::Frame::group(ui.style()).stroke(egui::Stroke::new(
                    2.0,
                    egui::Color32::from_rgb(0xff, 0x57, 0x22),
                ))
            } else {
                egui::Frame::group(ui.style())
            };

            frame.show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("#{}", index + 1));
                    ui.label(
                        egui::RichText::new(format!("{}px {}", annotation.font_size, annotation.color))
                            .weak(),
                    );
                });

                let mut text = annotation.text.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut text).desired_width(f32::INFINITY))
                    .changed()
                {
                    action = PropertiesAction::EditText(annotation.id.clone(), text);
                }

                ui.horizontal(|ui| {
                    if ui.add_enabled(!is_selected, egui::Button::new("Select")).clicked() {
                        action = PropertiesAction::Select(annotation.id.clone());
                    }
                    if ui.button("🗑 Delete").clicked() {
                        action = PropertiesAction::Delete(annotation.id.clone());
                    }
                });
            });
            ui.add_space(4.0);
        }
    });

    action
}
