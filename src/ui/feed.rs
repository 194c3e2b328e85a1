// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The meme feed.
//!
//! Cards with the flattened image, author, relative time and upvotes.
//! Owners also get edit and delete buttons. Deleting asks first.

use crate::io::media;
use crate::models::meme::{Identity, Meme, Vote};
use crate::util::time::format_relative_time;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

const THUMBNAIL_WIDTH: u32 = 480;

/// Result of feed interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedAction {
    None,
    Create,
    Upvote(String),
    Edit(String),
    /// Ask before deleting.
    Delete(String),
    ConfirmDelete(String),
    CancelDelete,
}

/// Hover text and highlight for a card's upvote button.
fn upvote_hint(signed_in: bool, voted: bool) -> &'static str {
    match (signed_in, voted) {
        (false, _) => "Sign in to upvote",
        (true, true) => "Remove upvote",
        (true, false) => "Upvote",
    }
}

/// Decoded card images, keyed by meme id and invalidated when the image
/// changes.
#[derive(Default)]
pub struct ThumbnailCache {
    entries: HashMap<String, (u64, Option<egui::TextureHandle>)>,
}

impl ThumbnailCache {
    fn texture(&mut self, ctx: &egui::Context, meme: &Meme) -> Option<egui::TextureHandle> {
        let mut hasher = DefaultHasher::new();
        meme.image_url.hash(&mut hasher);
        let fingerprint = hasher.finish();

        if let Some((cached, texture)) = self.entries.get(&meme.id) {
            if *cached == fingerprint {
                return texture.clone();
            }
        }

        let texture = match decode_thumbnail(&meme.image_url) {
            Ok(image) => {
                let size = [image.width() as usize, image.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                Some(ctx.load_texture(
                    format!("meme-{}", meme.id),
                    color_image,
                    egui::TextureOptions::LINEAR,
                ))
            }
            Err(e) => {
                log::warn!("Cannot show meme {}: {:#}", meme.id, e);
                None
            }
        };
        self.entries
            .insert(meme.id.clone(), (fingerprint, texture.clone()));
        texture
    }

    /// Drop entries for memes no longer listed.
    pub fn retain(&mut self, memes: &[Meme]) {
        self.entries
            .retain(|id, _| memes.iter().any(|meme| &meme.id == id));
    }
}

fn decode_thumbnail(image_url: &str) -> anyhow::Result<image::RgbaImage> {
    let bytes = media::decode_data_url(image_url)?;
    let image = media::decode_image(&bytes)?;
    if image.width() <= THUMBNAIL_WIDTH {
        return Ok(image);
    }
    let height = (image.height() as u64 * THUMBNAIL_WIDTH as u64 / image.width() as u64).max(1);
    Ok(image::imageops::thumbnail(&image, THUMBNAIL_WIDTH, height as u32))
}

/// Ids of the memes the viewer has upvoted.
pub fn voted_by(votes: &[Vote], viewer: Option<&Identity>) -> HashSet<String> {
    let Some(viewer) = viewer else {
        return HashSet::new();
    };
    votes
        .iter()
        .filter(|vote| viewer.matches(&vote.user_id))
        .map(|vote| vote.meme_id.clone())
        .collect()
}

/// Modal asking the owner to confirm a delete.
pub fn confirm_delete(ctx: &egui::Context, meme_id: &str) -> FeedAction {
    let mut action = FeedAction::None;
    egui::Window::new("Delete meme")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label("Delete this meme? This cannot be undone.");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Delete").clicked() {
                    action = FeedAction::ConfirmDelete(meme_id.to_string());
                }
                if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    action = FeedAction::CancelDelete;
                }
            });
        });
    action
}

/// Display the feed.
pub fn show(
    ui: &mut egui::Ui,
    memes: &[Meme],
    viewer: Option<&Identity>,
    voted: &HashSet<String>,
    thumbnails: &mut ThumbnailCache,
    now: i64,
) -> FeedAction {
    let mut action = FeedAction::None;

    ui.horizontal(|ui| {
        ui.heading("Meme Feed");
        if ui.button("➕ Create Meme").clicked() {
            action = FeedAction::Create;
        }
    });
    ui.separator();

    if memes.is_empty() {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new("No memes yet. Be the first to post one!")
                    .color(egui::Color32::from_gray(180)),
            );
        });
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for meme in memes {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_max_width(THUMBNAIL_WIDTH as f32 + 16.0);

                match thumbnails.texture(ui.ctx(), meme) {
                    Some(texture) => {
                        let size = texture.size_vec2();
                        let scale = (THUMBNAIL_WIDTH as f32 / size.x).min(1.0);
                        ui.add(egui::Image::new(&texture).fit_to_exact_size(size * scale));
                    }
                    None => {
                        ui.label(egui::RichText::new("Image unavailable").weak());
                    }
                }

                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(meme.author_label(viewer)).strong());
                    ui.label(egui::RichText::new(format_relative_time(meme.created_at, now)).weak());
                    if meme.is_new(now) {
                        ui.label(
                            egui::RichText::new("New")
                                .small()
                                .color(egui::Color32::from_rgb(80, 200, 120)),
                        );
                    }
                });

                ui.horizontal(|ui| {
                    let has_voted = voted.contains(&meme.id);
                    let upvote = ui
                        .add_enabled(
                            viewer.is_some(),
                            egui::Button::new(format!("▲ {}", meme.upvotes)).selected(has_voted),
                        )
                        .on_hover_text(upvote_hint(viewer.is_some(), has_voted))
                        .on_disabled_hover_text(upvote_hint(false, false));
                    if upvote.clicked() {
                        action = FeedAction::Upvote(meme.id.clone());
                    }

                    if meme.is_owned_by(viewer) {
                        if ui.button("✏ Edit").clicked() {
                            action = FeedAction::Edit(meme.id.clone());
                        }
                        if ui.button("🗑 Delete").clicked() {
                            action = FeedAction::Delete(meme.id.clone());
                        }
                    }
                });
            });
            ui.add_space(8.0);
        }
    });

    action
}
