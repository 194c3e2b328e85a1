// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module owns the feed, the editor and every background task, and
//! routes UI actions from the panels to them.

use crate::config::Config;
use crate::editor::{Editor, EditorMode, Guard, SubmitTarget};
use crate::io::media::{ImageLoader, ImageSource, LoadPoll};
use crate::io::serialization::{self, Composition};
use crate::io::store::{MemeDraft, MemeStore};
use crate::models::annotation::Annotation;
use crate::models::meme::{Identity, Meme};
use crate::render::{self, export, typeface::Typeface};
use crate::ui::{canvas, feed, properties, toolbar};
use crate::util::time::now_millis;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// How often the feed checks the store for writes made elsewhere.
const FEED_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Feed,
    Editor,
}

/// What to do with a background once it has decoded.
enum LoadPurpose {
    /// Replace the background, keep the annotations.
    Background,
    /// Seed an editor opened on a stored meme.
    Hydrate { annotations: Vec<Annotation> },
}

struct PendingLoad {
    loader: ImageLoader,
    purpose: LoadPurpose,
}

/// A store write running on a background thread.
struct PendingSubmit {
    target: SubmitTarget,
    receiver: Receiver<anyhow::Result<Meme>>,
}

/// Main application state.
pub struct MemeApp {
    config: Config,
    identity: Option<Identity>,
    store: Arc<dyn MemeStore>,
    typeface: Arc<Typeface>,

    page: Page,
    editor: Editor,
    input: canvas::InputAdapter,

    /// Preview texture and the scene revision it was rendered from.
    preview: Option<(u64, egui::TextureHandle)>,

    image_loader: Option<PendingLoad>,
    submit: Option<PendingSubmit>,

    memes: Vec<Meme>,
    /// Memes the signed-in user has upvoted.
    voted: HashSet<String>,
    /// Store revision the feed list was read at.
    feed_revision: Option<u64>,
    thumbnails: feed::ThumbnailCache,
    /// Meme waiting for the owner to confirm its deletion.
    pending_delete: Option<String>,

    /// Blocking message shown until dismissed.
    modal: Option<String>,
    status: Option<String>,
}

impl MemeApp {
    pub fn new(
        config: Config,
        store: Arc<dyn MemeStore>,
        typeface: Arc<Typeface>,
    ) -> Self {
        let identity = config.identity();
        match &identity {
            Some(user) => log::info!("Signed in as {}", user.id),
            None => log::info!("No user configured; posting is disabled"),
        }
        let editor = Editor::new(
            EditorMode::Create,
            config.max_canvas_width,
            config.max_canvas_height,
        );

        Self {
            config,
            identity,
            store,
            typeface,
            page: Page::Feed,
            editor,
            input: canvas::InputAdapter::default(),
            preview: None,
            image_loader: None,
            submit: None,
            memes: Vec::new(),
            voted: HashSet::new(),
            feed_revision: None,
            thumbnails: feed::ThumbnailCache::default(),
            pending_delete: None,
            modal: None,
            status: None,
        }
    }

    fn show_guard(&mut self, guard: Guard) {
        log::info!("Blocked: {}", guard.message());
        self.modal = Some(guard.message().to_string());
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.modal = Some(message.into());
    }

    /// Replace the editor and drop everything tied to the old one.
    fn open_editor(&mut self, mode: EditorMode) {
        self.editor = Editor::new(
            mode,
            self.config.max_canvas_width,
            self.config.max_canvas_height,
        );
        self.input.reset();
        self.preview = None;
        self.image_loader = None;
        self.page = Page::Editor;
    }

    fn start_load(&mut self, source: ImageSource, purpose: LoadPurpose) {
        self.image_loader = Some(PendingLoad {
            loader: ImageLoader::spawn(
                source,
                self.config.template_dir.clone(),
                self.config.load_timeout(),
            ),
            purpose,
        });
    }

    /// A stored meme or composition is still being opened.
    fn hydrating(&self) -> bool {
        matches!(
            &self.image_loader,
            Some(PendingLoad {
                purpose: LoadPurpose::Hydrate { .. },
                ..
            })
        )
    }

    /// Replace the editor background, unless a meme is still being opened
    /// into the editor.
    fn load_background(&mut self, source: ImageSource) {
        if self.hydrating() {
            self.show_guard(Guard::StillLoading);
            return;
        }
        self.start_load(source, LoadPurpose::Background);
    }

    /// Check for a finished background load.
    fn poll_image_loader(&mut self) {
        let Some(pending) = &self.image_loader else {
            return;
        };
        let result = match pending.loader.poll() {
            LoadPoll::Pending => return,
            LoadPoll::TimedOut => Err(anyhow::anyhow!(
                "Timed out after {}s",
                self.config.load_timeout_secs
            )),
            LoadPoll::Ready(result) => result,
        };
        let Some(pending) = self.image_loader.take() else {
            return;
        };

        match (result, pending.purpose) {
            (Ok(loaded), purpose) => {
                let reference = loaded.reference.clone();
                self.editor.scene.load_background(loaded.reference, loaded.image);
                if let LoadPurpose::Hydrate { annotations } = purpose {
                    self.editor.hydrate(&reference, annotations);
                }
            }
            (Err(e), LoadPurpose::Background) => {
                log::error!("Failed to load image: {:#}", e);
                self.show_error("The image could not be loaded. Please try another file.");
            }
            (Err(e), LoadPurpose::Hydrate { .. }) => {
                // An editor without its background must not post over the meme.
                log::error!("Failed to open meme background: {:#}", e);
                self.open_editor(EditorMode::Create);
                self.page = Page::Feed;
                self.show_error("This meme could not be opened for editing. Please try again.");
            }
        }
    }

    /// Check for a settled submit. The trigger is re-enabled either way.
    fn poll_submit(&mut self) {
        let Some(pending) = &self.submit else {
            return;
        };
        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("Submit worker stopped")),
        };
        let Some(pending) = self.submit.take() else {
            return;
        };

        match (result, pending.target) {
            (Ok(meme), SubmitTarget::Create) => {
                log::info!("Posted meme {}", meme.id);
                self.status = Some("Meme posted!".to_string());
                self.open_editor(EditorMode::Create);
                self.page = Page::Feed;
            }
            (Ok(meme), SubmitTarget::Update { .. }) => {
                log::info!("Updated meme {}", meme.id);
                self.status = Some("Meme updated!".to_string());
                self.open_editor(EditorMode::Create);
                self.page = Page::Feed;
            }
            (Err(e), SubmitTarget::Create) => {
                log::error!("Failed to post meme: {:#}", e);
                self.show_error("Failed to post meme. Please try again.");
            }
            (Err(e), SubmitTarget::Update { .. }) => {
                log::error!("Failed to update meme: {:#}", e);
                self.show_error("Failed to update meme. Please try again.");
            }
        }
    }

    /// Flatten the scene and hand it to the store on a background thread.
    fn submit(&mut self) {
        if self.submit.is_some() {
            self.show_guard(Guard::SubmitInProgress);
            return;
        }
        let Some(user) = self.identity.clone() else {
            self.show_guard(Guard::NotSignedIn);
            return;
        };
        let submission = match self.editor.submission(&self.typeface) {
            Ok(submission) => submission,
            Err(guard) => {
                self.show_guard(guard);
                return;
            }
        };

        let (sender, receiver) = channel();
        let store = Arc::clone(&self.store);
        let target = submission.target.clone();

        std::thread::spawn(move || {
            let result = (|| -> anyhow::Result<Meme> {
                let draft = MemeDraft {
                    image_url: export::to_data_url(&submission.flattened)?,
                    base_image_url: submission.base_image,
                    text_boxes: submission.annotations,
                };
                match submission.target {
                    SubmitTarget::Create => store.create(draft, &user),
                    SubmitTarget::Update { meme_id } => store.update(&meme_id, draft, &user),
                }
            })();
            let _ = sender.send(result);
        });

        self.submit = Some(PendingSubmit { target, receiver });
    }

    fn download(&mut self) {
        let image = match self.editor.flatten(&self.typeface) {
            Ok(image) => image,
            Err(guard) => {
                self.show_guard(guard);
                return;
            }
        };
        match export::save_png_in(&image, &self.config.export_dir) {
            Ok(path) => self.status = Some(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Failed to export meme: {:#}", e);
                self.show_error("Failed to save the meme image.");
            }
        }
    }

    fn save_composition(&mut self) {
        let Some(background) = self.editor.scene.background() else {
            self.show_guard(Guard::NoImage);
            return;
        };
        let (canvas_width, canvas_height) = background.working_size();
        let composition = Composition {
            base_image: background.source.clone(),
            canvas_width,
            canvas_height,
            annotations: self.editor.scene.annotations().to_vec(),
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("Composition", &["yaml", "yml", "json"])
            .set_file_name("meme.yaml")
            .save_file()
        else {
            return;
        };
        if let Err(e) = serialization::save_composition(&composition, &path) {
            log::error!("{:#}", e);
            self.show_error("Failed to save the composition.");
        }
    }

    fn open_composition(&mut self, path: PathBuf) {
        match serialization::open_composition(&path) {
            Ok(composition) => {
                log::info!(
                    "Opened composition with {} text boxes from {}",
                    composition.annotations.len(),
                    path.display()
                );
                self.open_editor(EditorMode::Create);
                self.start_load(
                    ImageSource::Stored(composition.base_image),
                    LoadPurpose::Hydrate {
                        annotations: composition.annotations,
                    },
                );
            }
            Err(e) => {
                log::error!("{:#}", e);
                self.show_error("Failed to open the composition.");
            }
        }
    }

    /// Open a stored meme for editing, if the viewer may.
    fn edit_meme(&mut self, id: &str) {
        if self.identity.is_none() {
            self.show_guard(Guard::NotSignedIn);
            return;
        }
        let meme = match self.store.get(id) {
            Ok(Some(meme)) => meme,
            Ok(None) => {
                self.show_error("This meme no longer exists.");
                return;
            }
            Err(e) => {
                log::error!("Failed to read meme {}: {:#}", id, e);
                self.show_error("Failed to open meme. Please try again.");
                return;
            }
        };
        if !meme.is_owned_by(self.identity.as_ref()) {
            self.show_guard(Guard::NotOwner);
            return;
        }
        let Some(base) = meme.base_image_url.clone() else {
            self.show_guard(Guard::NoBaseImage);
            return;
        };
        let annotations = match serialization::decode_annotations(&meme.text_boxes) {
            Ok(annotations) => annotations,
            Err(e) => {
                log::error!("Meme {}: {:#}", meme.id, e);
                self.show_guard(Guard::UnreadableMeme);
                return;
            }
        };

        self.open_editor(EditorMode::Edit {
            meme_id: meme.id.clone(),
        });
        self.start_load(ImageSource::Stored(base), LoadPurpose::Hydrate { annotations });
    }

    fn handle_feed_action(&mut self, action: feed::FeedAction) {
        match action {
            feed::FeedAction::None => {}
            feed::FeedAction::Create => self.open_editor(EditorMode::Create),
            feed::FeedAction::Edit(id) => self.edit_meme(&id),
            feed::FeedAction::Upvote(id) => {
                let Some(user) = self.identity.clone() else {
                    self.show_guard(Guard::NotSignedIn);
                    return;
                };
                if let Err(e) = self.store.toggle_vote(&id, &user) {
                    log::error!("Failed to toggle upvote: {:#}", e);
                    self.show_error("Failed to update the upvote. Please try again.");
                }
            }
            feed::FeedAction::Delete(id) => self.pending_delete = Some(id),
            feed::FeedAction::CancelDelete => self.pending_delete = None,
            feed::FeedAction::ConfirmDelete(id) => {
                self.pending_delete = None;
                let Some(user) = self.identity.clone() else {
                    self.show_guard(Guard::NotSignedIn);
                    return;
                };
                if let Err(e) = self.store.delete(&id, &user) {
                    log::error!("Failed to delete meme: {:#}", e);
                    self.show_error("Failed to delete meme. Please try again.");
                }
            }
        }
    }

    fn handle_toolbar_action(&mut self, action: toolbar::ToolbarAction) {
        match action {
            toolbar::ToolbarAction::None => {}
            toolbar::ToolbarAction::OpenFile(path) => self.load_background(ImageSource::File(path)),
            toolbar::ToolbarAction::OpenTemplate(name) => {
                self.load_background(ImageSource::Template(name))
            }
            toolbar::ToolbarAction::AddText => {
                if let Err(guard) = self.editor.add_annotation() {
                    self.show_guard(guard);
                }
            }
            toolbar::ToolbarAction::FontSize(size) => self.editor.set_font_size(size),
            toolbar::ToolbarAction::Color(color) => self.editor.set_color(&color),
            toolbar::ToolbarAction::Download => self.download(),
            toolbar::ToolbarAction::Submit => self.submit(),
        }
    }

    fn handle_properties_action(&mut self, action: properties::PropertiesAction) {
        match action {
            properties::PropertiesAction::None => {}
            properties::PropertiesAction::Select(id) => self.editor.select(&id),
            properties::PropertiesAction::Delete(id) => self.editor.delete(&id),
            properties::PropertiesAction::EditText(id, text) => self.editor.set_text(&id, &text),
        }
    }

    /// Re-read the feed when the store changed.
    fn refresh_feed(&mut self) {
        let revision = self.store.revision();
        if self.feed_revision == Some(revision) {
            return;
        }
        let listed = self
            .store
            .list()
            .and_then(|memes| self.store.votes().map(|votes| (memes, votes)));
        match listed {
            Ok((memes, votes)) => {
                self.thumbnails.retain(&memes);
                self.memes = memes;
                self.voted = feed::voted_by(&votes, self.identity.as_ref());
            }
            Err(e) => {
                log::error!("Failed to load feed: {:#}", e);
                self.status = Some("Could not load the feed.".to_string());
            }
        }
        self.feed_revision = Some(revision);
    }

    /// Upload the preview when the scene changed since the last upload.
    fn refresh_preview(&mut self, ctx: &egui::Context) {
        let revision = self.editor.scene.revision();
        if matches!(&self.preview, Some((rendered, _)) if *rendered == revision) {
            return;
        }
        let Some(image) = render::render_preview(&self.editor.scene, &self.typeface) else {
            self.preview = None;
            return;
        };
        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        match &mut self.preview {
            Some((rendered, texture)) => {
                texture.set(color_image, egui::TextureOptions::LINEAR);
                *rendered = revision;
            }
            None => {
                let texture = ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR);
                self.preview = Some((revision, texture));
            }
        }
    }

    fn show_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.modal.clone() else {
            return;
        };
        egui::Window::new("memeforge")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.modal = None;
                }
            });
    }

    fn show_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New Meme").clicked() {
                        self.open_editor(EditorMode::Create);
                        ui.close_menu();
                    }
                    if ui.button("Open Image...").clicked() {
                        if let Some(path) = toolbar::pick_image_file() {
                            if self.page != Page::Editor {
                                self.open_editor(EditorMode::Create);
                            }
                            self.load_background(ImageSource::File(path));
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Open Composition...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Composition", &["yaml", "yml", "json"])
                            .pick_file()
                        {
                            self.open_composition(path);
                        }
                        ui.close_menu();
                    }
                    let in_editor = self.page == Page::Editor;
                    if ui
                        .add_enabled(in_editor, egui::Button::new("Save Composition..."))
                        .clicked()
                    {
                        self.save_composition();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(in_editor, egui::Button::new("Export PNG"))
                        .clicked()
                    {
                        self.download();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui
                        .selectable_label(self.page == Page::Feed, "Feed")
                        .clicked()
                    {
                        self.page = Page::Feed;
                        ui.close_menu();
                    }
                    if ui
                        .selectable_label(self.page == Page::Editor, "Editor")
                        .clicked()
                    {
                        self.page = Page::Editor;
                        ui.close_menu();
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match &self.identity {
                        Some(user) => ui.label(format!(
                            "Signed in as {}",
                            user.email.as_deref().unwrap_or(&user.id)
                        )),
                        None => ui.label(egui::RichText::new("Not signed in").weak()),
                    };
                });
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match self.page {
                    Page::Feed => ui.label(format!("{} memes", self.memes.len())),
                    Page::Editor => {
                        let mode = match self.editor.mode() {
                            EditorMode::Create => "New meme",
                            EditorMode::Edit { .. } => "Editing meme",
                        };
                        ui.label(format!(
                            "{} | {} text boxes",
                            mode,
                            self.editor.scene.annotations().len()
                        ))
                    }
                };
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
                ui.separator();
                ui.label(egui::RichText::new(format!("Font: {}", self.typeface.name())).weak());
            });
        });
    }

    fn show_editor(&mut self, ctx: &egui::Context) {
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(
                    ui,
                    &toolbar::ToolbarState {
                        style: self.editor.style(),
                        editing: matches!(self.editor.mode(), EditorMode::Edit { .. }),
                        submitting: self.submit.is_some(),
                        hydrating: self.hydrating(),
                    },
                )
            })
            .inner;
        self.handle_toolbar_action(toolbar_action);

        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                properties::show(
                    ui,
                    self.editor.scene.annotations(),
                    self.editor.scene.selected_id(),
                )
            })
            .inner;
        self.handle_properties_action(properties_action);

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.editor.scene.clear_selection();
        }

        // Delete key removes the selection unless a text field has focus.
        if !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
        {
            if let Some(id) = self.editor.scene.selected_id().map(str::to_string) {
                self.editor.delete(&id);
            }
        }

        self.refresh_preview(ctx);

        let loading = self.image_loader.is_some();
        let working = self.editor.scene.working_size();
        let cursor = self.editor.cursor();
        let gestures = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    self.preview.as_ref().map(|(_, texture)| texture),
                    working,
                    &mut self.input,
                    cursor,
                    loading,
                )
            })
            .inner;

        // Gestures only apply between two renders, never mid-render.
        if !gestures.is_empty() {
            for gesture in gestures {
                self.editor.handle_gesture(gesture, &*self.typeface);
            }
            ctx.request_repaint();
        }
    }

    fn show_feed(&mut self, ctx: &egui::Context) {
        self.refresh_feed();
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                feed::show(
                    ui,
                    &self.memes,
                    self.identity.as_ref(),
                    &self.voted,
                    &mut self.thumbnails,
                    now_millis(),
                )
            })
            .inner;
        self.handle_feed_action(action);

        if let Some(id) = self.pending_delete.clone() {
            let action = feed::confirm_delete(ctx, &id);
            self.handle_feed_action(action);
        }
    }
}

impl eframe::App for MemeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image_loader();
        self.poll_submit();

        // Keep polling while background work is outstanding.
        if self.image_loader.is_some() || self.submit.is_some() {
            ctx.request_repaint();
        } else if self.page == Page::Feed {
            // Other instances may write to the same store.
            ctx.request_repaint_after(FEED_POLL_INTERVAL);
        }

        self.show_menu(ctx);
        self.show_status_bar(ctx);

        match self.page {
            Page::Feed => self.show_feed(ctx),
            Page::Editor => self.show_editor(ctx),
        }

        self.show_modal(ctx);
    }
}
