// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The meme editor: scene, style controls and drag controller together.
//!
//! The style controls and the selection are coupled both ways. Selecting
//! an annotation loads its font size and color into the controls;
//! changing a control writes through to the selected annotation. With
//! nothing selected the controls only hold the style for the next add.

pub mod drag;

use crate::models::annotation::Annotation;
use crate::models::scene::Scene;
use crate::models::style::StyleControls;
use crate::render::export;
use crate::render::typeface::{TextMetrics, Typeface};
use drag::{CursorAffordance, DragController, DragOutcome, Gesture};
use image::RgbaImage;

/// A user-facing precondition that blocked an action. Nothing changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    NoImage,
    NothingToExport,
    NotSignedIn,
    NotOwner,
    NoBaseImage,
    SubmitInProgress,
    StillLoading,
    UnreadableMeme,
}

impl Guard {
    pub fn message(&self) -> &'static str {
        match self {
            Guard::NoImage => "Please upload an image first!",
            Guard::NothingToExport => {
                "Please add an image and at least one text box before exporting!"
            }
            Guard::NotSignedIn => "Please sign in to post photos or memes.",
            Guard::NotOwner => "You can only edit memes you created.",
            Guard::NoBaseImage => "This meme was created before editing was available.",
            Guard::SubmitInProgress => "Your meme is still being saved.",
            Guard::StillLoading => "Please wait for the meme to finish loading.",
            Guard::UnreadableMeme => "This meme's text boxes could not be read.",
        }
    }
}

/// Whether the editor creates a new meme or updates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { meme_id: String },
}

/// Where a finished meme is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTarget {
    Create,
    Update { meme_id: String },
}

/// Everything the store needs from the editor for one submit.
pub struct Submission {
    pub target: SubmitTarget,
    pub flattened: RgbaImage,
    pub annotations: Vec<Annotation>,
    pub base_image: String,
}

pub struct Editor {
    pub scene: Scene,
    style: StyleControls,
    drag: DragController,
    mode: EditorMode,
    /// Background reference of the record being edited; kept on update.
    original_base: Option<String>,
    hydrated: bool,
}

impl Editor {
    pub fn new(mode: EditorMode, max_width: u32, max_height: u32) -> Self {
        Self {
            scene: Scene::new(max_width, max_height),
            style: StyleControls::default(),
            drag: DragController::default(),
            mode,
            original_base: None,
            hydrated: false,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn style(&self) -> &StyleControls {
        &self.style
    }

    pub fn cursor(&self) -> CursorAffordance {
        self.drag.cursor()
    }

    /// Seed the scene from a stored meme. Only the first call per editor
    /// has any effect; returns whether seeding happened.
    pub fn hydrate(&mut self, base_image: &str, annotations: Vec<Annotation>) -> bool {
        if self.hydrated {
            return false;
        }
        self.hydrated = true;
        self.original_base = Some(base_image.to_string());
        if !annotations.is_empty() {
            self.scene.seed_annotations(annotations);
        }
        log::info!(
            "Hydrated editor with {} annotations",
            self.scene.annotations().len()
        );
        true
    }

    pub fn add_annotation(&mut self) -> Result<String, Guard> {
        self.scene.add_annotation(&self.style).ok_or(Guard::NoImage)
    }

    /// Select from the list and load the annotation's style into the controls.
    pub fn select(&mut self, id: &str) {
        if let Some(style) = self.scene.select(id) {
            self.style = style;
        }
    }

    /// Delete an annotation; deleting the selection resets the controls.
    pub fn delete(&mut self, id: &str) {
        if self.scene.delete(id) {
            self.style = StyleControls::default();
        }
    }

    pub fn set_text(&mut self, id: &str, text: &str) {
        self.scene.update_text(id, text);
    }

    /// Font size control changed.
    pub fn set_font_size(&mut self, font_size: u32) {
        self.style.font_size = font_size;
        if let Some(id) = self.scene.selected_id().map(str::to_string) {
            self.scene.update_font_size(&id, font_size);
        }
    }

    /// Color control changed.
    pub fn set_color(&mut self, color: &str) {
        self.style.color = color.to_string();
        if let Some(id) = self.scene.selected_id().map(str::to_string) {
            self.scene.update_color(&id, color);
        }
    }

    /// Feed one normalized gesture through the drag controller.
    pub fn handle_gesture(&mut self, gesture: Gesture, metrics: &dyn TextMetrics) {
        if let DragOutcome::Grabbed(style) = self.drag.handle(gesture, &mut self.scene, metrics) {
            self.style = style;
        }
    }

    /// Flatten at native resolution.
    pub fn flatten(&self, typeface: &Typeface) -> Result<RgbaImage, Guard> {
        export::flatten(&self.scene, typeface).ok_or(Guard::NothingToExport)
    }

    /// Build the payload for the store. Updates keep the background
    /// reference of the record being edited.
    pub fn submission(&self, typeface: &Typeface) -> Result<Submission, Guard> {
        let flattened = self.flatten(typeface)?;
        let background = self.scene.background().ok_or(Guard::NoImage)?;

        let (target, base_image) = match &self.mode {
            EditorMode::Create => (SubmitTarget::Create, background.source.clone()),
            EditorMode::Edit { meme_id } => (
                SubmitTarget::Update {
                    meme_id: meme_id.clone(),
                },
                self.original_base
                    .clone()
                    .unwrap_or_else(|| background.source.clone()),
            ),
        };

        Ok(Submission {
            target,
            flattened,
            annotations: self.scene.annotations().to_vec(),
            base_image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Point;
    use crate::models::style::{DEFAULT_COLOR, DEFAULT_FONT_SIZE};

    fn editor_with_image(mode: EditorMode) -> Editor {
        let mut editor = Editor::new(mode, 800, 600);
        editor
            .scene
            .load_background("template://relatable.jpg".to_string(), RgbaImage::new(1600, 1200));
        editor
    }

    #[test]
    fn test_add_without_image_is_guarded() {
        let mut editor = Editor::new(EditorMode::Create, 800, 600);
        assert_eq!(editor.add_annotation(), Err(Guard::NoImage));
        assert!(editor.scene.annotations().is_empty());
    }

    #[test]
    fn test_selecting_loads_style() {
        let mut editor = editor_with_image(EditorMode::Create);
        editor.set_font_size(30);
        editor.set_color("#111111");
        let a = editor.add_annotation().unwrap();
        editor.scene.clear_selection();
        editor.set_font_size(80);
        editor.set_color("#222222");
        let b = editor.add_annotation().unwrap();

        editor.select(&a);
        editor.select(&b);
        assert_eq!(editor.style().font_size, 80);
        assert_eq!(editor.style().color, "#222222");

        editor.select(&a);
        assert_eq!(editor.style().font_size, 30);
        assert_eq!(editor.style().color, "#111111");
    }

    #[test]
    fn test_controls_write_through_to_selection() {
        let mut editor = editor_with_image(EditorMode::Create);
        let id = editor.add_annotation().unwrap();
        editor.set_font_size(64);
        editor.set_color("#abcdef");
        let annotation = editor.scene.get(&id).unwrap();
        assert_eq!(annotation.font_size, 64);
        assert_eq!(annotation.color, "#abcdef");
    }

    #[test]
    fn test_controls_without_selection_only_set_defaults() {
        let mut editor = editor_with_image(EditorMode::Create);
        let id = editor.add_annotation().unwrap();
        editor.scene.clear_selection();
        editor.set_font_size(90);
        assert_eq!(editor.scene.get(&id).unwrap().font_size, DEFAULT_FONT_SIZE);

        let next = editor.add_annotation().unwrap();
        assert_eq!(editor.scene.get(&next).unwrap().font_size, 90);
    }

    #[test]
    fn test_deleting_selection_resets_controls() {
        let mut editor = editor_with_image(EditorMode::Create);
        editor.set_font_size(72);
        editor.set_color("#000000");
        let id = editor.add_annotation().unwrap();
        editor.delete(&id);
        assert_eq!(editor.scene.selected_id(), None);
        assert_eq!(editor.style(), &StyleControls::default());
        assert_eq!(editor.style().color, DEFAULT_COLOR);
    }

    #[test]
    fn test_deleting_other_keeps_controls() {
        let mut editor = editor_with_image(EditorMode::Create);
        let first = editor.add_annotation().unwrap();
        editor.set_font_size(72);
        editor.add_annotation().unwrap();
        editor.delete(&first);
        assert_eq!(editor.style().font_size, 72);
    }

    #[test]
    fn test_grab_syncs_controls() {
        let typeface = Typeface::bitmap();
        let mut editor = editor_with_image(EditorMode::Create);
        editor.set_font_size(55);
        let id = editor.add_annotation().unwrap();
        editor.scene.clear_selection();
        editor.set_font_size(20);

        editor.handle_gesture(Gesture::Down(Point::new(400.0, 300.0)), &typeface);
        assert_eq!(editor.scene.selected_id(), Some(id.as_str()));
        assert_eq!(editor.style().font_size, 55);
        assert_eq!(editor.cursor(), CursorAffordance::Grabbing);
        editor.handle_gesture(Gesture::Up, &typeface);
        assert_eq!(editor.cursor(), CursorAffordance::Default);
    }

    #[test]
    fn test_hydrate_runs_once() {
        let mut editor = Editor::new(
            EditorMode::Edit {
                meme_id: "m1".to_string(),
            },
            800,
            600,
        );
        let seed = vec![Annotation::new(
            "1".to_string(),
            Point::new(10.0, 10.0),
            &StyleControls::default(),
        )];
        assert!(editor.hydrate("data:image/png;base64,AAAA", seed.clone()));
        assert!(!editor.hydrate("other", Vec::new()));
        assert_eq!(editor.scene.annotations(), seed.as_slice());
    }

    #[test]
    fn test_submission_guards_and_targets() {
        let typeface = Typeface::bitmap();
        let mut editor = editor_with_image(EditorMode::Create);
        assert!(matches!(
            editor.submission(&typeface),
            Err(Guard::NothingToExport)
        ));

        editor.add_annotation().unwrap();
        let submission = editor.submission(&typeface).unwrap();
        assert_eq!(submission.target, SubmitTarget::Create);
        assert_eq!(submission.base_image, "template://relatable.jpg");
        assert_eq!(submission.flattened.dimensions(), (1600, 1200));
        assert_eq!(submission.annotations.len(), 1);
    }

    #[test]
    fn test_update_keeps_original_background_reference() {
        let typeface = Typeface::bitmap();
        let mut editor = Editor::new(
            EditorMode::Edit {
                meme_id: "m1".to_string(),
            },
            800,
            600,
        );
        editor.hydrate("template://Carl Sagan.jpg", Vec::new());
        editor
            .scene
            .load_background("template://relatable.jpg".to_string(), RgbaImage::new(200, 100));
        editor.add_annotation().unwrap();

        let submission = editor.submission(&typeface).unwrap();
        assert_eq!(
            submission.target,
            SubmitTarget::Update {
                meme_id: "m1".to_string()
            }
        );
        assert_eq!(submission.base_image, "template://Carl Sagan.jpg");
    }
}
