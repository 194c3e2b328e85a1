// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation and composition serialization.
//!
//! Stored memes carry their annotations as a JSON string. Compositions
//! (background reference plus annotations) can also be saved locally in
//! YAML or JSON so editable work can be reopened later.

use crate::models::annotation::Annotation;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialize annotations to the JSON string stored on a meme.
pub fn encode_annotations(annotations: &[Annotation]) -> Result<String> {
    serde_json::to_string(annotations).context("Failed to encode text boxes")
}

/// Parse stored annotation JSON. An empty payload means no text boxes; a
/// malformed one is an error so the caller never edits a partial meme.
pub fn decode_annotations(json: &str) -> Result<Vec<Annotation>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).context("Failed to decode text boxes")
}

/// An editable meme saved to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub base_image: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub annotations: Vec<Annotation>,
}

/// Export a composition to YAML format.
pub fn export_yaml(data: &Composition, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export a composition to JSON format.
pub fn export_json(data: &Composition, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import a composition from YAML format.
pub fn import_yaml(path: &Path) -> Result<Composition> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import a composition from JSON format.
pub fn import_json(path: &Path) -> Result<Composition> {
    let json = std::fs::read_to_string(path)?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

fn is_yaml(path: &Path) -> Result<bool> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            Ok(true)
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(false),
        _ => bail!("Unsupported composition format: {}", path.display()),
    }
}

/// Save a composition, choosing the format from the file extension.
pub fn save_composition(data: &Composition, path: &Path) -> Result<()> {
    if is_yaml(path)? {
        export_yaml(data, path)
    } else {
        export_json(data, path)
    }
    .with_context(|| format!("Failed to save composition to {}", path.display()))?;
    log::info!("Saved composition to {}", path.display());
    Ok(())
}

/// Open a composition, choosing the format from the file extension.
pub fn open_composition(path: &Path) -> Result<Composition> {
    if is_yaml(path)? {
        import_yaml(path)
    } else {
        import_json(path)
    }
    .with_context(|| format!("Failed to open composition {}", path.display()))
}
