// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings come from an optional YAML or JSON file (chosen by extension)
//! and are then overridden by command line flags.

use crate::models::meme::Identity;
use crate::models::scene::{MAX_WORKING_HEIGHT, MAX_WORKING_WIDTH};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Largest working canvas; bigger backgrounds are scaled down to fit.
    pub max_canvas_width: u32,
    pub max_canvas_height: u32,
    /// Directory holding the built-in template images.
    pub template_dir: PathBuf,
    /// Feed store file.
    pub store_path: PathBuf,
    /// Where "Download" writes PNG files.
    pub export_dir: PathBuf,
    /// Image loads still running after this many seconds are abandoned.
    pub load_timeout_secs: u64,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_canvas_width: MAX_WORKING_WIDTH,
            max_canvas_height: MAX_WORKING_HEIGHT,
            template_dir: PathBuf::from("assets"),
            store_path: PathBuf::from("memes.json"),
            export_dir: PathBuf::from("."),
            load_timeout_secs: 15,
            user_id: None,
            user_email: None,
        }
    }
}

impl Config {
    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?,
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
            other => bail!("Unsupported config extension: {:?}", other),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_canvas_width == 0 || self.max_canvas_height == 0 {
            bail!("Canvas limits must be positive");
        }
        if self.load_timeout_secs == 0 {
            bail!("load_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    /// The signed-in user, if one was configured.
    pub fn identity(&self) -> Option<Identity> {
        match (&self.user_id, &self.user_email) {
            (Some(id), email) if !id.is_empty() => Some(Identity::new(id.clone(), email.clone())),
            (_, Some(email)) if !email.is_empty() => {
                Some(Identity::new(email.clone(), Some(email.clone())))
            }
            _ => None,
        }
    }
}
