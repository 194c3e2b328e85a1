// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! memeforge - a meme editor
//!
//! A cross-platform desktop application for placing movable, styled text
//! on images and sharing the results to a local meme feed.

mod app;
mod config;
mod editor;
mod io;
mod models;
mod render;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::MemeApp;
use clap::Parser;
use config::Config;
use io::store::JsonStore;
use render::typeface::Typeface;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "memeforge", version, about = "Compose memes and share them to a feed")]
struct Cli {
    /// YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Feed store file
    #[arg(long)]
    store: Option<PathBuf>,

    /// Signed-in user id
    #[arg(long)]
    user: Option<String>,

    /// Signed-in user email
    #[arg(long)]
    email: Option<String>,

    /// Directory holding the template images
    #[arg(long)]
    templates: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(store) = self.store {
            config.store_path = store;
        }
        if let Some(user) = self.user {
            config.user_id = Some(user);
        }
        if let Some(email) = self.email {
            config.user_email = Some(email);
        }
        if let Some(templates) = self.templates {
            config.template_dir = templates;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("memeforge=info"))
        .init();

    let config = Cli::parse().into_config()?;
    let store = JsonStore::open(&config.store_path)
        .with_context(|| format!("Cannot open feed store {}", config.store_path.display()))?;
    let typeface = Typeface::system_bold();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("memeforge"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "memeforge",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(MemeApp::new(
                config,
                Arc::new(store),
                Arc::new(typeface),
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
