// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background image loading.
//!
//! Uploaded files, template picks and stored references all decode
//! through here. Decoding runs on a background thread; the UI polls the
//! loader every frame and gives up after a timeout, so a corrupt image
//! produces an explicit error instead of a load that never completes.

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// Built-in template catalog, resolved under the template directory.
pub const TEMPLATES: [&str; 5] = [
    "Carl Sagan.jpg",
    "Cute girl.jpg",
    "Heroes & Villains.jpg",
    "Miley Cyrus.jpg",
    "relatable.jpg",
];

const TEMPLATE_SCHEME: &str = "template://";

/// Where a background comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file the user picked.
    File(PathBuf),
    /// One of [`TEMPLATES`].
    Template(String),
    /// A reference previously produced by [`LoadedImage::reference`].
    Stored(String),
}

/// A decoded background and the reference that reloads it.
pub struct LoadedImage {
    pub image: RgbaImage,
    /// Data URL for uploads, `template://<name>` for templates.
    pub reference: String,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Encode raw bytes as a data URL with the given mime type.
pub fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Extract the payload of a base64 data URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("Not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("Malformed data URL"))?;
    if !header.ends_with(";base64") {
        bail!("Only base64 data URLs are supported");
    }
    general_purpose::STANDARD
        .decode(payload.trim())
        .context("Invalid base64 in data URL")
}

fn mime_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(image::ImageFormat::Bmp) => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Decode encoded image bytes into RGBA.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).context("Unsupported or corrupt image")?;
    Ok(image.to_rgba8())
}

/// Load a background synchronously.
pub fn load(source: &ImageSource, template_dir: &Path) -> Result<LoadedImage> {
    match source {
        ImageSource::File(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let image = decode_image(&bytes)
                .with_context(|| format!("Failed to decode {}", path.display()))?;
            Ok(LoadedImage {
                image,
                reference: encode_data_url(&bytes, mime_for(&bytes)),
            })
        }
        ImageSource::Template(name) => {
            if !TEMPLATES.contains(&name.as_str()) {
                bail!("Unknown template: {}", name);
            }
            let path = template_dir.join(name);
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            Ok(LoadedImage {
                image: decode_image(&bytes)?,
                reference: format!("{}{}", TEMPLATE_SCHEME, name),
            })
        }
        ImageSource::Stored(reference) => {
            if let Some(name) = reference.strip_prefix(TEMPLATE_SCHEME) {
                return load(&ImageSource::Template(name.to_string()), template_dir);
            }
            if reference.starts_with("data:") {
                let bytes = decode_data_url(reference)?;
                return Ok(LoadedImage {
                    image: decode_image(&bytes)?,
                    reference: reference.clone(),
                });
            }
            let bytes = std::fs::read(reference)
                .with_context(|| format!("Failed to read {}", reference))?;
            Ok(LoadedImage {
                image: decode_image(&bytes)?,
                reference: reference.clone(),
            })
        }
    }
}

/// State of a background load.
pub enum LoadPoll {
    Pending,
    Ready(Result<LoadedImage>),
    TimedOut,
}

/// A load running on a background thread.
pub struct ImageLoader {
    receiver: Receiver<Result<LoadedImage>>,
    started: Instant,
    timeout: Duration,
}

impl ImageLoader {
    /// Start decoding `source` off the UI thread.
    pub fn spawn(source: ImageSource, template_dir: PathBuf, timeout: Duration) -> Self {
        let (sender, receiver) = channel();

        std::thread::spawn(move || {
            let result = load(&source, &template_dir);
            match &result {
                Ok(loaded) => log::info!(
                    "Decoded background {:?} ({}x{})",
                    describe(&source),
                    loaded.width(),
                    loaded.height()
                ),
                Err(e) => log::error!("Failed to load {:?}: {:#}", describe(&source), e),
            }
            let _ = sender.send(result);
        });

        Self {
            receiver,
            started: Instant::now(),
            timeout,
        }
    }

    pub fn poll(&self) -> LoadPoll {
        match self.receiver.try_recv() {
            Ok(result) => LoadPoll::Ready(result),
            Err(TryRecvError::Disconnected) => {
                LoadPoll::Ready(Err(anyhow!("Image loader stopped unexpectedly")))
            }
            Err(TryRecvError::Empty) if self.started.elapsed() >= self.timeout => {
                LoadPoll::TimedOut
            }
            Err(TryRecvError::Empty) => LoadPoll::Pending,
        }
    }
}

fn describe(source: &ImageSource) -> String {
    match source {
        ImageSource::File(path) => path.display().to_string(),
        ImageSource::Template(name) => name.clone(),
        ImageSource::Stored(reference) if reference.starts_with("data:") => {
            "embedded image".to_string()
        }
        ImageSource::Stored(reference) => reference.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::export::to_png_bytes;
    use image::Rgba;

    fn png(width: u32, height: u32) -> Vec<u8> {
        to_png_bytes(&RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]))).unwrap()
    }

    #[test]
    fn test_data_url_round_trip() {
        let bytes = png(2, 2);
        let url = encode_data_url(&bytes, mime_for(&bytes));
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), bytes);
    }

    #[test]
    fn test_rejects_non_base64_data_url() {
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("https://example.com/a.png").is_err());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(load(&ImageSource::File(path), dir.path()).is_err());
    }

    #[test]
    fn test_uploaded_file_reference_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png(5, 4)).unwrap();

        let loaded = load(&ImageSource::File(path), dir.path()).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (5, 4));

        let again = load(&ImageSource::Stored(loaded.reference.clone()), dir.path()).unwrap();
        assert_eq!(again.image, loaded.image);
    }

    #[test]
    fn test_template_reference() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("relatable.jpg"), png(3, 3)).unwrap();

        let loaded = load(&ImageSource::Template("relatable.jpg".to_string()), dir.path()).unwrap();
        assert_eq!(loaded.reference, "template://relatable.jpg");

        let stored = load(&ImageSource::Stored(loaded.reference), dir.path()).unwrap();
        assert_eq!(stored.width(), 3);

        assert!(load(&ImageSource::Template("other.jpg".to_string()), dir.path()).is_err());
    }

    #[test]
    fn test_loader_reports_result() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ImageLoader::spawn(
            ImageSource::Stored("data:image/png;base64,AAAA".to_string()),
            dir.path().to_path_buf(),
            Duration::from_secs(30),
        );
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match loader.poll() {
                LoadPoll::Ready(result) => {
                    assert!(result.is_err());
                    break;
                }
                LoadPoll::Pending if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(5));
                }
                _ => panic!("loader did not finish"),
            }
        }
    }
}
