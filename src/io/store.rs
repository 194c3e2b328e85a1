// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Feed storage.
//!
//! The feed keeps published memes and their upvotes. [`JsonStore`] is a
//! single JSON file; every operation re-reads it, applies the change and
//! rewrites it atomically through a temp file. The revision is derived
//! from the file itself, so several app instances pointed at the same file
//! notice each other's writes.

use crate::io::serialization::encode_annotations;
use crate::models::annotation::Annotation;
use crate::models::meme::{Identity, Meme, Vote};
use crate::util::time::now_millis;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// What the editor hands over for a create or update.
#[derive(Debug, Clone)]
pub struct MemeDraft {
    /// Flattened PNG data URL.
    pub image_url: String,
    pub base_image_url: String,
    pub text_boxes: Vec<Annotation>,
}

/// Persistent feed backend.
pub trait MemeStore: Send + Sync {
    /// Every meme, newest first.
    fn list(&self) -> Result<Vec<Meme>>;
    fn get(&self, id: &str) -> Result<Option<Meme>>;
    fn create(&self, draft: MemeDraft, user: &Identity) -> Result<Meme>;
    /// Replace image and text boxes of a meme the user owns. The stored
    /// base image is kept.
    fn update(&self, id: &str, draft: MemeDraft, user: &Identity) -> Result<Meme>;
    fn delete(&self, id: &str, user: &Identity) -> Result<()>;
    /// Add the user's upvote, or remove it if present. Returns the new count.
    fn toggle_vote(&self, meme_id: &str, user: &Identity) -> Result<u32>;
    /// Every vote on every meme.
    fn votes(&self) -> Result<Vec<Vote>>;
    /// Changes whenever the stored feed changes, whoever wrote it.
    fn revision(&self) -> u64;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    memes: Vec<Meme>,
    #[serde(default)]
    votes: Vec<Vote>,
}

/// A feed kept in one JSON file.
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
    /// Writes made through this handle; keeps the revision moving even when
    /// the file timestamp is too coarse to tell two writes apart.
    writes: AtomicU64,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        };
        // Fail early on a corrupt file rather than on the first write.
        let data = store.read()?;
        log::info!(
            "Opened feed store {} ({} memes)",
            store.path.display(),
            data.memes.len()
        );
        Ok(store)
    }

    fn read(&self) -> Result<StoreData> {
        if !self.path.exists() {
            return Ok(StoreData::default());
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if json.trim().is_empty() {
            return Ok(StoreData::default());
        }
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Run one read-modify-write transaction under the lock.
    fn transact<T>(&self, apply: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("Feed store lock poisoned"))?;
        let mut data = self.read()?;
        let result = apply(&mut data)?;
        self.write(&data)?;
        Ok(result)
    }

    fn snapshot(&self) -> Result<StoreData> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("Feed store lock poisoned"))?;
        self.read()
    }
}

fn owned_meme<'a>(data: &'a mut StoreData, id: &str, user: &Identity) -> Result<&'a mut Meme> {
    let meme = data
        .memes
        .iter_mut()
        .find(|meme| meme.id == id)
        .ok_or_else(|| anyhow!("Meme {} not found", id))?;
    if !meme.is_owned_by(Some(user)) {
        bail!("Permission denied: {} does not own meme {}", user.id, id);
    }
    Ok(meme)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl MemeStore for JsonStore {
    fn list(&self) -> Result<Vec<Meme>> {
        let mut memes = self.snapshot()?.memes;
        memes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(memes)
    }

    fn get(&self, id: &str) -> Result<Option<Meme>> {
        Ok(self.snapshot()?.memes.into_iter().find(|meme| meme.id == id))
    }

    fn create(&self, draft: MemeDraft, user: &Identity) -> Result<Meme> {
        let text_boxes = encode_annotations(&draft.text_boxes)?;
        let meme = self.transact(|data| {
            let meme = Meme {
                id: new_id(),
                image_url: draft.image_url,
                base_image_url: Some(draft.base_image_url),
                text_boxes,
                created_at: now_millis(),
                created_by: Some(user.id.clone()),
                upvotes: 0,
            };
            data.memes.push(meme.clone());
            Ok(meme)
        })?;
        log::info!("Created meme {}", meme.id);
        Ok(meme)
    }

    fn update(&self, id: &str, draft: MemeDraft, user: &Identity) -> Result<Meme> {
        let text_boxes = encode_annotations(&draft.text_boxes)?;
        let meme = self.transact(|data| {
            let meme = owned_meme(data, id, user)?;
            meme.image_url = draft.image_url;
            meme.text_boxes = text_boxes;
            if meme.base_image_url.is_none() {
                meme.base_image_url = Some(draft.base_image_url);
            }
            Ok(meme.clone())
        })?;
        log::info!("Updated meme {}", id);
        Ok(meme)
    }

    fn delete(&self, id: &str, user: &Identity) -> Result<()> {
        self.transact(|data| {
            owned_meme(data, id, user)?;
            data.memes.retain(|meme| meme.id != id);
            data.votes.retain(|vote| vote.meme_id != id);
            Ok(())
        })?;
        log::info!("Deleted meme {}", id);
        Ok(())
    }

    fn toggle_vote(&self, meme_id: &str, user: &Identity) -> Result<u32> {
        self.transact(|data| {
            let existing = data
                .votes
                .iter()
                .position(|vote| vote.meme_id == meme_id && user.matches(&vote.user_id));
            let meme = data
                .memes
                .iter_mut()
                .find(|meme| meme.id == meme_id)
                .ok_or_else(|| anyhow!("Meme {} not found", meme_id))?;

            match existing {
                Some(index) => {
                    data.votes.remove(index);
                    meme.upvotes = meme.upvotes.saturating_sub(1);
                    log::debug!("{} removed upvote on {}", user.id, meme_id);
                }
                None => {
                    meme.upvotes += 1;
                    data.votes.push(Vote {
                        id: new_id(),
                        meme_id: meme_id.to_string(),
                        user_id: user.id.clone(),
                        created_at: now_millis(),
                    });
                    log::debug!("{} upvoted {}", user.id, meme_id);
                }
            }
            Ok(meme.upvotes)
        })
    }

    fn votes(&self) -> Result<Vec<Vote>> {
        Ok(self.snapshot()?.votes)
    }

    fn revision(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.writes.load(Ordering::SeqCst).hash(&mut hasher);
        if let Ok(metadata) = std::fs::metadata(&self.path) {
            metadata.len().hash(&mut hasher);
            if let Ok(modified) = metadata.modified() {
                modified.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}
