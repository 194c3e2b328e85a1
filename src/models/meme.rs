// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Feed records and the identity of the person using the editor.

use serde::{Deserialize, Serialize};

/// Longest author label shown before it is cut short.
const MAX_LABEL_CHARS: usize = 18;
/// Memes younger than this carry a "New" badge.
const NEW_FOR_MILLIS: i64 = 15 * 60 * 1000;

/// The part of an email-like value before the `@`.
fn handle_of(value: &str) -> Option<&str> {
    value.split_once('@').map(|(handle, _)| handle)
}

/// Only the hyphenated form counts; opaque ids in other shapes are shown as is.
fn is_uuid(value: &str) -> bool {
    value.len() == 36 && uuid::Uuid::parse_str(value).is_ok()
}

/// The signed-in user as handed over by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }

    /// Every value this user may appear under in `createdBy` or `userId`.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut identifiers = vec![self.id.as_str()];
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            identifiers.push(email);
        }
        identifiers
    }

    pub fn matches(&self, value: &str) -> bool {
        self.identifiers().contains(&value)
    }
}

/// A published meme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meme {
    pub id: String,
    /// Flattened PNG as a data URL.
    pub image_url: String,
    /// Background the meme was composed on. Absent on memes created before
    /// editing existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image_url: Option<String>,
    /// JSON-encoded annotation list.
    pub text_boxes: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub upvotes: u32,
}

impl Meme {
    pub fn is_owned_by(&self, user: Option<&Identity>) -> bool {
        match (self.created_by.as_deref(), user) {
            (Some(author), Some(user)) => user.matches(author),
            _ => false,
        }
    }

    /// Author label for the feed.
    ///
    /// The viewer's own memes read "You", with the email handle when the
    /// author was recorded by email. Other email authors show as `@handle`,
    /// bare user ids as "Member". Long labels are cut to 18 characters.
    pub fn author_label(&self, viewer: Option<&Identity>) -> String {
        let author = self.created_by.as_deref().filter(|a| !a.is_empty());
        let label = match author {
            Some(author) if self.is_owned_by(viewer) => match handle_of(author) {
                Some(handle) => format!("You (@{})", handle),
                None => "You".to_string(),
            },
            Some(author) => match handle_of(author) {
                Some(handle) => format!("@{}", handle),
                None if is_uuid(author) => "Member".to_string(),
                None => author.to_string(),
            },
            None => "Anonymous".to_string(),
        };

        if label.chars().count() > MAX_LABEL_CHARS {
            let short: String = label.chars().take(MAX_LABEL_CHARS).collect();
            format!("{}...", short)
        } else {
            label
        }
    }

    /// Posted within the last fifteen minutes. Timestamps ahead of `now`
    /// (clock skew) are not new.
    pub fn is_new(&self, now: i64) -> bool {
        let age = now - self.created_at;
        (0..NEW_FOR_MILLIS).contains(&age)
    }
}

/// One user's upvote on one meme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub meme_id: String,
    pub user_id: String,
    pub created_at: i64,
}
