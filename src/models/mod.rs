// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: annotations, the editable scene, and feed records.

pub mod annotation;
pub mod meme;
pub mod scene;
pub mod style;
