// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Small helpers shared across the editor, renderer and feed.

pub mod color;
pub mod geometry;
pub mod time;
