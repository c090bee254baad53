// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries over conversation trees.
//!
//! Queries provide derived views (sibling badges, the latest position, linear message arrays)
//! that power rendering and LLM calls. None of them mutate the tree.

pub mod active_path;
pub mod locate;
pub mod outline;
pub mod project;

pub use active_path::{
    active_depth_of, is_in_active_path, latest, normalize_active_path, LatestPosition,
};
pub use locate::{depth, locate, SiblingPosition};
pub use outline::{outline, preorder, OutlineRow, Preorder};
pub use project::{
    project, project_active, ChatMessage, PathSelector, Projection, ProjectionOptions,
};
