// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A conversation is a rooted tree of turns (the node store plus the ordered children index)
//! and an active path selecting the branch currently in view.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod node;
pub mod role;
pub mod tree;
pub mod validate;

pub use ids::{ConversationId, Id, IdError, NodeId};
pub use node::Node;
pub use role::{ParseRoleError, Role};
pub use tree::{ChildList, ConversationTree, TreeParts, ROOT_NODE_ID};
pub use validate::MalformedDocument;
