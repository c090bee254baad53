// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{ConversationTree, NodeId};

use super::locate::locate;

/// Summary of the deepest element of the active path, as shown next to the composer.
///
/// `depth` is the active path length. With only the root selected, the other fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestPosition {
    pub depth: usize,
    pub node_id: Option<NodeId>,
    pub j: Option<usize>,
    pub n: Option<usize>,
}

/// Prepends `root_id` when `raw` is empty or does not start at the root. Idempotent.
pub fn normalize_active_path(root_id: &NodeId, raw: &[NodeId]) -> Vec<NodeId> {
    if raw.first() == Some(root_id) {
        return raw.to_vec();
    }

    let mut path = Vec::with_capacity(raw.len() + 1);
    path.push(root_id.clone());
    path.extend_from_slice(raw);
    path
}

pub fn is_in_active_path(tree: &ConversationTree, node_id: &str) -> bool {
    tree.active_path().iter().any(|id| id.as_str() == node_id)
}

/// 1-based position of `node_id` in the active path (the root is 1).
pub fn active_depth_of(tree: &ConversationTree, node_id: &str) -> Option<usize> {
    tree.active_path()
        .iter()
        .position(|id| id.as_str() == node_id)
        .map(|index| index + 1)
}

pub fn latest(tree: &ConversationTree) -> LatestPosition {
    let path = tree.active_path();
    let depth = path.len();

    let leaf = match path {
        [_, .., leaf] => leaf,
        _ => {
            return LatestPosition {
                depth,
                node_id: None,
                j: None,
                n: None,
            }
        }
    };

    let position = locate(tree, leaf.as_str());
    LatestPosition {
        depth,
        node_id: Some(leaf.clone()),
        j: position.and_then(|pos| pos.j),
        n: position.and_then(|pos| pos.n),
    }
}
