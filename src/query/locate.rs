// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{ConversationTree, Node};

/// Where a node sits: edges from the root plus its 1-based rank `j` among `n` siblings.
///
/// `j` and `n` are `None` for the root. `j` alone is `None` when the node is missing from its
/// parent's children list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingPosition {
    pub depth: usize,
    pub j: Option<usize>,
    pub n: Option<usize>,
}

impl SiblingPosition {
    /// 1-based depth shown to users (the root is floor 1).
    pub fn floor(&self) -> usize {
        self.depth + 1
    }

    pub fn is_leftmost(&self) -> bool {
        self.j == Some(1)
    }

    pub fn is_rightmost(&self) -> bool {
        matches!((self.j, self.n), (Some(j), Some(n)) if j == n)
    }
}

/// Number of edges between the root and `node_id`, or `None` for an unknown node.
///
/// A missing parent ends the walk, and the walk never takes more than `node_count()` steps.
pub fn depth(tree: &ConversationTree, node_id: &str) -> Option<usize> {
    let mut current = tree.node(node_id)?;
    let mut depth = 0;

    while depth < tree.node_count() {
        let Some(parent) = current.parent_id().and_then(|parent_id| tree.node(parent_id.as_str()))
        else {
            break;
        };
        depth += 1;
        current = parent;
    }

    Some(depth)
}

pub fn locate(tree: &ConversationTree, node_id: &str) -> Option<SiblingPosition> {
    let node = tree.node(node_id)?;
    let depth = depth(tree, node_id)?;
    let (j, n) = sibling_rank(tree, node);
    Some(SiblingPosition { depth, j, n })
}

fn sibling_rank(tree: &ConversationTree, node: &Node) -> (Option<usize>, Option<usize>) {
    let Some(parent_id) = node.parent_id() else {
        return (None, None);
    };

    let siblings = tree.children(parent_id.as_str());
    let j = siblings
        .iter()
        .position(|sibling| sibling == node.node_id())
        .map(|index| index + 1);
    (j, Some(siblings.len()))
}
