// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashSet;

use crate::model::{ConversationTree, Node, NodeId};

/// One line of the tree view: a node with its depth and `j/n` badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow<'a> {
    pub node: &'a Node,
    pub depth: usize,
    pub j: Option<usize>,
    pub n: Option<usize>,
    pub on_active_path: bool,
}

impl OutlineRow<'_> {
    pub fn floor(&self) -> usize {
        self.depth + 1
    }
}

#[derive(Debug, Clone)]
struct PreorderEntry<'a> {
    node_id: &'a NodeId,
    depth: usize,
    j: Option<usize>,
    n: Option<usize>,
}

/// Depth-first walk from the root visiting siblings in creation order.
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    tree: &'a ConversationTree,
    stack: Vec<PreorderEntry<'a>>,
}

pub fn preorder(tree: &ConversationTree) -> Preorder<'_> {
    Preorder {
        tree,
        stack: vec![PreorderEntry {
            node_id: tree.root_id(),
            depth: 0,
            j: None,
            n: None,
        }],
    }
}

impl<'a> Preorder<'a> {
    fn next_entry(&mut self) -> Option<(&'a Node, PreorderEntry<'a>)> {
        loop {
            let entry = self.stack.pop()?;
            let Some(node) = self.tree.node(entry.node_id.as_str()) else {
                continue;
            };

            let child_ids = self.tree.children(entry.node_id.as_str());
            let n = child_ids.len();
            for (index, child_id) in child_ids.iter().enumerate().rev() {
                self.stack.push(PreorderEntry {
                    node_id: child_id,
                    depth: entry.depth + 1,
                    j: Some(index + 1),
                    n: Some(n),
                });
            }

            return Some((node, entry));
        }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (&'a Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(|(node, entry)| (node, entry.depth))
    }
}

/// Every node of the tree, depth-first in sibling order, with its `j/n` badge.
pub fn outline(tree: &ConversationTree) -> Vec<OutlineRow<'_>> {
    let on_path = tree
        .active_path()
        .iter()
        .map(NodeId::as_str)
        .collect::<HashSet<_>>();

    let mut rows = Vec::with_capacity(tree.node_count());
    let mut walk = preorder(tree);
    while let Some((node, entry)) = walk.next_entry() {
        rows.push(OutlineRow {
            node,
            depth: entry.depth,
            j: entry.j,
            n: entry.n,
            on_active_path: on_path.contains(node.node_id().as_str()),
        });
    }
    rows
}
