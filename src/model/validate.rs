// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural checks run when a tree is built from persisted parts.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use super::ids::NodeId;
use super::tree::TreeParts;
use crate::query::active_path::normalize_active_path;

/// A persisted document that does not describe a valid conversation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedDocument {
    MissingRoot {
        root_id: NodeId,
    },
    RootHasParent {
        root_id: NodeId,
        parent_id: NodeId,
    },
    /// A second node without a parent.
    MultipleRoots {
        node_id: NodeId,
    },
    DanglingParent {
        node_id: NodeId,
        parent_id: NodeId,
    },
    /// `node_id` names `parent_id` as its parent but is not listed in `children[parent_id]`.
    MissingChildLink {
        node_id: NodeId,
        parent_id: NodeId,
    },
    UnknownChildrenEntry {
        parent_id: NodeId,
    },
    UnknownChild {
        parent_id: NodeId,
        child_id: NodeId,
    },
    /// `child_id` is listed under `listed_under` but its own parent link says otherwise.
    ParentMismatch {
        child_id: NodeId,
        listed_under: NodeId,
        parent_id: Option<NodeId>,
    },
    DuplicateChild {
        parent_id: NodeId,
        child_id: NodeId,
    },
    /// Not reachable from the root (the parent links form a cycle).
    Unreachable {
        node_id: NodeId,
    },
    ActivePathUnknownNode {
        node_id: NodeId,
    },
    /// `active_path[index]` is not a child of `active_path[index - 1]`.
    ActivePathBroken {
        index: usize,
        node_id: NodeId,
    },
}

impl fmt::Display for MalformedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot { root_id } => write!(f, "root node {root_id} is missing"),
            Self::RootHasParent { root_id, parent_id } => {
                write!(f, "root node {root_id} has a parent ({parent_id})")
            }
            Self::MultipleRoots { node_id } => {
                write!(f, "node {node_id} has no parent but is not the root")
            }
            Self::DanglingParent { node_id, parent_id } => {
                write!(f, "node {node_id} references missing parent {parent_id}")
            }
            Self::MissingChildLink { node_id, parent_id } => {
                write!(f, "node {node_id} is not listed in children of its parent {parent_id}")
            }
            Self::UnknownChildrenEntry { parent_id } => {
                write!(f, "children entry for unknown node {parent_id}")
            }
            Self::UnknownChild { parent_id, child_id } => {
                write!(f, "children of {parent_id} list unknown node {child_id}")
            }
            Self::ParentMismatch {
                child_id,
                listed_under,
                parent_id,
            } => match parent_id {
                Some(parent_id) => write!(
                    f,
                    "node {child_id} is listed under {listed_under} but its parent is {parent_id}"
                ),
                None => write!(
                    f,
                    "node {child_id} is listed under {listed_under} but has no parent"
                ),
            },
            Self::DuplicateChild {
                parent_id,
                child_id,
            } => write!(f, "children of {parent_id} list {child_id} more than once"),
            Self::Unreachable { node_id } => {
                write!(f, "node {node_id} is not reachable from the root")
            }
            Self::ActivePathUnknownNode { node_id } => {
                write!(f, "active path references unknown node {node_id}")
            }
            Self::ActivePathBroken { index, node_id } => write!(
                f,
                "active path is not contiguous at index {index} (node {node_id})"
            ),
        }
    }
}

impl std::error::Error for MalformedDocument {}

/// Validates `parts` and returns the normalized active path.
pub(crate) fn validate_parts(parts: &TreeParts) -> Result<Vec<NodeId>, MalformedDocument> {
    let root_id = &parts.root_id;
    let Some(root) = parts.nodes.get(root_id) else {
        return Err(MalformedDocument::MissingRoot {
            root_id: root_id.clone(),
        });
    };
    if let Some(parent_id) = root.parent_id() {
        return Err(MalformedDocument::RootHasParent {
            root_id: root_id.clone(),
            parent_id: parent_id.clone(),
        });
    }

    for (node_id, node) in &parts.nodes {
        if node_id == root_id {
            continue;
        }
        let Some(parent_id) = node.parent_id() else {
            return Err(MalformedDocument::MultipleRoots {
                node_id: node_id.clone(),
            });
        };
        if !parts.nodes.contains_key(parent_id) {
            return Err(MalformedDocument::DanglingParent {
                node_id: node_id.clone(),
                parent_id: parent_id.clone(),
            });
        }
        let listed = parts
            .children
            .get(parent_id)
            .is_some_and(|child_ids| child_ids.contains(node_id));
        if !listed {
            return Err(MalformedDocument::MissingChildLink {
                node_id: node_id.clone(),
                parent_id: parent_id.clone(),
            });
        }
    }

    for (parent_id, child_ids) in &parts.children {
        if !parts.nodes.contains_key(parent_id) {
            return Err(MalformedDocument::UnknownChildrenEntry {
                parent_id: parent_id.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for child_id in child_ids {
            let Some(child) = parts.nodes.get(child_id) else {
                return Err(MalformedDocument::UnknownChild {
                    parent_id: parent_id.clone(),
                    child_id: child_id.clone(),
                });
            };
            if child.parent_id() != Some(parent_id) {
                return Err(MalformedDocument::ParentMismatch {
                    child_id: child_id.clone(),
                    listed_under: parent_id.clone(),
                    parent_id: child.parent_id().cloned(),
                });
            }
            if !seen.insert(child_id) {
                return Err(MalformedDocument::DuplicateChild {
                    parent_id: parent_id.clone(),
                    child_id: child_id.clone(),
                });
            }
        }
    }

    check_reachable(parts)?;

    let active_path = normalize_active_path(root_id, &parts.active_path);
    for (index, node_id) in active_path.iter().enumerate() {
        let Some(node) = parts.nodes.get(node_id) else {
            return Err(MalformedDocument::ActivePathUnknownNode {
                node_id: node_id.clone(),
            });
        };
        if index == 0 {
            continue;
        }
        if node.parent_id() != Some(&active_path[index - 1]) {
            return Err(MalformedDocument::ActivePathBroken {
                index,
                node_id: node_id.clone(),
            });
        }
    }

    Ok(active_path)
}

fn check_reachable(parts: &TreeParts) -> Result<(), MalformedDocument> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(&parts.root_id);
    queue.push_back(&parts.root_id);

    while let Some(node_id) = queue.pop_front() {
        let Some(child_ids) = parts.children.get(node_id) else {
            continue;
        };
        for child_id in child_ids {
            if visited.insert(child_id) {
                queue.push_back(child_id);
            }
        }
    }

    if visited.len() == parts.nodes.len() {
        return Ok(());
    }

    match parts.nodes.keys().find(|node_id| !visited.contains(node_id)) {
        Some(node_id) => Err(MalformedDocument::Unreachable {
            node_id: node_id.clone(),
        }),
        None => Ok(()),
    }
}
