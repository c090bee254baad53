// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, HashMap};

use smallvec::SmallVec;

use super::ids::{ConversationId, NodeId};
use super::node::Node;
use super::role::Role;
use super::validate::{validate_parts, MalformedDocument};

/// Id given to the root of trees created from scratch or synthesized from flat input.
pub const ROOT_NODE_ID: &str = "root";

/// Ordered child ids of one node. Most turns have one or two alternatives.
pub type ChildList = SmallVec<[NodeId; 2]>;

/// A conversation as a rooted tree of turns plus the currently viewed branch.
///
/// Nodes live in an arena keyed by id; `children` is the ordered adjacency index (sibling order
/// is creation order); `active_path` runs from the root to the selected leaf. The structural
/// invariants hold for every value of this type: construction validates them and all mutation
/// goes through [`crate::ops`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTree {
    conversation_id: ConversationId,
    title: Option<String>,
    root_id: NodeId,
    nodes: HashMap<NodeId, Node>,
    children: HashMap<NodeId, ChildList>,
    active_path: Vec<NodeId>,
    rev: u64,
    next_node_seq: u64,
}

/// Unvalidated pieces of a tree, as decoded from a persisted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeParts {
    pub conversation_id: ConversationId,
    pub title: Option<String>,
    pub root_id: NodeId,
    pub nodes: BTreeMap<NodeId, Node>,
    pub children: BTreeMap<NodeId, Vec<NodeId>>,
    pub active_path: Vec<NodeId>,
}

impl ConversationTree {
    /// Creates a tree holding only a `system` root node.
    pub fn new(conversation_id: ConversationId, root_content: Option<String>) -> Self {
        let root_id = NodeId::new(ROOT_NODE_ID).expect("hard-coded root id is valid");
        let root = Node::new(root_id.clone(), None, Role::System, root_content);

        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), root);

        Self {
            conversation_id,
            title: None,
            root_id: root_id.clone(),
            nodes,
            children: HashMap::new(),
            active_path: vec![root_id],
            rev: 0,
            next_node_seq: 0,
        }
    }

    /// Builds a tree from decoded parts, rejecting any structural violation.
    ///
    /// The one tolerated omission is a missing `children` entry for a node without children.
    /// The active path is normalized (root prepended when absent) before it is checked.
    pub fn from_parts(parts: TreeParts) -> Result<Self, MalformedDocument> {
        let active_path = validate_parts(&parts)?;

        let next_node_seq = parts
            .nodes
            .keys()
            .filter_map(|node_id| sequence_suffix(node_id.as_str()))
            .max()
            .unwrap_or(0);

        let children = parts
            .children
            .into_iter()
            .filter(|(_, child_ids)| !child_ids.is_empty())
            .map(|(parent_id, child_ids)| (parent_id, ChildList::from_vec(child_ids)))
            .collect();

        Ok(Self {
            conversation_id: parts.conversation_id,
            title: parts.title,
            root_id: parts.root_id,
            nodes: parts.nodes.into_iter().collect(),
            children,
            active_path,
            rev: 0,
            next_node_seq,
        })
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns whether the title changed.
    pub(crate) fn set_title(&mut self, title: Option<String>) -> bool {
        if self.title == title {
            return false;
        }
        self.title = title;
        true
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root_id
    }

    pub fn root(&self) -> &Node {
        self.nodes
            .get(&self.root_id)
            .expect("root id is always present in the node map")
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// All nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ordered children of `node_id`; empty for leaves and unknown ids.
    pub fn children(&self, node_id: &str) -> &[NodeId] {
        self.children
            .get(node_id)
            .map(|child_ids| child_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of parent→child links, i.e. `node_count() - 1` for a valid tree.
    pub fn child_link_count(&self) -> usize {
        self.children.values().map(|child_ids| child_ids.len()).sum()
    }

    pub fn parent_of(&self, node_id: &str) -> Option<&NodeId> {
        self.nodes.get(node_id).and_then(Node::parent_id)
    }

    pub fn active_path(&self) -> &[NodeId] {
        &self.active_path
    }

    /// Deepest element of the active path (the root when nothing else is selected).
    pub fn active_leaf(&self) -> &NodeId {
        self.active_path.last().unwrap_or(&self.root_id)
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    /// Root-to-node chain of ids, or `None` when `node_id` is unknown.
    ///
    /// Walks parent links and stops after `node_count()` steps so a corrupted map cannot loop.
    pub fn chain_to(&self, node_id: &str) -> Option<Vec<NodeId>> {
        let mut current = self.nodes.get(node_id)?;
        let mut chain = vec![current.node_id().clone()];

        for _ in 0..self.nodes.len() {
            let Some(parent_id) = current.parent_id() else {
                break;
            };
            let Some(parent) = self.nodes.get(parent_id) else {
                break;
            };
            chain.push(parent.node_id().clone());
            current = parent;
        }

        chain.reverse();
        Some(chain)
    }

    pub(crate) fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }

    pub(crate) fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    pub(crate) fn active_path_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.active_path
    }

    /// Creates a node under `parent_id` and links it as the last child.
    ///
    /// Callers check that `parent_id` exists first.
    pub(crate) fn insert_child(
        &mut self,
        parent_id: &NodeId,
        role: Role,
        content: Option<String>,
    ) -> NodeId {
        let node_id = self.allocate_node_id();
        let mut node = Node::new(node_id.clone(), Some(parent_id.clone()), role, content);
        node.touch();

        self.nodes.insert(node_id.clone(), node);
        self.children
            .entry(parent_id.clone())
            .or_default()
            .push(node_id.clone());
        node_id
    }

    fn allocate_node_id(&mut self) -> NodeId {
        let mut digits = itoa::Buffer::new();
        loop {
            self.next_node_seq = self.next_node_seq.wrapping_add(1);
            let seq = digits.format(self.next_node_seq);

            let mut raw = String::with_capacity(seq.len() + 1);
            raw.push('n');
            raw.push_str(seq);

            if self.nodes.contains_key(raw.as_str()) {
                continue;
            }
            if let Ok(node_id) = NodeId::new(raw) {
                return node_id;
            }
        }
    }
}

fn sequence_suffix(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix('n')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
