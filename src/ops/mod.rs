// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations for conversation trees.
//!
//! Every operation either fully succeeds or leaves the tree untouched. Single operations check
//! their preconditions before mutating; batches applied through [`apply_ops`] run against a copy
//! that only replaces the tree once every op succeeded. Batches use optimistic concurrency
//! (revision checks) and produce a minimal delta that the host can use to refresh derived views.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::model::{ConversationTree, NodeId, Role};
use crate::query::active_path::{active_depth_of, normalize_active_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDirectionError;

impl fmt::Display for ParseDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid direction (expected left or right)")
    }
}

impl std::error::Error for ParseDirectionError {}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(ParseDirectionError),
        }
    }
}

/// Depths are 1-based positions in the active path: the root is depth 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// New node under the active leaf; the active path is extended through it.
    Append {
        role: Role,
        content: Option<String>,
    },
    /// New last child of `parent_id`; the active path is left alone.
    AppendAt {
        parent_id: NodeId,
        role: Role,
        content: Option<String>,
    },
    /// Keep only the first `depth` elements of the active path. Nodes are never removed.
    TruncateAfter {
        depth: usize,
    },
    /// Move to the neighbouring sibling at `depth`. Moving right from the last sibling creates
    /// an empty `assistant` node as a new alternative.
    SwitchBranch {
        depth: usize,
        direction: Direction,
    },
    /// Truncate the active path right after `node_id`.
    PruneTo {
        node_id: NodeId,
    },
    SetContent {
        node_id: NodeId,
        content: Option<String>,
    },
    /// Make the root→`node_id` chain the active path.
    SelectNode {
        node_id: NodeId,
    },
    /// Replace the active path; the root is prepended when missing.
    SetActivePath {
        path: Vec<NodeId>,
    },
    SetTitle {
        title: Option<String>,
    },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Append { .. } => "append",
            Self::AppendAt { .. } => "append_at",
            Self::TruncateAfter { .. } => "truncate_after",
            Self::SwitchBranch { .. } => "switch_branch",
            Self::PruneTo { .. } => "prune_to",
            Self::SetContent { .. } => "set_content",
            Self::SelectNode { .. } => "select_node",
            Self::SetActivePath { .. } => "set_active_path",
            Self::SetTitle { .. } => "set_title",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub new_rev: u64,
    pub applied: usize,
    pub delta: Delta,
}

/// What changed as the result of applying ops.
///
/// `added` lists created nodes in creation order, `updated` lists nodes whose content changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<NodeId>,
    pub updated: Vec<NodeId>,
    pub active_path_changed: bool,
    pub title_changed: bool,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.updated.is_empty()
            && !self.active_path_changed
            && !self.title_changed
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: Vec<NodeId>,
    updated: Vec<NodeId>,
    active_path_changed: bool,
    title_changed: bool,
}

impl DeltaBuilder {
    fn record_added(&mut self, node_id: NodeId) {
        self.added.push(node_id);
    }

    fn record_updated(&mut self, node_id: &NodeId) {
        if self.added.contains(node_id) || self.updated.contains(node_id) {
            return;
        }
        self.updated.push(node_id.clone());
    }

    fn record_active_path_changed(&mut self) {
        self.active_path_changed = true;
    }

    fn record_title_changed(&mut self) {
        self.title_changed = true;
    }

    fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.updated.is_empty()
            && !self.active_path_changed
            && !self.title_changed
    }

    fn finish(self) -> Delta {
        Delta {
            added: self.added,
            updated: self.updated,
            active_path_changed: self.active_path_changed,
            title_changed: self.title_changed,
        }
    }
}

/// Result of [`switch_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Already at the leftmost sibling.
    Unchanged,
    Switched(NodeId),
    /// Switched right past the last sibling: a new placeholder node was created.
    Created(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OpOutcome {
    Unchanged,
    Switched(NodeId),
    Created(NodeId),
}

pub fn apply_ops(
    tree: &mut ConversationTree,
    base_rev: u64,
    ops: &[Op],
) -> Result<ApplyResult, ApplyError> {
    let current_rev = tree.rev();
    if base_rev != current_rev {
        return Err(ApplyError::Conflict { base_rev, current_rev });
    }

    if ops.is_empty() {
        return Ok(ApplyResult { new_rev: current_rev, applied: 0, delta: Delta::default() });
    }

    let mut next = tree.clone();
    let mut delta = DeltaBuilder::default();
    for op in ops {
        apply_op(&mut next, op, &mut delta)?;
    }

    if !delta.is_empty() {
        next.bump_rev();
        *tree = next;
    }

    let delta = delta.finish();
    debug!(
        conversation_id = %tree.conversation_id(),
        ops = ops.len(),
        added = delta.added.len(),
        updated = delta.updated.len(),
        new_rev = tree.rev(),
        "applied op batch"
    );

    Ok(ApplyResult { new_rev: tree.rev(), applied: ops.len(), delta })
}

fn apply_single(tree: &mut ConversationTree, op: &Op) -> Result<OpOutcome, ApplyError> {
    let mut delta = DeltaBuilder::default();
    let outcome = apply_op(tree, op, &mut delta)?;
    if !delta.is_empty() {
        tree.bump_rev();
    }
    Ok(outcome)
}

fn created_node(outcome: OpOutcome) -> NodeId {
    match outcome {
        OpOutcome::Created(node_id) => node_id,
        OpOutcome::Unchanged | OpOutcome::Switched(_) => {
            unreachable!("node-creating ops always report the created node")
        }
    }
}

/// Appends a turn under the active leaf and extends the active path through it.
pub fn append(
    tree: &mut ConversationTree,
    role: Role,
    content: Option<String>,
) -> Result<NodeId, ApplyError> {
    apply_single(tree, &Op::Append { role, content }).map(created_node)
}

/// Adds a new last child under `parent_id` without changing the active path.
pub fn append_at(
    tree: &mut ConversationTree,
    parent_id: &NodeId,
    role: Role,
    content: Option<String>,
) -> Result<NodeId, ApplyError> {
    let op = Op::AppendAt {
        parent_id: parent_id.clone(),
        role,
        content,
    };
    apply_single(tree, &op).map(created_node)
}

pub fn truncate_after(tree: &mut ConversationTree, depth: usize) -> Result<(), ApplyError> {
    apply_single(tree, &Op::TruncateAfter { depth }).map(|_| ())
}

pub fn switch_branch(
    tree: &mut ConversationTree,
    depth: usize,
    direction: Direction,
) -> Result<SwitchOutcome, ApplyError> {
    let outcome = apply_single(tree, &Op::SwitchBranch { depth, direction })?;
    Ok(match outcome {
        OpOutcome::Unchanged => SwitchOutcome::Unchanged,
        OpOutcome::Switched(node_id) => SwitchOutcome::Switched(node_id),
        OpOutcome::Created(node_id) => SwitchOutcome::Created(node_id),
    })
}

pub fn prune_to(tree: &mut ConversationTree, node_id: &NodeId) -> Result<(), ApplyError> {
    apply_single(tree, &Op::PruneTo { node_id: node_id.clone() }).map(|_| ())
}

/// Replaces a node's content and refreshes its `updated_at`.
pub fn set_content(
    tree: &mut ConversationTree,
    node_id: &NodeId,
    content: Option<String>,
) -> Result<(), ApplyError> {
    let op = Op::SetContent {
        node_id: node_id.clone(),
        content,
    };
    apply_single(tree, &op).map(|_| ())
}

pub fn select_node(tree: &mut ConversationTree, node_id: &NodeId) -> Result<(), ApplyError> {
    apply_single(tree, &Op::SelectNode { node_id: node_id.clone() }).map(|_| ())
}

pub fn set_active_path(tree: &mut ConversationTree, path: Vec<NodeId>) -> Result<(), ApplyError> {
    apply_single(tree, &Op::SetActivePath { path }).map(|_| ())
}

/// Sets `meta.title`. The revision only moves when the title actually changes.
pub fn set_title(tree: &mut ConversationTree, title: Option<String>) -> Result<(), ApplyError> {
    apply_single(tree, &Op::SetTitle { title }).map(|_| ())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    Conflict { base_rev: u64, current_rev: u64 },
    NodeNotFound { node_id: NodeId },
    NodeNotOnActivePath { node_id: NodeId },
    InvalidDepth { depth: usize, path_len: usize },
    /// `path[index]` is not a child of `path[index - 1]` (after root normalization).
    InvalidActivePath { index: usize, node_id: NodeId },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { base_rev, current_rev } => {
                write!(f, "stale base_rev (base_rev={base_rev}, current_rev={current_rev})")
            }
            Self::NodeNotFound { node_id } => write!(f, "node not found (id={node_id})"),
            Self::NodeNotOnActivePath { node_id } => {
                write!(f, "node is not on the active path (id={node_id})")
            }
            Self::InvalidDepth { depth, path_len } => {
                write!(f, "invalid depth {depth} for active path of length {path_len}")
            }
            Self::InvalidActivePath { index, node_id } => write!(
                f,
                "active path is not contiguous at index {index} (id={node_id})"
            ),
        }
    }
}

impl std::error::Error for ApplyError {}

// Extracted op-application implementation for path mutations.
include!("ops_impl.rs");
