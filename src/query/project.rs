// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Linear `{role, content}` views derived from a path through the tree.

use std::slice;

use serde::Serialize;

use crate::model::{ConversationTree, Node, NodeId, Role};

use super::outline::{preorder, Preorder};

/// OpenAI-style chat message. Serializes to exactly `{"role": ..., "content": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    fn from_node(node: &Node) -> Self {
        Self::new(node.role(), node.content().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectionOptions {
    /// Emit the root turn too. Off by default: LLM-facing views start after the root.
    pub include_root: bool,
}

impl ProjectionOptions {
    pub fn with_root(mut self) -> Self {
        self.include_root = true;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PathSelector<'a> {
    ActivePath,
    /// Ids in the given order; ids not present in the tree are skipped.
    Explicit(&'a [NodeId]),
    /// Every node, depth-first in sibling order.
    WholeTree,
}

#[derive(Debug, Clone)]
enum Source<'a> {
    Path(slice::Iter<'a, NodeId>),
    Tree(Preorder<'a>),
}

/// Lazy and finite. Clone it before consuming to replay the same view.
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    tree: &'a ConversationTree,
    source: Source<'a>,
    include_root: bool,
}

impl Iterator for Projection<'_> {
    type Item = ChatMessage;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = match &mut self.source {
                Source::Path(ids) => {
                    let node_id = ids.next()?;
                    match self.tree.node(node_id.as_str()) {
                        Some(node) => node,
                        None => continue,
                    }
                }
                Source::Tree(walk) => walk.next()?.0,
            };

            if !self.include_root && node.is_root() {
                continue;
            }
            return Some(ChatMessage::from_node(node));
        }
    }
}

pub fn project<'a>(
    tree: &'a ConversationTree,
    selector: PathSelector<'a>,
    options: ProjectionOptions,
) -> Projection<'a> {
    let source = match selector {
        PathSelector::ActivePath => Source::Path(tree.active_path().iter()),
        PathSelector::Explicit(ids) => Source::Path(ids.iter()),
        PathSelector::WholeTree => Source::Tree(preorder(tree)),
    };

    Projection {
        tree,
        source,
        include_root: options.include_root,
    }
}

/// The LLM-facing view of the active path (root excluded).
pub fn project_active(tree: &ConversationTree) -> Vec<ChatMessage> {
    project(tree, PathSelector::ActivePath, ProjectionOptions::default()).collect()
}
