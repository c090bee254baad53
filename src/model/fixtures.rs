// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::ids::{ConversationId, NodeId};
use super::node::Node;
use super::role::Role;
use super::tree::{ConversationTree, TreeParts};

pub(crate) fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn tree_from_edges(
    conversation_id: &str,
    nodes: &[(&str, Option<&str>, Role, Option<&str>)],
    active_path: &[&str],
) -> ConversationTree {
    let mut node_map = BTreeMap::new();
    let mut children: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut root_id = None;

    for (id, parent, role, content) in nodes {
        let node = Node::new(
            nid(id),
            parent.map(nid),
            *role,
            content.map(ToOwned::to_owned),
        );
        match parent {
            Some(parent) => children.entry(nid(parent)).or_default().push(nid(id)),
            None => root_id = Some(nid(id)),
        }
        node_map.insert(nid(id), node);
    }

    ConversationTree::from_parts(TreeParts {
        conversation_id: ConversationId::new(conversation_id).expect("conversation id"),
        title: None,
        root_id: root_id.expect("fixture has a root"),
        nodes: node_map,
        children,
        active_path: active_path.iter().map(|id| nid(id)).collect(),
    })
    .expect("fixture tree is valid")
}

/// `R (system) -> A (user, "hi") -> B (assistant, "hello")`, active path `[R, A, B]`.
pub(crate) fn greeting_tree() -> ConversationTree {
    tree_from_edges(
        "c:greeting",
        &[
            ("R", None, Role::System, None),
            ("A", Some("R"), Role::User, Some("hi")),
            ("B", Some("A"), Role::Assistant, Some("hello")),
        ],
        &["R", "A", "B"],
    )
}

/// Two alternative replies under `A`, the second one continued:
///
/// ```text
/// R ── A ─┬─ B
///         └─ B2 ── C
/// ```
///
/// Active path `[R, A, B2, C]`.
pub(crate) fn swipe_tree() -> ConversationTree {
    tree_from_edges(
        "c:swipe",
        &[
            ("R", None, Role::System, Some("be brief")),
            ("A", Some("R"), Role::User, Some("hi")),
            ("B", Some("A"), Role::Assistant, Some("hello")),
            ("B2", Some("A"), Role::Assistant, Some("hey there")),
            ("C", Some("B2"), Role::User, Some("how are you?")),
        ],
        &["R", "A", "B2", "C"],
    )
}
