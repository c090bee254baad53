// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Degraded input: flat message lists without any tree structure.
//!
//! Every JSON value maps to some tree. Messages are chained below a synthetic `system` root in
//! input order and the whole chain becomes the active path.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{ConversationId, ConversationTree, Node, NodeId, Role, TreeParts, ROOT_NODE_ID};

use super::document::DecodeOptions;

struct FlatMessage {
    role: Role,
    content: Option<String>,
}

/// Builds a linear tree from `value`. Never fails.
///
/// Accepted shapes are an array of messages, or an object with an optional `messages` array and
/// optional `meta.id`/`meta.title`. Anything else yields a root-only tree.
pub fn synthesize_flat(value: &Value, options: &DecodeOptions) -> ConversationTree {
    let (items, object): (&[Value], Option<&Map<String, Value>>) = match value {
        Value::Array(items) => (items.as_slice(), None),
        Value::Object(object) => {
            let items = object
                .get("messages")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            (items, Some(object))
        }
        _ => (&[], None),
    };

    let meta = object.and_then(|object| object.get("meta"));
    let conversation_id = meta
        .and_then(|meta| meta.get("id"))
        .and_then(Value::as_str)
        .and_then(|raw| ConversationId::new(raw).ok())
        .unwrap_or_else(|| options.conversation_id().clone());
    let title = meta
        .and_then(|meta| meta.get("title"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    let mut coerced_roles = 0usize;
    let mut skipped = 0usize;
    let messages: Vec<FlatMessage> = items
        .iter()
        .filter_map(|item| {
            let message = flat_message(item, &mut coerced_roles);
            if message.is_none() {
                skipped += 1;
            }
            message
        })
        .collect();

    let tree = chain_tree(conversation_id, title, options, messages);

    warn!(
        conversation_id = %tree.conversation_id(),
        messages = tree.active_path().len() - 1,
        skipped,
        "synthesized conversation tree from flat document"
    );
    if coerced_roles > 0 {
        warn!(
            conversation_id = %tree.conversation_id(),
            coerced_roles,
            "coerced unknown message roles to user"
        );
    }
    tree
}

fn flat_message(item: &Value, coerced_roles: &mut usize) -> Option<FlatMessage> {
    match item {
        Value::String(text) => Some(FlatMessage {
            role: Role::User,
            content: Some(text.clone()),
        }),
        Value::Object(object) => {
            let raw_role = object.get("role").and_then(Value::as_str);
            let role = Role::coerce(raw_role);
            if raw_role.map_or(true, |raw| raw.parse::<Role>().is_err()) {
                *coerced_roles += 1;
            }
            Some(FlatMessage {
                role,
                content: object.get("content").and_then(flat_content),
            })
        }
        _ => None,
    }
}

/// Plain strings pass through. Part arrays keep their `text` parts joined by newlines.
fn flat_content(content: &Value) -> Option<String> {
    match content {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter(|part| {
                    part.get("type")
                        .and_then(Value::as_str)
                        .map_or(true, |kind| kind == "text")
                })
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            Some(texts.join("\n"))
        }
        other => Some(other.to_string()),
    }
}

fn chain_tree(
    conversation_id: ConversationId,
    title: Option<String>,
    options: &DecodeOptions,
    messages: Vec<FlatMessage>,
) -> ConversationTree {
    let root_id = NodeId::new(ROOT_NODE_ID).expect("hard-coded root id is valid");
    let mut nodes = BTreeMap::new();
    let mut children = BTreeMap::new();
    let mut active_path = Vec::with_capacity(messages.len() + 1);

    nodes.insert(
        root_id.clone(),
        Node::new(
            root_id.clone(),
            None,
            Role::System,
            options.root_content().map(ToOwned::to_owned),
        ),
    );
    active_path.push(root_id.clone());

    let mut digits = itoa::Buffer::new();
    let mut parent_id = root_id.clone();
    for (index, message) in messages.into_iter().enumerate() {
        let seq = digits.format(index + 1);
        let mut raw = String::with_capacity(seq.len() + 1);
        raw.push('n');
        raw.push_str(seq);
        let node_id = NodeId::new(raw).expect("sequence ids are valid");

        nodes.insert(
            node_id.clone(),
            Node::new(
                node_id.clone(),
                Some(parent_id.clone()),
                message.role,
                message.content,
            ),
        );
        children.insert(parent_id, vec![node_id.clone()]);
        active_path.push(node_id.clone());
        parent_id = node_id;
    }

    ConversationTree::from_parts(TreeParts {
        conversation_id,
        title,
        root_id,
        nodes,
        children,
        active_path,
    })
    .expect("synthesized chain is a valid tree")
}
