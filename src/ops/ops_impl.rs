// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Op application helpers used by `apply_ops` and the single-op entry points.
/// Every arm checks its preconditions before the first write to `tree`.
fn apply_op(
    tree: &mut ConversationTree,
    op: &Op,
    delta: &mut DeltaBuilder,
) -> Result<OpOutcome, ApplyError> {
    match op {
        Op::Append { role, content } => {
            let parent_id = tree.active_leaf().clone();
            let node_id = create_node(tree, &parent_id, *role, content.clone(), delta);
            tree.active_path_mut().push(node_id.clone());
            delta.record_active_path_changed();
            Ok(OpOutcome::Created(node_id))
        }
        Op::AppendAt {
            parent_id,
            role,
            content,
        } => {
            if !tree.contains(parent_id.as_str()) {
                return Err(ApplyError::NodeNotFound {
                    node_id: parent_id.clone(),
                });
            }
            let node_id = create_node(tree, parent_id, *role, content.clone(), delta);
            Ok(OpOutcome::Created(node_id))
        }
        Op::TruncateAfter { depth } => truncate_active_path(tree, *depth, delta),
        Op::SwitchBranch { depth, direction } => switch_sibling(tree, *depth, *direction, delta),
        Op::PruneTo { node_id } => {
            if !tree.contains(node_id.as_str()) {
                return Err(ApplyError::NodeNotFound {
                    node_id: node_id.clone(),
                });
            }
            let Some(depth) = active_depth_of(tree, node_id.as_str()) else {
                return Err(ApplyError::NodeNotOnActivePath {
                    node_id: node_id.clone(),
                });
            };
            truncate_active_path(tree, depth, delta)
        }
        Op::SetContent { node_id, content } => {
            let Some(node) = tree.node_mut(node_id.as_str()) else {
                return Err(ApplyError::NodeNotFound {
                    node_id: node_id.clone(),
                });
            };
            node.set_content(content.clone());
            node.touch();
            delta.record_updated(node_id);
            Ok(OpOutcome::Unchanged)
        }
        Op::SelectNode { node_id } => {
            let Some(chain) = tree.chain_to(node_id.as_str()) else {
                return Err(ApplyError::NodeNotFound {
                    node_id: node_id.clone(),
                });
            };
            if replace_active_path(tree, chain, delta) {
                Ok(OpOutcome::Switched(node_id.clone()))
            } else {
                Ok(OpOutcome::Unchanged)
            }
        }
        Op::SetActivePath { path } => {
            let path = normalize_active_path(tree.root_id(), path);
            check_active_path(tree, &path)?;
            let Some(leaf) = path.last().cloned() else {
                return Ok(OpOutcome::Unchanged);
            };
            if replace_active_path(tree, path, delta) {
                Ok(OpOutcome::Switched(leaf))
            } else {
                Ok(OpOutcome::Unchanged)
            }
        }
        Op::SetTitle { title } => {
            if tree.set_title(title.clone()) {
                delta.record_title_changed();
            }
            Ok(OpOutcome::Unchanged)
        }
    }
}

fn create_node(
    tree: &mut ConversationTree,
    parent_id: &NodeId,
    role: Role,
    content: Option<String>,
    delta: &mut DeltaBuilder,
) -> NodeId {
    let node_id = tree.insert_child(parent_id, role, content);
    debug!(
        conversation_id = %tree.conversation_id(),
        node_id = %node_id,
        parent_id = %parent_id,
        role = %role,
        "created node"
    );
    delta.record_added(node_id.clone());
    node_id
}

fn truncate_active_path(
    tree: &mut ConversationTree,
    depth: usize,
    delta: &mut DeltaBuilder,
) -> Result<OpOutcome, ApplyError> {
    let path_len = tree.active_path().len();
    if depth == 0 {
        return Err(ApplyError::InvalidDepth { depth, path_len });
    }
    if depth >= path_len {
        return Ok(OpOutcome::Unchanged);
    }

    tree.active_path_mut().truncate(depth);
    delta.record_active_path_changed();
    Ok(OpOutcome::Unchanged)
}

fn switch_sibling(
    tree: &mut ConversationTree,
    depth: usize,
    direction: Direction,
    delta: &mut DeltaBuilder,
) -> Result<OpOutcome, ApplyError> {
    let path_len = tree.active_path().len();
    // The root (depth 1) has no siblings.
    if depth < 2 || depth > path_len {
        return Err(ApplyError::InvalidDepth { depth, path_len });
    }

    let parent_id = tree.active_path()[depth - 2].clone();
    let current_id = &tree.active_path()[depth - 1];
    let siblings = tree.children(parent_id.as_str());
    let Some(index) = siblings.iter().position(|id| id == current_id) else {
        return Err(ApplyError::NodeNotFound {
            node_id: current_id.clone(),
        });
    };

    let target = match direction {
        Direction::Left if index == 0 => return Ok(OpOutcome::Unchanged),
        Direction::Left => Some(siblings[index - 1].clone()),
        Direction::Right => siblings.get(index + 1).cloned(),
    };

    let (node_id, created) = match target {
        Some(node_id) => (node_id, false),
        None => {
            let placeholder = Some(String::new());
            let node_id = create_node(tree, &parent_id, Role::Assistant, placeholder, delta);
            (node_id, true)
        }
    };

    let path = tree.active_path_mut();
    path.truncate(depth - 1);
    path.push(node_id.clone());
    delta.record_active_path_changed();

    if created {
        Ok(OpOutcome::Created(node_id))
    } else {
        Ok(OpOutcome::Switched(node_id))
    }
}

fn check_active_path(tree: &ConversationTree, path: &[NodeId]) -> Result<(), ApplyError> {
    for node_id in path {
        if !tree.contains(node_id.as_str()) {
            return Err(ApplyError::NodeNotFound {
                node_id: node_id.clone(),
            });
        }
    }

    for (index, pair) in path.windows(2).enumerate() {
        if tree.parent_of(pair[1].as_str()) != Some(&pair[0]) {
            return Err(ApplyError::InvalidActivePath {
                index: index + 1,
                node_id: pair[1].clone(),
            });
        }
    }
    Ok(())
}

/// Returns whether the active path actually changed.
fn replace_active_path(
    tree: &mut ConversationTree,
    path: Vec<NodeId>,
    delta: &mut DeltaBuilder,
) -> bool {
    if tree.active_path() == path.as_slice() {
        return false;
    }
    *tree.active_path_mut() = path;
    delta.record_active_path_changed();
    true
}
