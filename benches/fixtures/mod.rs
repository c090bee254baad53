// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Deterministic conversation fixtures for benchmarks (no RNG).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chat_branches::model::{ConversationId, ConversationTree, NodeId, Role};
use chat_branches::ops::{append, append_at};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!(
            "chat_branches_bench_{prefix}_{}_{nanos}_{counter}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).expect("create temp dir");

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// 20 turns, 3 swipes per assistant turn.
    Small,
    /// 200 turns, 4 swipes per assistant turn.
    Medium,
    /// 1000 turns, 2 swipes per assistant turn.
    Long,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    fn shape(self) -> (usize, usize) {
        match self {
            Self::Small => (20, 3),
            Self::Medium => (200, 4),
            Self::Long => (1000, 2),
        }
    }
}

fn message_text(prefix: &str, idx: usize, len: usize) -> String {
    let mut out = format!("{prefix} {idx}: ");
    while out.len() < len {
        out.push_str("lorem ipsum ");
    }
    out.truncate(len);
    out
}

/// Alternating user/assistant turns where every assistant turn has extra swipes.
///
/// The active path always follows the first child, so the unselected swipes hang off it.
pub fn conversation(case: Case) -> ConversationTree {
    let (turns, swipes) = case.shape();
    let conversation_id =
        ConversationId::new(format!("bench:{}", case.id())).expect("conversation id");
    let mut tree = ConversationTree::new(conversation_id, Some("You are helpful.".to_owned()));

    for turn in 0..turns {
        let role = if turn % 2 == 0 { Role::User } else { Role::Assistant };
        let parent = tree.active_leaf().clone();
        append(&mut tree, role, Some(message_text(role.as_str(), turn, 120)))
            .expect("append");

        if role == Role::Assistant {
            for swipe in 1..swipes {
                let text = message_text("swipe", turn * 10 + swipe, 120);
                append_at(&mut tree, &parent, Role::Assistant, Some(text)).expect("append_at");
            }
        }
    }

    tree
}

/// Deepest assistant turn on the active path that has swipes (1-based depth).
pub fn last_branch_depth(tree: &ConversationTree) -> usize {
    tree.active_path()
        .iter()
        .enumerate()
        .rev()
        .find_map(|(idx, node_id): (usize, &NodeId)| {
            let parent = tree.parent_of(node_id.as_str())?;
            (tree.children(parent.as_str()).len() > 1).then_some(idx + 1)
        })
        .expect("fixture has branches")
}

/// `[{role, content}, ...]` array in the pre-tree format.
pub fn flat_document(turns: usize) -> String {
    let messages: Vec<serde_json::Value> = (0..turns)
        .map(|turn| {
            let role = if turn % 2 == 0 { "user" } else { "assistant" };
            serde_json::json!({ "role": role, "content": message_text(role, turn, 120) })
        })
        .collect();
    serde_json::to_string(&messages).expect("flat document")
}
