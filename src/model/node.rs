// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::{SystemTime, UNIX_EPOCH};

use super::ids::NodeId;
use super::role::Role;

/// One conversation turn.
///
/// Only `content` and `updated_at` ever change after creation; the parent link is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    node_id: NodeId,
    parent_id: Option<NodeId>,
    role: Role,
    content: Option<String>,
    updated_at: Option<u64>,
}

impl Node {
    pub fn new(
        node_id: NodeId,
        parent_id: Option<NodeId>,
        role: Role,
        content: Option<String>,
    ) -> Self {
        Self {
            node_id,
            parent_id,
            role,
            content,
            updated_at: None,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn set_content(&mut self, content: Option<String>) {
        self.content = content;
    }

    /// Unix timestamp in milliseconds of the last create/content edit, if known.
    pub fn updated_at(&self) -> Option<u64> {
        self.updated_at
    }

    pub fn set_updated_at(&mut self, updated_at: Option<u64>) {
        self.updated_at = updated_at;
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(now_millis());
    }
}

pub(crate) fn now_millis() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}
