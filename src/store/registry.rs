// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Single-writer host for conversations backed by a [`ConversationFolder`].
//!
//! Each conversation sits behind its own `RwLock`: any number of readers, one writer. A write
//! works on a copy of the tree, persists the copy, and only then publishes it, so readers never
//! see a partial or unsaved update. The registry map is only locked to find or insert a slot;
//! loading a conversation from disk holds that conversation's slot, not the map.
//!
//! A poisoned lock still guards a complete tree (copies are published whole), so poisoning is
//! recovered from instead of propagated.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::model::{ConversationId, ConversationTree};
use crate::ops::{apply_ops, ApplyError, ApplyResult, Op};
use crate::query::{project_active, ChatMessage};

use super::conversation_folder::{ConversationFolder, StoreError};

type SharedTree = Arc<RwLock<ConversationTree>>;
/// Empty until the first successful load.
type Slot = Arc<Mutex<Option<SharedTree>>>;

#[derive(Debug)]
pub enum RegistryError {
    Store(StoreError),
    Apply(ApplyError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::Apply(err) => write!(f, "cannot apply ops: {err}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Apply(err) => Some(err),
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ApplyError> for RegistryError {
    fn from(err: ApplyError) -> Self {
        Self::Apply(err)
    }
}

#[derive(Debug)]
pub struct ConversationRegistry {
    folder: ConversationFolder,
    slots: RwLock<HashMap<ConversationId, Slot>>,
}

impl ConversationRegistry {
    pub fn new(folder: ConversationFolder) -> Self {
        Self {
            folder,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn folder(&self) -> &ConversationFolder {
        &self.folder
    }

    /// Ids currently cached in memory, sorted.
    pub fn loaded(&self) -> Vec<ConversationId> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<_> = slots
            .iter()
            .filter(|(_, slot)| is_loaded(slot))
            .map(|(conversation_id, _)| conversation_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drops the cached copy; the next access reloads from disk.
    pub fn evict(&self, conversation_id: &ConversationId) -> bool {
        let removed = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(conversation_id);
        removed.as_ref().is_some_and(is_loaded)
    }

    /// Runs `f` against the current tree, loading (or initializing) it on first access.
    pub fn read<R>(
        &self,
        conversation_id: &ConversationId,
        f: impl FnOnce(&ConversationTree) -> R,
    ) -> Result<R, RegistryError> {
        let shared = self.shared(conversation_id)?;
        let tree = shared.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&tree))
    }

    pub fn snapshot(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ConversationTree, RegistryError> {
        self.read(conversation_id, ConversationTree::clone)
    }

    /// The canonical LLM-facing view of the active branch.
    pub fn project_active(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, RegistryError> {
        self.read(conversation_id, project_active)
    }

    /// Applies an op batch with a revision check and persists the result.
    pub fn apply(
        &self,
        conversation_id: &ConversationId,
        base_rev: u64,
        ops: &[Op],
    ) -> Result<ApplyResult, RegistryError> {
        self.mutate(conversation_id, |tree| apply_ops(tree, base_rev, ops))
    }

    /// Runs `f` on a copy of the tree. The copy is saved and published only when `f` succeeds
    /// and changed the revision; every tree mutation in [`crate::ops`] bumps it.
    pub fn mutate<R>(
        &self,
        conversation_id: &ConversationId,
        f: impl FnOnce(&mut ConversationTree) -> Result<R, ApplyError>,
    ) -> Result<R, RegistryError> {
        let shared = self.shared(conversation_id)?;
        let mut tree = shared.write().unwrap_or_else(PoisonError::into_inner);

        let mut candidate = tree.clone();
        let out = f(&mut candidate)?;
        if candidate.rev() == tree.rev() {
            return Ok(out);
        }

        self.folder.save(&candidate)?;
        debug!(
            conversation_id = %conversation_id,
            rev = candidate.rev(),
            "published conversation update"
        );
        *tree = candidate;
        Ok(out)
    }

    fn slot(&self, conversation_id: &ConversationId) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(conversation_id)
        {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(conversation_id.clone()).or_default();
        Arc::clone(slot)
    }

    fn shared(&self, conversation_id: &ConversationId) -> Result<SharedTree, RegistryError> {
        let slot = self.slot(conversation_id);
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(shared) = cached.as_ref() {
            return Ok(Arc::clone(shared));
        }

        let tree = self.folder.load_or_init(conversation_id)?;
        let shared = Arc::new(RwLock::new(tree));
        *cached = Some(Arc::clone(&shared));
        Ok(shared)
    }
}

fn is_loaded(slot: &Slot) -> bool {
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}
