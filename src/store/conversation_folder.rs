// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::format::{decode_document, encode_document, DecodeOptions, DocumentError};
use crate::model::{ConversationId, ConversationTree, IdError};

const CONVERSATIONS_DIRNAME: &str = "conversations";
const DOCUMENT_EXTENSION: &str = "json";
const TEMP_FILE_PREFIX: &str = ".chat-branches.tmp.";

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    Document {
        path: PathBuf,
        source: Box<DocumentError>,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: Box<IdError>,
    },
    ConversationIdMismatch {
        path: PathBuf,
        expected: ConversationId,
        found: ConversationId,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::Document { path, source } => {
                write!(f, "cannot load conversation document {path:?}: {source}")
            }
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::ConversationIdMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "conversation document {path:?} belongs to {found}, expected {expected}"
            ),
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Document { source, .. } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
            Self::ConversationIdMismatch { .. } => None,
            Self::SymlinkRefused { .. } => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Also flushes the written file and the directory entry to stable storage where the
    /// platform allows it.
    Durable,
}

/// One JSON document per conversation under `<root>/conversations/`.
///
/// Every save replaces the whole document atomically, so a reader sees either the previous or
/// the new version of a conversation.
#[derive(Debug, Clone)]
pub struct ConversationFolder {
    root: PathBuf,
    durability: WriteDurability,
    decode_options: DecodeOptions,
}

impl ConversationFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
            decode_options: DecodeOptions::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    /// Options used for documents without tree structure and for fresh conversations.
    pub fn with_decode_options(mut self, decode_options: DecodeOptions) -> Self {
        self.decode_options = decode_options;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn conversations_dir(&self) -> PathBuf {
        self.root.join(CONVERSATIONS_DIRNAME)
    }

    pub fn conversation_path(&self, conversation_id: &ConversationId) -> PathBuf {
        let file_stem = encode_persisted_id_segment(conversation_id.as_str());
        self.conversations_dir()
            .join(format!("{file_stem}.{DOCUMENT_EXTENSION}"))
    }

    pub fn exists(&self, conversation_id: &ConversationId) -> bool {
        self.conversation_path(conversation_id).is_file()
    }

    /// Loads a stored conversation.
    ///
    /// Flat (pre-tree) documents are upgraded in memory and carry `conversation_id`; tree
    /// documents must name the same conversation.
    pub fn load(&self, conversation_id: &ConversationId) -> Result<ConversationTree, StoreError> {
        let path = self.conversation_path(conversation_id);
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let options = self
            .decode_options
            .clone()
            .with_conversation_id(conversation_id.clone());
        let tree = decode_document(value, &options).map_err(|source| StoreError::Document {
            path: path.clone(),
            source: Box::new(source),
        })?;

        if tree.conversation_id() != conversation_id {
            return Err(StoreError::ConversationIdMismatch {
                path,
                expected: conversation_id.clone(),
                found: tree.conversation_id().clone(),
            });
        }

        debug!(
            path = %path.display(),
            conversation_id = %conversation_id,
            nodes = tree.node_count(),
            "loaded conversation"
        );
        Ok(tree)
    }

    /// Loads `conversation_id`, creating and saving a root-only conversation when none exists.
    pub fn load_or_init(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ConversationTree, StoreError> {
        match self.load(conversation_id) {
            Ok(tree) => Ok(tree),
            Err(StoreError::Io { path, source })
                if source.kind() == io::ErrorKind::NotFound
                    && path == self.conversation_path(conversation_id) =>
            {
                let tree = ConversationTree::new(
                    conversation_id.clone(),
                    self.decode_options.root_content().map(ToOwned::to_owned),
                );
                self.save(&tree)?;
                info!(
                    path = %path.display(),
                    conversation_id = %conversation_id,
                    "initialized conversation"
                );
                Ok(tree)
            }
            Err(err) => Err(err),
        }
    }

    pub fn save(&self, tree: &ConversationTree) -> Result<(), StoreError> {
        let path = self.conversation_path(tree.conversation_id());
        let document = encode_document(tree);
        let text = serde_json::to_string_pretty(&document).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        write_atomic_in_folder(
            self.root(),
            &path,
            format!("{text}\n").as_bytes(),
            self.durability,
        )?;

        debug!(
            path = %path.display(),
            conversation_id = %tree.conversation_id(),
            rev = tree.rev(),
            "saved conversation"
        );
        Ok(())
    }

    /// Ids of all stored conversations, sorted. A missing folder lists as empty.
    pub fn list(&self) -> Result<Vec<ConversationId>, StoreError> {
        let dir = self.conversations_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut conversation_ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            let Some(file_stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if file_stem.starts_with('.') {
                continue;
            }
            let Some(raw_id) = decode_persisted_id_segment(file_stem) else {
                warn!(path = %path.display(), "skipping file with undecodable name");
                continue;
            };

            let conversation_id =
                ConversationId::new(&raw_id).map_err(|source| StoreError::InvalidId {
                    field: "conversation file name",
                    value: raw_id.clone(),
                    source: Box::new(source),
                })?;
            conversation_ids.push(conversation_id);
        }

        conversation_ids.sort();
        Ok(conversation_ids)
    }

    /// Removes a stored conversation. Returns `false` when there was nothing to remove.
    pub fn delete(&self, conversation_id: &ConversationId) -> Result<bool, StoreError> {
        let path = self.conversation_path(conversation_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(
                    path = %path.display(),
                    conversation_id = %conversation_id,
                    "deleted conversation"
                );
                Ok(true)
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

// Extracted filesystem helpers (file names, atomic writes).
include!("conversation_folder/helpers.rs");
