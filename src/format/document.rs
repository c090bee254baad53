// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::{
    ConversationId, ConversationTree, Id, IdError, MalformedDocument, Node, NodeId, ParseRoleError,
    Role, TreeParts,
};

use super::flat::synthesize_flat;

pub const SCHEMA_NAME: &str = "chat-branches";
pub const SCHEMA_VERSION: u32 = 2;

const DEFAULT_CONVERSATION_ID: &str = "conversation";

/// `chat-branches` v2 document as exchanged with persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentJson {
    /// Absent means the current schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaJson>,
    pub meta: MetaJson,
    pub root: String,
    pub nodes: BTreeMap<String, NodeJson>,
    /// Leaves may be missing here.
    #[serde(default)]
    pub children: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub active_path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaJson {
    pub name: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MetaJson {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NodeJson {
    #[serde(default)]
    pub pid: Option<String>,
    /// One of `system`, `user` or `assistant` (case-insensitive on input).
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Unix milliseconds of the last create or content edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

/// Host-supplied defaults for documents that do not carry everything themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    conversation_id: ConversationId,
    root_content: Option<String>,
}

impl DecodeOptions {
    /// Conversation id for synthesized (flat) documents.
    pub fn with_conversation_id(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    /// Content of the synthetic root created for flat documents.
    pub fn with_root_content(mut self, root_content: Option<String>) -> Self {
        self.root_content = root_content;
        self
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn root_content(&self) -> Option<&str> {
        self.root_content.as_deref()
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            conversation_id: ConversationId::new(DEFAULT_CONVERSATION_ID)
                .expect("default conversation id is valid"),
            root_content: Some(String::new()),
        }
    }
}

#[derive(Debug)]
pub enum DocumentError {
    Json {
        source: serde_json::Error,
    },
    UnsupportedSchema {
        name: String,
        version: u32,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
    UnknownRole {
        node_id: String,
        source: ParseRoleError,
    },
    Malformed {
        source: MalformedDocument,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { source } => write!(f, "invalid document json: {source}"),
            Self::UnsupportedSchema { name, version } => write!(
                f,
                "unsupported document schema {name:?} version {version} (expected {SCHEMA_NAME:?} version {SCHEMA_VERSION})"
            ),
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::UnknownRole { node_id, source } => {
                write!(f, "node {node_id:?} has {source}")
            }
            Self::Malformed { source } => write!(f, "malformed document: {source}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source } => Some(source),
            Self::UnsupportedSchema { .. } => None,
            Self::InvalidId { source, .. } => Some(source),
            Self::UnknownRole { source, .. } => Some(source),
            Self::Malformed { source } => Some(source),
        }
    }
}

impl From<MalformedDocument> for DocumentError {
    fn from(source: MalformedDocument) -> Self {
        Self::Malformed { source }
    }
}

/// Parses document text. Tree documents are validated; anything else is synthesized.
pub fn parse_document(
    text: &str,
    options: &DecodeOptions,
) -> Result<ConversationTree, DocumentError> {
    let value: Value =
        serde_json::from_str(text).map_err(|source| DocumentError::Json { source })?;
    decode_document(value, options)
}

/// Decodes an already-parsed JSON value.
///
/// Objects carrying a `nodes` map go through the strict tree path and fail on any structural
/// violation. Every other value takes the degraded flat path, which never fails.
pub fn decode_document(
    value: Value,
    options: &DecodeOptions,
) -> Result<ConversationTree, DocumentError> {
    let is_tree = value
        .as_object()
        .is_some_and(|object| object.get("nodes").is_some_and(Value::is_object));
    if !is_tree {
        return Ok(synthesize_flat(&value, options));
    }

    let document: DocumentJson =
        serde_json::from_value(value).map_err(|source| DocumentError::Json { source })?;
    tree_from_document(document)
}

pub fn tree_from_document(document: DocumentJson) -> Result<ConversationTree, DocumentError> {
    if let Some(schema) = &document.schema {
        if schema.name != SCHEMA_NAME || schema.version != SCHEMA_VERSION {
            return Err(DocumentError::UnsupportedSchema {
                name: schema.name.clone(),
                version: schema.version,
            });
        }
    }

    let conversation_id: ConversationId = parse_id("meta.id", &document.meta.id)?;
    let root_id: NodeId = parse_id("root", &document.root)?;

    let mut nodes = BTreeMap::new();
    for (raw_id, node_json) in document.nodes {
        let node_id: NodeId = parse_id("nodes", &raw_id)?;
        let parent_id = node_json
            .pid
            .as_deref()
            .map(|raw| parse_id("nodes.pid", raw))
            .transpose()?;
        let role = node_json
            .role
            .parse::<Role>()
            .map_err(|source| DocumentError::UnknownRole {
                node_id: raw_id.clone(),
                source,
            })?;

        let mut node = Node::new(node_id.clone(), parent_id, role, node_json.content);
        node.set_updated_at(node_json.updated_at);
        nodes.insert(node_id, node);
    }

    let mut children = BTreeMap::new();
    for (raw_parent, raw_children) in document.children {
        let parent_id: NodeId = parse_id("children", &raw_parent)?;
        let child_ids = raw_children
            .iter()
            .map(|raw| parse_id("children", raw))
            .collect::<Result<Vec<NodeId>, _>>()?;
        children.insert(parent_id, child_ids);
    }

    let active_path = document
        .active_path
        .iter()
        .map(|raw| parse_id("active_path", raw))
        .collect::<Result<Vec<NodeId>, _>>()?;

    let tree = ConversationTree::from_parts(TreeParts {
        conversation_id,
        title: document.meta.title,
        root_id,
        nodes,
        children,
        active_path,
    })?;

    debug!(
        conversation_id = %tree.conversation_id(),
        nodes = tree.node_count(),
        active_depth = tree.active_path().len(),
        "decoded conversation document"
    );
    Ok(tree)
}

/// Deterministic encoding: sorted keys, a `children` entry for every node, normalized path.
pub fn encode_document(tree: &ConversationTree) -> DocumentJson {
    let mut nodes = BTreeMap::new();
    let mut children = BTreeMap::new();
    for node in tree.nodes() {
        let node_id = node.node_id().as_str();
        nodes.insert(
            node_id.to_owned(),
            NodeJson {
                pid: node.parent_id().map(|id| id.as_str().to_owned()),
                role: node.role().as_str().to_owned(),
                content: node.content().map(ToOwned::to_owned),
                updated_at: node.updated_at(),
            },
        );
        children.insert(
            node_id.to_owned(),
            tree.children(node_id)
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
        );
    }

    DocumentJson {
        schema: Some(SchemaJson {
            name: SCHEMA_NAME.to_owned(),
            version: SCHEMA_VERSION,
        }),
        meta: MetaJson {
            id: tree.conversation_id().as_str().to_owned(),
            title: tree.title().map(ToOwned::to_owned),
        },
        root: tree.root_id().as_str().to_owned(),
        nodes,
        children,
        active_path: tree
            .active_path()
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect(),
    }
}

pub fn to_document_string(tree: &ConversationTree) -> Result<String, DocumentError> {
    let mut out = serde_json::to_string_pretty(&encode_document(tree))
        .map_err(|source| DocumentError::Json { source })?;
    out.push('\n');
    Ok(out)
}

/// JSON Schema of the v2 tree document.
pub fn document_json_schema() -> schemars::Schema {
    schemars::schema_for!(DocumentJson)
}

fn parse_id<T>(field: &'static str, value: &str) -> Result<Id<T>, DocumentError> {
    Id::new(value).map_err(|source| DocumentError::InvalidId {
        field,
        value: value.to_owned(),
        source,
    })
}
