// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Conversation document parsing/export.
//!
//! The `chat-branches` v2 JSON document is the only persisted shape. Flat message arrays from
//! older producers are accepted on input and converted to a single-branch tree.

pub mod document;
pub mod flat;

pub use document::{
    decode_document, document_json_schema, encode_document, parse_document, to_document_string,
    tree_from_document, DecodeOptions, DocumentError, DocumentJson, MetaJson, NodeJson, SchemaJson,
    SCHEMA_NAME, SCHEMA_VERSION,
};
pub use flat::synthesize_flat;
