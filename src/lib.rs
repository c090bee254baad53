// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Chat Branches: branching conversation trees for chat front-ends.
//!
//! A conversation is a rooted tree of turns. Alternative replies ("swipes") are siblings, one
//! root-to-leaf active path selects what the user sees, and the linear OpenAI-style message list
//! sent to a model is projected from that path.
//!
//! - [`model`]: ids, roles, nodes and the validated [`model::ConversationTree`].
//! - [`query`]: sibling positions (j/n), active-path helpers, outlines and projections.
//! - [`ops`]: all mutations, single or batched with revision checks.
//! - [`format`]: the `chat-branches` v2 JSON document and the flat-list fallback.
//! - [`store`]: atomic on-disk persistence and a per-conversation single-writer registry.
//!
//! The crate emits `tracing` events and never installs a subscriber.

pub mod format;
pub mod model;
pub mod ops;
pub mod query;
pub mod store;
