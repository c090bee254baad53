// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for conversations on disk.
//!
//! The store module reads/writes one `chat-branches` document per conversation and hosts the
//! in-memory copies that hosts mutate.

pub mod conversation_folder;
pub mod registry;

pub use conversation_folder::{ConversationFolder, StoreError, WriteDurability};
pub use registry::{ConversationRegistry, RegistryError};
