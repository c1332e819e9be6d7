//! # Snipsync Protocol
//!
//! Wire protocol types for the snipsync synchronization engine.
//!
//! This crate provides:
//! - The sync table registry with its fixed apply order
//! - Per-table record payloads (folders, snippets, contents, tags, links)
//! - Push/pull/full/ping request and response messages
//! - Auth endpoint payloads (register, login)
//!
//! All types serialize to the camelCase JSON the sync server speaks.
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod messages;
mod records;
mod tables;

pub use auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
pub use messages::{
    IdMapping, PingResponse, PullChanges, PullRequest, PullResponse, PushChangeItem, PushChanges,
    PushLinkItem, PushRequest, PushResponse, SyncDeletionData,
};
pub use records::{FolderData, PulledLink, PulledRecord, SnippetContentData, SnippetData, TagData};
pub use tables::{SyncTable, UnknownTable};
