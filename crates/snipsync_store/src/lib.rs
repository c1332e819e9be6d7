//! # Snipsync Store
//!
//! SQLite-backed local store adapter for the snipsync engine.
//!
//! This crate provides:
//! - Schema bootstrap for the six application tables and the engine-owned
//!   bookkeeping tables
//! - A transactional [`Store`] handle (WAL, foreign keys on)
//! - The ID mapping service (`local_id` ↔ `server_id`, per table)
//! - The deletion tracker (tombstones awaiting propagation)
//! - The persisted sync-configuration singleton
//!
//! ## Key Invariants
//!
//! - A local row maps to at most one server row and vice versa, enforced
//!   by uniqueness constraints on `sync_id_map`
//! - Tombstones exist only for rows that had a server mapping when they
//!   were deleted
//! - Multi-statement work runs inside one transaction; readers never see
//!   partial application

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod deletions;
mod error;
pub mod mapping;
pub mod rows;
mod schema;
pub mod settings;
mod store;

pub use deletions::DeletionRow;
pub use error::{StoreError, StoreResult};
pub use rows::{FolderRow, SnippetContentRow, SnippetRow, TagRow};
pub use settings::SyncSettings;
pub use store::Store;
