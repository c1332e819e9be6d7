//! Per-table record payloads.
//!
//! Push payloads carry business fields only; the row identity travels in
//! the surrounding [`crate::PushChangeItem`]. Pulled records additionally
//! carry the server id and the server's version counter.

use serde::{Deserialize, Serialize};

/// Business fields of a folder row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderData {
    /// Display name.
    pub name: String,
    /// Default language for new snippets in this folder.
    pub default_language: String,
    /// Server id of the parent folder, if any (and if the parent is synced).
    pub parent_id: Option<String>,
    /// Whether the folder is expanded in the sidebar (0 or 1).
    pub is_open: i64,
    /// Manual sort position.
    pub order_index: i64,
    /// Optional icon identifier.
    pub icon: Option<String>,
    /// Creation timestamp, milliseconds since epoch.
    pub created_at: i64,
    /// Last modification timestamp, milliseconds since epoch.
    pub updated_at: i64,
}

/// Business fields of a snippet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetData {
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Server id of the containing folder, if any (and if synced).
    pub folder_id: Option<String>,
    /// Soft-delete flag (0 or 1); trashed snippets still sync.
    pub is_deleted: i64,
    /// Favorites flag (0 or 1).
    pub is_favorites: i64,
    /// Creation timestamp, milliseconds since epoch.
    pub created_at: i64,
    /// Last modification timestamp, milliseconds since epoch.
    pub updated_at: i64,
}

/// Business fields of a snippet content (fragment) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetContentData {
    /// Server id of the owning snippet, if synced.
    pub snippet_id: Option<String>,
    /// Fragment label.
    pub label: Option<String>,
    /// Fragment body.
    pub value: Option<String>,
    /// Syntax-highlighting language.
    pub language: Option<String>,
    /// Creation timestamp, milliseconds since epoch.
    pub created_at: i64,
    /// Last modification timestamp, milliseconds since epoch.
    pub updated_at: i64,
}

/// Business fields of a tag row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagData {
    /// Tag name, unique locally.
    pub name: String,
    /// Creation timestamp, milliseconds since epoch.
    pub created_at: i64,
    /// Last modification timestamp, milliseconds since epoch.
    pub updated_at: i64,
}

/// A record pulled from the server: server id + version + business fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulledRecord<T> {
    /// Server-assigned identifier.
    pub id: String,
    /// Monotonic version counter assigned by the server.
    #[serde(default = "default_version")]
    pub server_version: i64,
    /// Business fields.
    #[serde(flatten)]
    pub data: T,
}

fn default_version() -> i64 {
    1
}

/// A snippet-tag association pulled from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulledLink {
    /// Server id of the snippet.
    pub snippet_id: String,
    /// Server id of the tag.
    pub tag_id: String,
    /// Creation timestamp, milliseconds since epoch.
    pub created_at: i64,
}
