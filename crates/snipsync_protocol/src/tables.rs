//! The sync table registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A logical table participating in synchronization.
///
/// The order of [`SyncTable::APPLY_ORDER`] is the foreign-key dependency
/// order for applying pulled changes: snippets reference folders, contents
/// reference snippets, and link rows reference both snippets and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncTable {
    /// The `folders` table.
    #[serde(rename = "folders")]
    Folders,
    /// The `tags` table.
    #[serde(rename = "tags")]
    Tags,
    /// The `snippets` table.
    #[serde(rename = "snippets")]
    Snippets,
    /// The `snippet_contents` table.
    #[serde(rename = "snippet_contents")]
    SnippetContents,
    /// The `snippet_tags` association table.
    #[serde(rename = "snippet_tags")]
    SnippetTags,
}

/// Error returned when a table name is not part of the sync registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sync table: {0}")]
pub struct UnknownTable(pub String);

impl SyncTable {
    /// Fixed apply order for pulled changes, parents before children.
    pub const APPLY_ORDER: [SyncTable; 5] = [
        SyncTable::Folders,
        SyncTable::Tags,
        SyncTable::Snippets,
        SyncTable::SnippetContents,
        SyncTable::SnippetTags,
    ];

    /// Returns the SQL table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTable::Folders => "folders",
            SyncTable::Tags => "tags",
            SyncTable::Snippets => "snippets",
            SyncTable::SnippetContents => "snippet_contents",
            SyncTable::SnippetTags => "snippet_tags",
        }
    }

    /// Returns true if rows of this table can carry a tombstone.
    ///
    /// Link rows are never tombstoned individually; they die with the
    /// snippet or tag they reference.
    pub fn supports_deletion(&self) -> bool {
        !matches!(self, SyncTable::SnippetTags)
    }
}

impl FromStr for SyncTable {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folders" => Ok(SyncTable::Folders),
            "tags" => Ok(SyncTable::Tags),
            "snippets" => Ok(SyncTable::Snippets),
            "snippet_contents" => Ok(SyncTable::SnippetContents),
            "snippet_tags" => Ok(SyncTable::SnippetTags),
            other => Err(UnknownTable(other.to_string())),
        }
    }
}

impl fmt::Display for SyncTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
