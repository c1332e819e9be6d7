//! Row-level access to the synchronized tables.
//!
//! These helpers take a plain connection so they compose inside
//! [`crate::Store::transaction`] as well as standalone reads. Identity
//! translation between local and server ids is the engine's job; everything
//! here speaks local ids only.

use crate::error::StoreResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use snipsync_protocol::SyncTable;

/// A row of the `folders` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRow {
    /// Local row id (ignored on insert).
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Default language for new snippets.
    pub default_language: String,
    /// Local id of the parent folder.
    pub parent_id: Option<i64>,
    /// Sidebar expansion flag (0 or 1).
    pub is_open: i64,
    /// Manual sort position.
    pub order_index: i64,
    /// Optional icon identifier.
    pub icon: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last modification timestamp.
    pub updated_at: i64,
    /// Version counter of the last applied server copy.
    pub server_version: i64,
}

/// A row of the `snippets` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRow {
    /// Local row id (ignored on insert).
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Local id of the containing folder.
    pub folder_id: Option<i64>,
    /// Soft-delete flag (0 or 1).
    pub is_deleted: i64,
    /// Favorites flag (0 or 1).
    pub is_favorites: i64,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last modification timestamp.
    pub updated_at: i64,
    /// Version counter of the last applied server copy.
    pub server_version: i64,
}

/// A row of the `snippet_contents` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetContentRow {
    /// Local row id (ignored on insert).
    pub id: i64,
    /// Local id of the owning snippet.
    pub snippet_id: i64,
    /// Fragment label.
    pub label: Option<String>,
    /// Fragment body.
    pub value: Option<String>,
    /// Syntax-highlighting language.
    pub language: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last modification timestamp.
    pub updated_at: i64,
    /// Version counter of the last applied server copy.
    pub server_version: i64,
}

/// A row of the `tags` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    /// Local row id (ignored on insert).
    pub id: i64,
    /// Tag name, unique locally.
    pub name: String,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last modification timestamp.
    pub updated_at: i64,
    /// Version counter of the last applied server copy.
    pub server_version: i64,
}

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<FolderRow> {
    Ok(FolderRow {
        id: row.get(0)?,
        name: row.get(1)?,
        default_language: row.get(2)?,
        parent_id: row.get(3)?,
        is_open: row.get(4)?,
        order_index: row.get(5)?,
        icon: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        server_version: row.get(9)?,
    })
}

fn snippet_from_row(row: &Row<'_>) -> rusqlite::Result<SnippetRow> {
    Ok(SnippetRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        folder_id: row.get(3)?,
        is_deleted: row.get(4)?,
        is_favorites: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        server_version: row.get(8)?,
    })
}

fn content_from_row(row: &Row<'_>) -> rusqlite::Result<SnippetContentRow> {
    Ok(SnippetContentRow {
        id: row.get(0)?,
        snippet_id: row.get(1)?,
        label: row.get(2)?,
        value: row.get(3)?,
        language: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        server_version: row.get(7)?,
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<TagRow> {
    Ok(TagRow {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
        server_version: row.get(4)?,
    })
}

const FOLDER_COLS: &str =
    "id, name, default_language, parent_id, is_open, order_index, icon, created_at, updated_at, \
     server_version";
const SNIPPET_COLS: &str =
    "id, name, description, folder_id, is_deleted, is_favorites, created_at, updated_at, \
     server_version";
const CONTENT_COLS: &str =
    "id, snippet_id, label, value, language, created_at, updated_at, server_version";
const TAG_COLS: &str = "id, name, created_at, updated_at, server_version";

/// Inserts a folder, returning its local id.
pub fn insert_folder(conn: &Connection, folder: &FolderRow) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO folders (name, default_language, parent_id, is_open, order_index, icon, \
         created_at, updated_at, server_version) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            folder.name,
            folder.default_language,
            folder.parent_id,
            folder.is_open,
            folder.order_index,
            folder.icon,
            folder.created_at,
            folder.updated_at,
            folder.server_version,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites a folder row in place.
pub fn update_folder(conn: &Connection, id: i64, folder: &FolderRow) -> StoreResult<()> {
    conn.execute(
        "UPDATE folders SET name = ?1, default_language = ?2, parent_id = ?3, is_open = ?4, \
         order_index = ?5, icon = ?6, created_at = ?7, updated_at = ?8, server_version = ?9 \
         WHERE id = ?10",
        params![
            folder.name,
            folder.default_language,
            folder.parent_id,
            folder.is_open,
            folder.order_index,
            folder.icon,
            folder.created_at,
            folder.updated_at,
            folder.server_version,
            id,
        ],
    )?;
    Ok(())
}

/// Repoints a folder's parent reference.
pub fn set_folder_parent(conn: &Connection, id: i64, parent_id: Option<i64>) -> StoreResult<()> {
    conn.execute(
        "UPDATE folders SET parent_id = ?1 WHERE id = ?2",
        params![parent_id, id],
    )?;
    Ok(())
}

/// Folders modified after the given timestamp.
pub fn folders_changed_since(conn: &Connection, since: i64) -> StoreResult<Vec<FolderRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FOLDER_COLS} FROM folders WHERE updated_at > ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map([since], |row| folder_from_row(row))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Inserts a snippet, returning its local id.
pub fn insert_snippet(conn: &Connection, snippet: &SnippetRow) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO snippets (name, description, folder_id, is_deleted, is_favorites, \
         created_at, updated_at, server_version) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            snippet.name,
            snippet.description,
            snippet.folder_id,
            snippet.is_deleted,
            snippet.is_favorites,
            snippet.created_at,
            snippet.updated_at,
            snippet.server_version,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites a snippet row in place.
pub fn update_snippet(conn: &Connection, id: i64, snippet: &SnippetRow) -> StoreResult<()> {
    conn.execute(
        "UPDATE snippets SET name = ?1, description = ?2, folder_id = ?3, is_deleted = ?4, \
         is_favorites = ?5, created_at = ?6, updated_at = ?7, server_version = ?8 WHERE id = ?9",
        params![
            snippet.name,
            snippet.description,
            snippet.folder_id,
            snippet.is_deleted,
            snippet.is_favorites,
            snippet.created_at,
            snippet.updated_at,
            snippet.server_version,
            id,
        ],
    )?;
    Ok(())
}

/// Snippets modified after the given timestamp.
pub fn snippets_changed_since(conn: &Connection, since: i64) -> StoreResult<Vec<SnippetRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SNIPPET_COLS} FROM snippets WHERE updated_at > ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map([since], |row| snippet_from_row(row))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Inserts a snippet content fragment, returning its local id.
pub fn insert_content(conn: &Connection, content: &SnippetContentRow) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO snippet_contents (snippet_id, label, value, language, created_at, \
         updated_at, server_version) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            content.snippet_id,
            content.label,
            content.value,
            content.language,
            content.created_at,
            content.updated_at,
            content.server_version,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites a content row in place.
pub fn update_content(conn: &Connection, id: i64, content: &SnippetContentRow) -> StoreResult<()> {
    conn.execute(
        "UPDATE snippet_contents SET snippet_id = ?1, label = ?2, value = ?3, language = ?4, \
         created_at = ?5, updated_at = ?6, server_version = ?7 WHERE id = ?8",
        params![
            content.snippet_id,
            content.label,
            content.value,
            content.language,
            content.created_at,
            content.updated_at,
            content.server_version,
            id,
        ],
    )?;
    Ok(())
}

/// Content fragments modified after the given timestamp.
pub fn contents_changed_since(
    conn: &Connection,
    since: i64,
) -> StoreResult<Vec<SnippetContentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTENT_COLS} FROM snippet_contents WHERE updated_at > ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map([since], |row| content_from_row(row))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Inserts a tag, returning its local id.
pub fn insert_tag(conn: &Connection, tag: &TagRow) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO tags (name, created_at, updated_at, server_version) \
         VALUES (?1, ?2, ?3, ?4)",
        params![tag.name, tag.created_at, tag.updated_at, tag.server_version],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites a tag row in place.
pub fn update_tag(conn: &Connection, id: i64, tag: &TagRow) -> StoreResult<()> {
    conn.execute(
        "UPDATE tags SET name = ?1, created_at = ?2, updated_at = ?3, server_version = ?4 \
         WHERE id = ?5",
        params![tag.name, tag.created_at, tag.updated_at, tag.server_version, id],
    )?;
    Ok(())
}

/// Tags modified after the given timestamp.
pub fn tags_changed_since(conn: &Connection, since: i64) -> StoreResult<Vec<TagRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TAG_COLS} FROM tags WHERE updated_at > ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map([since], |row| tag_from_row(row))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Local ids of tags linked to a snippet.
pub fn tag_ids_for_snippet(conn: &Connection, snippet_id: i64) -> StoreResult<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT tag_id FROM snippet_tags WHERE snippet_id = ?1 ORDER BY tag_id")?;
    let rows = stmt.query_map([snippet_id], |row| row.get(0))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Creates a snippet-tag link if it does not already exist.
pub fn upsert_link(conn: &Connection, snippet_id: i64, tag_id: i64) -> StoreResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO snippet_tags (snippet_id, tag_id) VALUES (?1, ?2)",
        params![snippet_id, tag_id],
    )?;
    Ok(())
}

/// Reads the stored server version for a row, if the row exists.
pub fn server_version(
    conn: &Connection,
    table: SyncTable,
    local_id: i64,
) -> StoreResult<Option<i64>> {
    debug_assert!(table != SyncTable::SnippetTags);
    let version = conn
        .query_row(
            &format!("SELECT server_version FROM {} WHERE id = ?1", table.as_str()),
            [local_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}

/// Deletes a folder row. Children are handled by their own tombstones.
pub fn delete_folder_row(conn: &Connection, id: i64) -> StoreResult<()> {
    conn.execute("DELETE FROM folders WHERE id = ?1", [id])?;
    Ok(())
}

/// Deletes a tag and every link referencing it.
pub fn delete_tag_cascade(conn: &Connection, id: i64) -> StoreResult<()> {
    conn.execute("DELETE FROM snippet_tags WHERE tag_id = ?1", [id])?;
    conn.execute("DELETE FROM tags WHERE id = ?1", [id])?;
    Ok(())
}

/// Deletes a snippet, its links and its content fragments.
pub fn delete_snippet_cascade(conn: &Connection, id: i64) -> StoreResult<()> {
    conn.execute("DELETE FROM snippet_tags WHERE snippet_id = ?1", [id])?;
    conn.execute("DELETE FROM snippet_contents WHERE snippet_id = ?1", [id])?;
    conn.execute("DELETE FROM snippets WHERE id = ?1", [id])?;
    Ok(())
}

/// Deletes a single content fragment row.
pub fn delete_content_row(conn: &Connection, id: i64) -> StoreResult<()> {
    conn.execute("DELETE FROM snippet_contents WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    fn folder(name: &str, updated_at: i64) -> FolderRow {
        FolderRow {
            id: 0,
            name: name.into(),
            default_language: "rust".into(),
            parent_id: None,
            is_open: 0,
            order_index: 0,
            icon: None,
            created_at: updated_at,
            updated_at,
            server_version: 1,
        }
    }

    fn snippet(name: &str, folder_id: Option<i64>, updated_at: i64) -> SnippetRow {
        SnippetRow {
            id: 0,
            name: name.into(),
            description: None,
            folder_id,
            is_deleted: 0,
            is_favorites: 0,
            created_at: updated_at,
            updated_at,
            server_version: 1,
        }
    }

    fn tag(name: &str, updated_at: i64) -> TagRow {
        TagRow {
            id: 0,
            name: name.into(),
            created_at: updated_at,
            updated_at,
            server_version: 1,
        }
    }

    #[test]
    fn changed_since_is_strictly_greater() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                insert_folder(conn, &folder("old", 50))?;
                insert_folder(conn, &folder("edge", 100))?;
                insert_folder(conn, &folder("new", 150))?;

                let changed = folders_changed_since(conn, 100)?;
                assert_eq!(changed.len(), 1);
                assert_eq!(changed[0].name, "new");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn update_folder_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let id = insert_folder(conn, &folder("a", 10))?;
                let mut updated = folder("b", 20);
                updated.server_version = 4;
                update_folder(conn, id, &updated)?;

                let rows = folders_changed_since(conn, 0)?;
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].name, "b");
                assert_eq!(rows[0].server_version, 4);
                assert_eq!(server_version(conn, SyncTable::Folders, id)?, Some(4));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn snippet_cascade_removes_links_and_contents() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let folder_id = insert_folder(conn, &folder("f", 10))?;
                let snippet_id = insert_snippet(conn, &snippet("s", Some(folder_id), 10))?;
                let tag_id = insert_tag(conn, &tag("t", 10))?;
                upsert_link(conn, snippet_id, tag_id)?;
                insert_content(
                    conn,
                    &SnippetContentRow {
                        id: 0,
                        snippet_id,
                        label: Some("main".into()),
                        value: Some("fn main() {}".into()),
                        language: Some("rust".into()),
                        created_at: 10,
                        updated_at: 10,
                        server_version: 1,
                    },
                )?;

                delete_snippet_cascade(conn, snippet_id)?;

                let links: i64 =
                    conn.query_row("SELECT COUNT(*) FROM snippet_tags", [], |row| row.get(0))?;
                let contents: i64 = conn.query_row("SELECT COUNT(*) FROM snippet_contents", [], |row| {
                    row.get(0)
                })?;
                let snippets: i64 =
                    conn.query_row("SELECT COUNT(*) FROM snippets", [], |row| row.get(0))?;
                assert_eq!((links, contents, snippets), (0, 0, 0));

                // The tag itself survives
                assert_eq!(tags_changed_since(conn, 0)?.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn tag_cascade_keeps_snippet() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let snippet_id = insert_snippet(conn, &snippet("s", None, 10))?;
                let tag_id = insert_tag(conn, &tag("t", 10))?;
                upsert_link(conn, snippet_id, tag_id)?;

                delete_tag_cascade(conn, tag_id)?;

                assert!(tag_ids_for_snippet(conn, snippet_id)?.is_empty());
                assert_eq!(snippets_changed_since(conn, 0)?.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn link_upsert_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let snippet_id = insert_snippet(conn, &snippet("s", None, 10))?;
                let tag_id = insert_tag(conn, &tag("t", 10))?;
                upsert_link(conn, snippet_id, tag_id)?;
                upsert_link(conn, snippet_id, tag_id)?;

                assert_eq!(tag_ids_for_snippet(conn, snippet_id)?, vec![tag_id]);
                Ok(())
            })
            .unwrap();
    }
}
