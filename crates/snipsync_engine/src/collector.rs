//! Local change collection.
//!
//! Builds a self-contained push payload from the store. Pure read: no
//! mapping, tombstone or row is modified here, so a failed push leaves
//! nothing to undo.

use crate::error::SyncResult;
use rusqlite::Connection;
use snipsync_protocol::{
    FolderData, PushChangeItem, PushChanges, PushLinkItem, PushRequest, SnippetContentData,
    SnippetData, SyncTable, TagData,
};
use snipsync_store::{deletions, mapping, rows, Store, StoreResult};
use tracing::debug;

/// Collects every local change made after `last_sync_at`.
///
/// A row without a mapping is marked `is_new`; foreign keys are translated
/// to server ids, falling back to `None` when the referenced parent has no
/// mapping yet. Snippet-tag links are derived from the changed snippets and
/// included only when both endpoints already have server ids.
pub fn collect_local_changes(store: &Store, last_sync_at: i64) -> SyncResult<PushRequest> {
    let request = store.with_conn(|conn| collect(conn, last_sync_at))?;
    debug!(
        folders = request.changes.folders.len(),
        snippets = request.changes.snippets.len(),
        contents = request.changes.snippet_contents.len(),
        tags = request.changes.tags.len(),
        links = request.changes.snippet_tags.len(),
        deletions = request.deletions.len(),
        "collected local changes"
    );
    Ok(request)
}

fn collect(conn: &Connection, last_sync_at: i64) -> StoreResult<PushRequest> {
    let mut changes = PushChanges::default();

    for folder in rows::folders_changed_since(conn, last_sync_at)? {
        let server_id = mapping::get_server_id(conn, SyncTable::Folders, folder.id)?;
        let parent_id = translate_fk(conn, SyncTable::Folders, folder.parent_id)?;
        changes.folders.push(PushChangeItem {
            is_new: server_id.is_none(),
            local_id: folder.id,
            server_id,
            data: FolderData {
                name: folder.name,
                default_language: folder.default_language,
                parent_id,
                is_open: folder.is_open,
                order_index: folder.order_index,
                icon: folder.icon,
                created_at: folder.created_at,
                updated_at: folder.updated_at,
            },
        });
    }

    let snippets = rows::snippets_changed_since(conn, last_sync_at)?;
    for snippet in &snippets {
        let Some(snippet_server_id) = mapping::get_server_id(conn, SyncTable::Snippets, snippet.id)?
        else {
            // Links for a brand-new snippet go out on the next cycle, once
            // the snippet has a server id.
            continue;
        };
        for tag_id in rows::tag_ids_for_snippet(conn, snippet.id)? {
            let Some(tag_server_id) = mapping::get_server_id(conn, SyncTable::Tags, tag_id)? else {
                continue;
            };
            changes.snippet_tags.push(PushLinkItem {
                snippet_server_id: snippet_server_id.clone(),
                tag_server_id,
                is_new: true,
                created_at: snippet.updated_at,
            });
        }
    }

    for snippet in snippets {
        let server_id = mapping::get_server_id(conn, SyncTable::Snippets, snippet.id)?;
        let folder_id = translate_fk(conn, SyncTable::Folders, snippet.folder_id)?;
        changes.snippets.push(PushChangeItem {
            is_new: server_id.is_none(),
            local_id: snippet.id,
            server_id,
            data: SnippetData {
                name: snippet.name,
                description: snippet.description,
                folder_id,
                is_deleted: snippet.is_deleted,
                is_favorites: snippet.is_favorites,
                created_at: snippet.created_at,
                updated_at: snippet.updated_at,
            },
        });
    }

    for content in rows::contents_changed_since(conn, last_sync_at)? {
        let server_id = mapping::get_server_id(conn, SyncTable::SnippetContents, content.id)?;
        let snippet_id = translate_fk(conn, SyncTable::Snippets, Some(content.snippet_id))?;
        changes.snippet_contents.push(PushChangeItem {
            is_new: server_id.is_none(),
            local_id: content.id,
            server_id,
            data: SnippetContentData {
                snippet_id,
                label: content.label,
                value: content.value,
                language: content.language,
                created_at: content.created_at,
                updated_at: content.updated_at,
            },
        });
    }

    for tag in rows::tags_changed_since(conn, last_sync_at)? {
        let server_id = mapping::get_server_id(conn, SyncTable::Tags, tag.id)?;
        changes.tags.push(PushChangeItem {
            is_new: server_id.is_none(),
            local_id: tag.id,
            server_id,
            data: TagData {
                name: tag.name,
                created_at: tag.created_at,
                updated_at: tag.updated_at,
            },
        });
    }

    let deletions = deletions::unsynced(conn)?
        .iter()
        .map(|row| row.to_wire())
        .collect();

    Ok(PushRequest { changes, deletions })
}

fn translate_fk(
    conn: &Connection,
    table: SyncTable,
    local_id: Option<i64>,
) -> StoreResult<Option<String>> {
    match local_id {
        Some(id) => mapping::get_server_id(conn, table, id),
        None => Ok(None),
    }
}
