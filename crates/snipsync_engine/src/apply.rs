//! Application of pulled payloads to the local store.
//!
//! One pull, one transaction. Tables apply in dependency order (folders,
//! tags, snippets, contents, links, deletions) so each step only references
//! rows established by an earlier one. Folder parent references may point
//! forward within the same batch and are resolved in a second pass.

use crate::engine::TableCounts;
use crate::error::SyncResult;
use crate::resolver::{self, Resolution};
use rusqlite::Connection;
use snipsync_protocol::{
    FolderData, PullResponse, PulledRecord, SnippetContentData, SnippetData, SyncTable, TagData,
};
use snipsync_store::{
    mapping, rows, FolderRow, SnippetContentRow, SnippetRow, Store, StoreResult, TagRow,
};
use tracing::{debug, warn};

/// What one pull application changed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Rows inserted or updated, per table.
    pub pulled: TableCounts,
    /// Tombstones applied locally.
    pub deletions_applied: usize,
}

/// Applies a pull payload inside a single transaction.
pub fn apply_pull(store: &Store, response: &PullResponse) -> SyncResult<PullOutcome> {
    let outcome = store.transaction(|txn| apply_response(txn, response))?;
    debug!(
        applied = outcome.pulled.total(),
        deletions = outcome.deletions_applied,
        "applied pull payload"
    );
    Ok(outcome)
}

/// Applies a pull payload on an open transaction.
///
/// Split out so a full-snapshot apply can run after a store reset in the
/// same transaction.
pub(crate) fn apply_response(
    conn: &Connection,
    response: &PullResponse,
) -> StoreResult<PullOutcome> {
    let mut outcome = PullOutcome::default();
    let changes = &response.changes;

    apply_folders(conn, &changes.folders, &mut outcome.pulled.folders)?;
    apply_tags(conn, &changes.tags, &mut outcome.pulled.tags)?;
    apply_snippets(conn, &changes.snippets, &mut outcome.pulled.snippets)?;
    apply_contents(
        conn,
        &changes.snippet_contents,
        &mut outcome.pulled.snippet_contents,
    )?;
    apply_links(conn, &changes.snippet_tags, &mut outcome.pulled.snippet_tags)?;
    outcome.deletions_applied = apply_deletions(conn, response)?;

    Ok(outcome)
}

/// Upserts one pulled record through the version gate.
///
/// Returns the row's local id when the record was applied, `None` when it
/// was discarded as stale. A mapping whose row has vanished is repaired by
/// reinserting under a fresh local id.
fn upsert_record(
    conn: &Connection,
    table: SyncTable,
    server_id: &str,
    incoming_version: i64,
    insert: impl FnOnce(&Connection) -> StoreResult<i64>,
    update: impl FnOnce(&Connection, i64) -> StoreResult<()>,
) -> StoreResult<Option<i64>> {
    let local = mapping::get_local_id(conn, table, server_id)?;
    let stored = match local {
        Some(local_id) => rows::server_version(conn, table, local_id)?,
        None => None,
    };

    match (local, resolver::resolve(stored, incoming_version)) {
        (_, Resolution::Skip) => {
            debug!(%table, server_id, incoming_version, "stale record discarded");
            Ok(None)
        }
        (Some(local_id), _) if stored.is_some() => {
            update(conn, local_id)?;
            Ok(Some(local_id))
        }
        (stale, _) => {
            if stale.is_some() {
                // The mapped row is gone; drop the mapping with it.
                mapping::delete_mapping(conn, table, server_id)?;
            }
            let local_id = insert(conn)?;
            mapping::save_mapping(conn, table, local_id, server_id)?;
            Ok(Some(local_id))
        }
    }
}

fn apply_folders(
    conn: &Connection,
    records: &[PulledRecord<FolderData>],
    count: &mut usize,
) -> StoreResult<()> {
    let mut deferred: Vec<(i64, String)> = Vec::new();

    for record in records {
        let parent_local = match record.data.parent_id.as_deref() {
            Some(parent) => mapping::get_local_id(conn, SyncTable::Folders, parent)?,
            None => None,
        };
        let row = folder_row(&record.data, parent_local, record.server_version);

        let applied = upsert_record(
            conn,
            SyncTable::Folders,
            &record.id,
            record.server_version,
            |conn| rows::insert_folder(conn, &row),
            |conn, local_id| rows::update_folder(conn, local_id, &row),
        )?;

        if let Some(local_id) = applied {
            *count += 1;
            if let (Some(parent), None) = (record.data.parent_id.as_deref(), parent_local) {
                deferred.push((local_id, parent.to_string()));
            }
        }
    }

    // Second pass: parents that appeared later in the same batch.
    for (local_id, parent_server_id) in deferred {
        match mapping::get_local_id(conn, SyncTable::Folders, &parent_server_id)? {
            Some(parent_local) => rows::set_folder_parent(conn, local_id, Some(parent_local))?,
            None => debug!(
                local_id,
                parent_server_id, "folder parent never arrived, left at root"
            ),
        }
    }
    Ok(())
}

fn apply_tags(
    conn: &Connection,
    records: &[PulledRecord<TagData>],
    count: &mut usize,
) -> StoreResult<()> {
    for record in records {
        let row = tag_row(&record.data, record.server_version);
        let applied = upsert_record(
            conn,
            SyncTable::Tags,
            &record.id,
            record.server_version,
            |conn| rows::insert_tag(conn, &row),
            |conn, local_id| rows::update_tag(conn, local_id, &row),
        )?;
        if applied.is_some() {
            *count += 1;
        }
    }
    Ok(())
}

fn apply_snippets(
    conn: &Connection,
    records: &[PulledRecord<SnippetData>],
    count: &mut usize,
) -> StoreResult<()> {
    for record in records {
        let folder_local = match record.data.folder_id.as_deref() {
            Some(folder) => {
                let local = mapping::get_local_id(conn, SyncTable::Folders, folder)?;
                if local.is_none() {
                    debug!(
                        snippet = %record.id,
                        folder, "snippet folder has no local mapping, filed at root"
                    );
                }
                local
            }
            None => None,
        };
        let row = snippet_row(&record.data, folder_local, record.server_version);

        let applied = upsert_record(
            conn,
            SyncTable::Snippets,
            &record.id,
            record.server_version,
            |conn| rows::insert_snippet(conn, &row),
            |conn, local_id| rows::update_snippet(conn, local_id, &row),
        )?;
        if applied.is_some() {
            *count += 1;
        }
    }
    Ok(())
}

fn apply_contents(
    conn: &Connection,
    records: &[PulledRecord<SnippetContentData>],
    count: &mut usize,
) -> StoreResult<()> {
    for record in records {
        // A fragment without a resolvable owner is dropped; the rest of the
        // batch still applies.
        let Some(snippet_server_id) = record.data.snippet_id.as_deref() else {
            debug!(content = %record.id, "content without owner, dropped");
            continue;
        };
        let Some(snippet_local) =
            mapping::get_local_id(conn, SyncTable::Snippets, snippet_server_id)?
        else {
            debug!(
                content = %record.id,
                snippet = snippet_server_id, "content owner has no local mapping, dropped"
            );
            continue;
        };
        let row = content_row(&record.data, snippet_local, record.server_version);

        let applied = upsert_record(
            conn,
            SyncTable::SnippetContents,
            &record.id,
            record.server_version,
            |conn| rows::insert_content(conn, &row),
            |conn, local_id| rows::update_content(conn, local_id, &row),
        )?;
        if applied.is_some() {
            *count += 1;
        }
    }
    Ok(())
}

fn apply_links(
    conn: &Connection,
    links: &[snipsync_protocol::PulledLink],
    count: &mut usize,
) -> StoreResult<()> {
    for link in links {
        let snippet = mapping::get_local_id(conn, SyncTable::Snippets, &link.snippet_id)?;
        let tag = mapping::get_local_id(conn, SyncTable::Tags, &link.tag_id)?;
        let (Some(snippet_local), Some(tag_local)) = (snippet, tag) else {
            debug!(
                snippet = %link.snippet_id,
                tag = %link.tag_id,
                "link endpoint has no local mapping, dropped"
            );
            continue;
        };
        rows::upsert_link(conn, snippet_local, tag_local)?;
        *count += 1;
    }
    Ok(())
}

fn apply_deletions(conn: &Connection, response: &PullResponse) -> StoreResult<usize> {
    let mut deleted = 0;
    for deletion in &response.deletions {
        let Some(table) = deletion.table() else {
            warn!(
                table = %deletion.table_name,
                record = %deletion.record_id,
                "deletion for unknown table, skipping"
            );
            continue;
        };
        let Some(local_id) = mapping::get_local_id(conn, table, &deletion.record_id)? else {
            debug!(%table, record = %deletion.record_id, "deletion of unmapped record, nothing to do");
            continue;
        };

        match table {
            SyncTable::Folders => rows::delete_folder_row(conn, local_id)?,
            SyncTable::Tags => rows::delete_tag_cascade(conn, local_id)?,
            SyncTable::Snippets => rows::delete_snippet_cascade(conn, local_id)?,
            SyncTable::SnippetContents => rows::delete_content_row(conn, local_id)?,
            SyncTable::SnippetTags => continue,
        }
        mapping::delete_mapping(conn, table, &deletion.record_id)?;
        deleted += 1;
    }
    Ok(deleted)
}

fn folder_row(data: &FolderData, parent_id: Option<i64>, server_version: i64) -> FolderRow {
    FolderRow {
        id: 0,
        name: data.name.clone(),
        default_language: data.default_language.clone(),
        parent_id,
        is_open: data.is_open,
        order_index: data.order_index,
        icon: data.icon.clone(),
        created_at: data.created_at,
        updated_at: data.updated_at,
        server_version,
    }
}

fn snippet_row(data: &SnippetData, folder_id: Option<i64>, server_version: i64) -> SnippetRow {
    SnippetRow {
        id: 0,
        name: data.name.clone(),
        description: data.description.clone(),
        folder_id,
        is_deleted: data.is_deleted,
        is_favorites: data.is_favorites,
        created_at: data.created_at,
        updated_at: data.updated_at,
        server_version,
    }
}

fn content_row(
    data: &SnippetContentData,
    snippet_id: i64,
    server_version: i64,
) -> SnippetContentRow {
    SnippetContentRow {
        id: 0,
        snippet_id,
        label: data.label.clone(),
        value: data.value.clone(),
        language: data.language.clone(),
        created_at: data.created_at,
        updated_at: data.updated_at,
        server_version,
    }
}

fn tag_row(data: &TagData, server_version: i64) -> TagRow {
    TagRow {
        id: 0,
        name: data.name.clone(),
        created_at: data.created_at,
        updated_at: data.updated_at,
        server_version,
    }
}
