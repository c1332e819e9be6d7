//! Push, pull and ping messages.

use crate::records::{
    FolderData, PulledLink, PulledRecord, SnippetContentData, SnippetData, TagData,
};
use crate::tables::SyncTable;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A locally changed row in a push payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushChangeItem<T> {
    /// The row's server id, if it has been synced before.
    pub server_id: Option<String>,
    /// The row's local integer id, echoed back in the ack's id mappings.
    pub local_id: i64,
    /// True when the server has never seen this row.
    pub is_new: bool,
    /// Business fields.
    pub data: T,
}

/// A snippet-tag association in a push payload.
///
/// Links are derived from changed snippets and only included when both
/// sides already have server ids, so they carry no local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushLinkItem {
    /// Server id of the snippet.
    pub snippet_server_id: String,
    /// Server id of the tag.
    pub tag_server_id: String,
    /// Always true; the server upserts links idempotently.
    pub is_new: bool,
    /// Creation timestamp, taken from the owning snippet's update time.
    pub created_at: i64,
}

/// Per-table change arrays of a push payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushChanges {
    /// Changed folders.
    pub folders: Vec<PushChangeItem<FolderData>>,
    /// Changed snippets.
    pub snippets: Vec<PushChangeItem<SnippetData>>,
    /// Changed snippet contents.
    pub snippet_contents: Vec<PushChangeItem<SnippetContentData>>,
    /// Changed tags.
    pub tags: Vec<PushChangeItem<TagData>>,
    /// Snippet-tag associations derived from changed snippets.
    pub snippet_tags: Vec<PushLinkItem>,
}

/// A push request: everything the server needs, self-contained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Per-table change arrays.
    pub changes: PushChanges,
    /// Unsynced local deletions.
    pub deletions: Vec<SyncDeletionData>,
}

impl PushRequest {
    /// Returns true when there is nothing to send.
    pub fn is_empty(&self) -> bool {
        let c = &self.changes;
        c.folders.is_empty()
            && c.snippets.is_empty()
            && c.snippet_contents.is_empty()
            && c.tags.is_empty()
            && c.snippet_tags.is_empty()
            && self.deletions.is_empty()
    }
}

/// A server-assigned identity for a pushed local row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdMapping {
    /// The logical table.
    pub table_name: SyncTable,
    /// The local row id that was pushed.
    pub local_id: i64,
    /// The server id assigned to it.
    pub server_id: String,
}

/// The server's acknowledgement of a push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// Server clock at acknowledgement, milliseconds since epoch.
    pub server_time: i64,
    /// New identities for rows pushed with `is_new = true`.
    pub id_mappings: Vec<IdMapping>,
}

/// A pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    /// Client high-water mark; the server returns changes after this.
    pub last_sync_at: i64,
}

/// Per-table change arrays of a pull payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullChanges {
    /// Remote folders.
    pub folders: Vec<PulledRecord<FolderData>>,
    /// Remote snippets.
    pub snippets: Vec<PulledRecord<SnippetData>>,
    /// Remote snippet contents.
    pub snippet_contents: Vec<PulledRecord<SnippetContentData>>,
    /// Remote tags.
    pub tags: Vec<PulledRecord<TagData>>,
    /// Remote snippet-tag associations.
    pub snippet_tags: Vec<PulledLink>,
}

/// The server's answer to a pull or full-sync request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Server clock at response time, the client's next high-water mark.
    #[serde(default)]
    pub server_time: i64,
    /// Per-table change arrays.
    #[serde(default)]
    pub changes: PullChanges,
    /// Remote tombstones to propagate locally.
    #[serde(default)]
    pub deletions: Vec<SyncDeletionData>,
}

/// A tombstone on the wire, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDeletionData {
    /// Table the deleted row belonged to. Left as a string so an unknown
    /// table from a newer server skips one record instead of failing the
    /// whole payload.
    pub table_name: String,
    /// Server id of the deleted row.
    pub record_id: String,
    /// Deletion timestamp, milliseconds since epoch.
    pub deleted_at: i64,
}

impl SyncDeletionData {
    /// Resolves the table name against the sync registry.
    pub fn table(&self) -> Option<SyncTable> {
        SyncTable::from_str(&self.table_name).ok()
    }
}

/// The `/api/sync/ping` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    /// Server clock, milliseconds since epoch.
    pub server_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_push_request() {
        let request = PushRequest::default();
        assert!(request.is_empty());

        let request = PushRequest {
            deletions: vec![SyncDeletionData {
                table_name: "folders".into(),
                record_id: "f1".into(),
                deleted_at: 5,
            }],
            ..Default::default()
        };
        assert!(!request.is_empty());
    }

    #[test]
    fn push_item_wire_shape() {
        let item = PushChangeItem {
            server_id: None,
            local_id: 7,
            is_new: true,
            data: TagData {
                name: "cli".into(),
                created_at: 1,
                updated_at: 2,
            },
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["serverId"], serde_json::Value::Null);
        assert_eq!(json["localId"], 7);
        assert_eq!(json["isNew"], true);
        assert_eq!(json["data"]["name"], "cli");
    }

    #[test]
    fn push_response_decodes_mappings() {
        let json = r#"{
            "serverTime": 1000,
            "idMappings": [
                {"tableName": "folders", "localId": 1, "serverId": "f1"},
                {"tableName": "snippet_contents", "localId": 3, "serverId": "c9"}
            ]
        }"#;

        let response: PushResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.server_time, 1000);
        assert_eq!(response.id_mappings.len(), 2);
        assert_eq!(response.id_mappings[0].table_name, SyncTable::Folders);
        assert_eq!(response.id_mappings[1].server_id, "c9");
    }

    #[test]
    fn pull_response_tolerates_missing_sections() {
        let response: PullResponse = serde_json::from_str(r#"{"serverTime": 42}"#).unwrap();
        assert_eq!(response.server_time, 42);
        assert!(response.changes.folders.is_empty());
        assert!(response.deletions.is_empty());
    }

    #[test]
    fn deletion_table_resolution() {
        let deletion = SyncDeletionData {
            table_name: "tags".into(),
            record_id: "t1".into(),
            deleted_at: 9,
        };
        assert_eq!(deletion.table(), Some(SyncTable::Tags));

        let unknown = SyncDeletionData {
            table_name: "workspaces".into(),
            record_id: "w1".into(),
            deleted_at: 9,
        };
        assert_eq!(unknown.table(), None);
    }
}
