//! Conflict resolution for pulled records.
//!
//! Identity comes from the mapping table; staleness from the per-row
//! version counter. A record only ever moves forward.

/// What to do with one pulled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No local copy exists; insert it.
    Insert,
    /// The local copy is older; overwrite it.
    Update,
    /// The local copy is at least as new; leave it alone.
    Skip,
}

/// Decides the fate of a pulled record given the locally stored version.
///
/// `local_version` is `None` when the record has no mapping (or the mapped
/// row is gone), which always means insert. Equal versions skip, so
/// replaying the same pull is a no-op.
pub fn resolve(local_version: Option<i64>, incoming_version: i64) -> Resolution {
    match local_version {
        None => Resolution::Insert,
        Some(local) if incoming_version > local => Resolution::Update,
        Some(_) => Resolution::Skip,
    }
}
