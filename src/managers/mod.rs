// arc2zen destination managers
// Managers own the rows they write: workspaces, pinned items, bookmarks and places,
// container identities and the session file.

pub mod bookmark_manager;
pub mod container_manager;
pub mod pin_manager;
pub mod session_manager;
pub mod workspace_manager;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::types::errors::ImportError;
use crate::types::report::SpaceOutcome;
use crate::types::tree::SpaceNode;

/// Where one space lands in the destination.
#[derive(Debug, Clone, Copy)]
pub struct SpaceTarget<'t> {
    pub workspace_uuid: &'t str,
    pub container_id: i64,
}

/// One representation of a space's folder/tab tree.
///
/// Implementors create parents before children and reuse rows that already
/// match, so writing the same space twice creates nothing the second time.
pub trait SpaceTreeWriter {
    fn write_space(
        &mut self,
        space: &SpaceNode,
        target: &SpaceTarget<'_>,
        outcome: &mut SpaceOutcome,
    ) -> Result<(), ImportError>;
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// Records `uuid` in a `*_changes` table.
pub(crate) fn record_change(
    conn: &Connection,
    table: &str,
    uuid: &str,
    timestamp: i64,
) -> Result<(), ImportError> {
    let sql = match table {
        "zen_pins_changes" => "INSERT OR REPLACE INTO zen_pins_changes (uuid, timestamp) VALUES (?1, ?2)",
        "zen_workspaces_changes" => {
            "INSERT OR REPLACE INTO zen_workspaces_changes (uuid, timestamp) VALUES (?1, ?2)"
        }
        other => return Err(ImportError::Database(format!("unknown change table: {}", other))),
    };
    conn.execute(sql, params![uuid, timestamp])?;
    Ok(())
}
