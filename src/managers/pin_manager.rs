//! Pin Manager.
//!
//! Writes the pinned-tab representation of a space into `zen_pins`: folders
//! are `is_group` rows without a URL, tabs hang off them through
//! `folder_parent_uuid`.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use super::{now_millis, record_change, SpaceTarget, SpaceTreeWriter};
use crate::types::destination::{PinnedItem, PinnedTabRecord};
use crate::types::errors::ImportError;
use crate::types::report::SpaceOutcome;
use crate::types::tree::{FolderNode, SpaceEntry, SpaceNode, TabNode};

/// Trait defining pinned-item operations.
pub trait PinManagerTrait {
    /// Returns the folder uuid and whether it was created.
    fn ensure_folder(
        &mut self,
        workspace_uuid: &str,
        parent_uuid: Option<&str>,
        title: &str,
        container_id: i64,
    ) -> Result<(String, bool), ImportError>;
    /// Returns the tab uuid and whether it was created.
    fn ensure_tab(
        &mut self,
        workspace_uuid: &str,
        parent_uuid: Option<&str>,
        tab: &TabNode,
        container_id: i64,
    ) -> Result<(String, bool), ImportError>;
    fn list_pins(&self, workspace_uuid: &str) -> Result<Vec<PinnedItem>, ImportError>;
    /// Pins whose `folder_parent_uuid` points at no row.
    fn orphaned_pins(&self) -> Result<Vec<String>, ImportError>;
}

/// Pin manager backed by a SQLite connection.
pub struct PinManager<'a> {
    conn: &'a Connection,
    track_changes: bool,
    /// Next free position per `(workspace, parent)` scope.
    positions: HashMap<(String, Option<String>), i64>,
    created: HashSet<String>,
    records: Vec<PinnedTabRecord>,
}

impl<'a> PinManager<'a> {
    pub fn new(conn: &'a Connection, track_changes: bool) -> Self {
        Self {
            conn,
            track_changes,
            positions: HashMap::new(),
            created: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Uuids created through this manager.
    pub fn created_uuids(&self) -> &HashSet<String> {
        &self.created
    }

    /// Pinned tabs written (created or reused), in write order.
    pub fn into_records(self) -> Vec<PinnedTabRecord> {
        self.records
    }

    /// Takes the next position in a scope, seeding from `MAX(position) + 1`.
    fn take_position(
        &mut self,
        workspace_uuid: &str,
        parent_uuid: Option<&str>,
    ) -> Result<i64, ImportError> {
        let key = (workspace_uuid.to_string(), parent_uuid.map(str::to_string));
        let next = match self.positions.get(&key) {
            Some(pos) => *pos,
            None => self.conn.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM zen_pins
                 WHERE workspace_uuid = ?1 AND folder_parent_uuid IS ?2",
                params![workspace_uuid, parent_uuid],
                |row| row.get(0),
            )?,
        };
        self.positions.insert(key, next + 1);
        Ok(next)
    }

    fn new_uuid() -> String {
        format!("{{{}}}", Uuid::new_v4())
    }

    fn mark_created(&mut self, uuid: &str, now: i64) -> Result<(), ImportError> {
        self.created.insert(uuid.to_string());
        if self.track_changes {
            record_change(self.conn, "zen_pins_changes", uuid, now)?;
        }
        Ok(())
    }

    fn row_to_pin(row: &rusqlite::Row) -> rusqlite::Result<PinnedItem> {
        Ok(PinnedItem {
            uuid: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            container_id: row.get(3)?,
            workspace_uuid: row.get(4)?,
            position: row.get(5)?,
            parent_uuid: row.get(6)?,
            is_group: row.get(7)?,
            is_essential: row.get(8)?,
        })
    }

    /// Creates (or reuses) the folder `folder_id` and every ancestor it needs.
    fn resolve_folder(
        &mut self,
        space: &SpaceNode,
        folder_id: &str,
        target: &SpaceTarget<'_>,
        folders: &mut HashMap<String, String>,
        outcome: &mut SpaceOutcome,
        depth: usize,
    ) -> Result<Option<String>, ImportError> {
        if let Some(uuid) = folders.get(folder_id) {
            return Ok(Some(uuid.clone()));
        }
        let Some(folder) = space.folder(folder_id) else {
            return Ok(None);
        };
        if depth > space.folders.len() {
            return Err(ImportError::Integrity(format!(
                "folder cycle at {} in space {}",
                folder_id, space.name
            )));
        }
        let parent_uuid = self.resolve_parent(space, folder, target, folders, outcome, depth)?;
        let (uuid, created) = self.ensure_folder(
            target.workspace_uuid,
            parent_uuid.as_deref(),
            &folder.title,
            target.container_id,
        )?;
        outcome.pin_folders.record(created);
        folders.insert(folder.id.clone(), uuid.clone());
        Ok(Some(uuid))
    }

    fn resolve_parent(
        &mut self,
        space: &SpaceNode,
        folder: &FolderNode,
        target: &SpaceTarget<'_>,
        folders: &mut HashMap<String, String>,
        outcome: &mut SpaceOutcome,
        depth: usize,
    ) -> Result<Option<String>, ImportError> {
        match folder.parent_id.as_deref() {
            Some(parent) => self.resolve_folder(space, parent, target, folders, outcome, depth + 1),
            None => Ok(None),
        }
    }
}

impl<'a> PinManagerTrait for PinManager<'a> {
    fn ensure_folder(
        &mut self,
        workspace_uuid: &str,
        parent_uuid: Option<&str>,
        title: &str,
        container_id: i64,
    ) -> Result<(String, bool), ImportError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT uuid FROM zen_pins
                 WHERE workspace_uuid = ?1 AND folder_parent_uuid IS ?2 AND title = ?3 AND is_group = 1
                 ORDER BY position LIMIT 1",
                params![workspace_uuid, parent_uuid, title],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(uuid) = existing {
            debug!(folder = %title, uuid = %uuid, "reusing pin folder");
            return Ok((uuid, false));
        }

        let uuid = Self::new_uuid();
        let position = self.take_position(workspace_uuid, parent_uuid)?;
        let now = now_millis();
        self.conn.execute(
            "INSERT INTO zen_pins (
                uuid, title, url, container_id, workspace_uuid, position,
                is_essential, is_group, folder_parent_uuid, created_at, updated_at,
                edited_title, is_folder_collapsed, folder_icon
            ) VALUES (?1, ?2, NULL, ?3, ?4, ?5, 0, 1, ?6, ?7, ?7, 0, 0, NULL)",
            params![uuid, title, container_id, workspace_uuid, position, parent_uuid, now],
        )?;
        self.mark_created(&uuid, now)?;
        debug!(folder = %title, uuid = %uuid, position, "created pin folder");
        Ok((uuid, true))
    }

    fn ensure_tab(
        &mut self,
        workspace_uuid: &str,
        parent_uuid: Option<&str>,
        tab: &TabNode,
        container_id: i64,
    ) -> Result<(String, bool), ImportError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT uuid FROM zen_pins
                 WHERE workspace_uuid = ?1 AND folder_parent_uuid IS ?2 AND url = ?3
                   AND is_essential = ?4 AND is_group = 0
                 ORDER BY position LIMIT 1",
                params![workspace_uuid, parent_uuid, tab.url, tab.essential],
                |row| row.get(0),
            )
            .optional()?;

        let (uuid, created) = match existing {
            Some(uuid) => {
                debug!(url = %tab.url, uuid = %uuid, "reusing pinned tab");
                (uuid, false)
            }
            None => {
                let uuid = Self::new_uuid();
                let position = self.take_position(workspace_uuid, parent_uuid)?;
                let now = now_millis();
                self.conn.execute(
                    "INSERT INTO zen_pins (
                        uuid, title, url, container_id, workspace_uuid, position,
                        is_essential, is_group, folder_parent_uuid, created_at, updated_at,
                        edited_title, is_folder_collapsed, folder_icon
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?9, 0, 0, NULL)",
                    params![
                        uuid,
                        tab.title,
                        tab.url,
                        container_id,
                        workspace_uuid,
                        position,
                        tab.essential,
                        parent_uuid,
                        now
                    ],
                )?;
                self.mark_created(&uuid, now)?;
                debug!(url = %tab.url, uuid = %uuid, position, "created pinned tab");
                (uuid, true)
            }
        };

        self.records.push(PinnedTabRecord {
            pin_uuid: uuid.clone(),
            workspace_uuid: workspace_uuid.to_string(),
            url: tab.url.clone(),
            title: tab.title.clone(),
            container_id,
            essential: tab.essential,
        });
        Ok((uuid, created))
    }

    fn list_pins(&self, workspace_uuid: &str) -> Result<Vec<PinnedItem>, ImportError> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, title, url, container_id, workspace_uuid, position,
                    folder_parent_uuid, is_group, is_essential
             FROM zen_pins WHERE workspace_uuid = ?1
             ORDER BY folder_parent_uuid, position",
        )?;
        let rows = stmt
            .query_map(params![workspace_uuid], Self::row_to_pin)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn orphaned_pins(&self) -> Result<Vec<String>, ImportError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.uuid FROM zen_pins p
             WHERE p.folder_parent_uuid IS NOT NULL
               AND NOT EXISTS (SELECT 1 FROM zen_pins q WHERE q.uuid = p.folder_parent_uuid)",
        )?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }
}

impl<'a> SpaceTreeWriter for PinManager<'a> {
    /// Writes folders and tabs in display order. A child whose parent has not
    /// been written yet pulls the parent in first.
    fn write_space(
        &mut self,
        space: &SpaceNode,
        target: &SpaceTarget<'_>,
        outcome: &mut SpaceOutcome,
    ) -> Result<(), ImportError> {
        let mut folders: HashMap<String, String> = HashMap::new();
        for entry in space.entries() {
            match entry {
                SpaceEntry::Folder(folder) => {
                    self.resolve_folder(space, &folder.id, target, &mut folders, outcome, 0)?;
                }
                SpaceEntry::Tab(tab) => {
                    let parent = match tab.folder_id.as_deref() {
                        Some(folder_id) => {
                            self.resolve_folder(space, folder_id, target, &mut folders, outcome, 0)?
                        }
                        None => None,
                    };
                    let (_, created) = self.ensure_tab(
                        target.workspace_uuid,
                        parent.as_deref(),
                        tab,
                        target.container_id,
                    )?;
                    outcome.pins.record(created);
                }
            }
        }
        Ok(())
    }
}
