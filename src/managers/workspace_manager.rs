//! Workspace Manager.
//!
//! Implements `WorkspaceManagerTrait`: find-or-create rows in
//! `zen_workspaces`, keyed by name, with icon and theme kept in sync.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use super::{now_millis, record_change};
use crate::types::destination::{Workspace, WorkspaceTheme};
use crate::types::errors::ImportError;

/// Trait defining workspace operations.
pub trait WorkspaceManagerTrait {
    fn find_by_name(&self, name: &str) -> Result<Option<Workspace>, ImportError>;
    /// Returns the workspace and whether it was created.
    fn ensure_workspace(
        &mut self,
        name: &str,
        container_id: i64,
        icon: Option<&str>,
        theme: Option<&WorkspaceTheme>,
    ) -> Result<(Workspace, bool), ImportError>;
    fn list_workspaces(&self) -> Result<Vec<Workspace>, ImportError>;
}

/// Workspace manager backed by a SQLite connection.
pub struct WorkspaceManager<'a> {
    conn: &'a Connection,
    track_changes: bool,
}

impl<'a> WorkspaceManager<'a> {
    /// `track_changes` records touched uuids in `zen_workspaces_changes`.
    pub fn new(conn: &'a Connection, track_changes: bool) -> Self {
        Self {
            conn,
            track_changes,
        }
    }

    fn next_position(&self) -> Result<i64, ImportError> {
        let pos: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM zen_workspaces",
            [],
            |row| row.get(0),
        )?;
        Ok(pos)
    }

    fn row_to_workspace(row: &rusqlite::Row) -> rusqlite::Result<Workspace> {
        Ok(Workspace {
            uuid: row.get(0)?,
            name: row.get(1)?,
            container_id: row.get(2)?,
            position: row.get(3)?,
            icon: row.get(4)?,
            theme_type: row.get(5)?,
            theme_colors: row.get(6)?,
        })
    }

    /// Applies icon and theme only where they differ from the stored row.
    fn sync_appearance(
        &self,
        existing: &mut Workspace,
        icon: Option<&str>,
        theme: Option<&WorkspaceTheme>,
    ) -> Result<(), ImportError> {
        let mut changed = false;
        let now = now_millis();

        if let Some(icon) = icon {
            if existing.icon.as_deref() != Some(icon) {
                self.conn.execute(
                    "UPDATE zen_workspaces SET icon = ?1, updated_at = ?2 WHERE uuid = ?3",
                    params![icon, now, existing.uuid],
                )?;
                existing.icon = Some(icon.to_string());
                changed = true;
            }
        }

        if let Some(theme) = theme {
            let same = existing.theme_type.as_deref() == Some(theme.theme_type.as_str())
                && existing.theme_colors.as_deref() == Some(theme.colors.as_str());
            if !same {
                self.conn.execute(
                    "UPDATE zen_workspaces SET theme_type = ?1, theme_colors = ?2, theme_opacity = ?3,
                     theme_rotation = ?4, theme_texture = ?5, updated_at = ?6 WHERE uuid = ?7",
                    params![
                        theme.theme_type,
                        theme.colors,
                        theme.opacity,
                        theme.rotation,
                        theme.texture,
                        now,
                        existing.uuid
                    ],
                )?;
                existing.theme_type = Some(theme.theme_type.clone());
                existing.theme_colors = Some(theme.colors.clone());
                changed = true;
            }
        }

        if changed {
            info!(workspace = %existing.name, "updated workspace appearance");
            if self.track_changes {
                record_change(self.conn, "zen_workspaces_changes", &existing.uuid, now)?;
            }
        }
        Ok(())
    }
}

impl<'a> WorkspaceManagerTrait for WorkspaceManager<'a> {
    fn find_by_name(&self, name: &str) -> Result<Option<Workspace>, ImportError> {
        let found = self
            .conn
            .query_row(
                "SELECT uuid, name, container_id, position, icon, theme_type, theme_colors
                 FROM zen_workspaces WHERE name = ?1 ORDER BY position LIMIT 1",
                params![name],
                Self::row_to_workspace,
            )
            .optional()?;
        Ok(found)
    }

    fn ensure_workspace(
        &mut self,
        name: &str,
        container_id: i64,
        icon: Option<&str>,
        theme: Option<&WorkspaceTheme>,
    ) -> Result<(Workspace, bool), ImportError> {
        if let Some(mut existing) = self.find_by_name(name)? {
            debug!(workspace = %name, uuid = %existing.uuid, "reusing workspace");
            self.sync_appearance(&mut existing, icon, theme)?;
            return Ok((existing, false));
        }

        let uuid = format!("{{{}}}", Uuid::new_v4());
        let position = self.next_position()?;
        let now = now_millis();
        self.conn.execute(
            "INSERT INTO zen_workspaces (
                uuid, name, container_id, position, created_at, updated_at, icon,
                theme_type, theme_colors, theme_opacity, theme_rotation, theme_texture
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                uuid,
                name,
                container_id,
                position,
                now,
                icon,
                theme.map(|t| t.theme_type.as_str()),
                theme.map(|t| t.colors.as_str()),
                theme.map(|t| t.opacity),
                theme.map(|t| t.rotation),
                theme.map(|t| t.texture),
            ],
        )?;
        if self.track_changes {
            record_change(self.conn, "zen_workspaces_changes", &uuid, now)?;
        }
        info!(workspace = %name, uuid = %uuid, container_id, "created workspace");

        Ok((
            Workspace {
                uuid,
                name: name.to_string(),
                container_id: Some(container_id),
                position,
                icon: icon.map(str::to_string),
                theme_type: theme.map(|t| t.theme_type.clone()),
                theme_colors: theme.map(|t| t.colors.clone()),
            },
            true,
        ))
    }

    fn list_workspaces(&self) -> Result<Vec<Workspace>, ImportError> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, container_id, position, icon, theme_type, theme_colors
             FROM zen_workspaces ORDER BY position",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_workspace)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
