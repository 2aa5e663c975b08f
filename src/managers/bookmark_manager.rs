//! Bookmark Manager.
//!
//! Writes the bookmark representation of a space: one folder per space under
//! the unfiled root, nested subfolders mirroring the space's folders, and
//! bookmarks pointing at `moz_places` rows.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{now_micros, SpaceTarget, SpaceTreeWriter};
use crate::types::destination::{BookmarkKind, BookmarkNode};
use crate::types::errors::ImportError;
use crate::types::report::{RowCounts, SpaceOutcome};
use crate::types::tree::{SpaceEntry, SpaceNode};

const GOLDEN_RATIO: u32 = 0x9E37_79B9;

/// Trait defining bookmark and place operations.
pub trait BookmarkManagerTrait {
    /// Returns the folder id and whether it was created.
    fn ensure_folder(&mut self, parent: i64, title: &str) -> Result<(i64, bool), ImportError>;
    /// Returns the place id and whether it was created.
    fn ensure_place(&mut self, url: &str, title: &str) -> Result<(i64, bool), ImportError>;
    fn ensure_bookmark(&mut self, place_id: i64, parent: i64, title: &str) -> Result<(i64, bool), ImportError>;
    fn list_children(&self, parent: i64) -> Result<Vec<BookmarkNode>, ImportError>;
}

/// Bookmark manager backed by a SQLite connection.
pub struct BookmarkManager<'a> {
    conn: &'a Connection,
    root: i64,
    /// Next free position per parent folder.
    positions: HashMap<i64, i64>,
    places: RowCounts,
}

impl<'a> BookmarkManager<'a> {
    /// `root` is the folder space folders are created under.
    pub fn new(conn: &'a Connection, root: i64) -> Self {
        Self {
            conn,
            root,
            positions: HashMap::new(),
            places: RowCounts::default(),
        }
    }

    /// Places created and reused so far.
    pub fn place_counts(&self) -> RowCounts {
        self.places
    }

    fn take_position(&mut self, parent: i64) -> Result<i64, ImportError> {
        let next = match self.positions.get(&parent) {
            Some(pos) => *pos,
            None => self.conn.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM moz_bookmarks WHERE parent = ?1",
                params![parent],
                |row| row.get(0),
            )?,
        };
        self.positions.insert(parent, next + 1);
        Ok(next)
    }

    fn insert_bookmark_row(
        &mut self,
        kind: BookmarkKind,
        fk: Option<i64>,
        parent: i64,
        title: &str,
    ) -> Result<i64, ImportError> {
        let position = self.take_position(parent)?;
        let now = now_micros();
        self.conn.execute(
            "INSERT INTO moz_bookmarks (type, fk, parent, position, title, dateAdded, lastModified, guid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)",
            params![kind.as_i64(), fk, parent, position, title, now, new_guid()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Creates (or reuses) the bookmark folder for `folder_id`, pulling in
    /// any ancestor that has not been written yet. `None` for an unknown id.
    fn resolve_folder<'s>(
        &mut self,
        space: &'s SpaceNode,
        folder_id: &str,
        space_folder: i64,
        folders: &mut HashMap<&'s str, i64>,
        outcome: &mut SpaceOutcome,
        depth: usize,
    ) -> Result<Option<i64>, ImportError> {
        if let Some(id) = folders.get(folder_id) {
            return Ok(Some(*id));
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
        let parent = match folder.parent_id.as_deref() {
            Some(parent) => self
                .resolve_folder(space, parent, space_folder, folders, outcome, depth + 1)?
                .unwrap_or(space_folder),
            None => space_folder,
        };
        let (id, created) = self.ensure_folder(parent, &folder.title)?;
        outcome.bookmark_folders.record(created);
        folders.insert(folder.id.as_str(), id);
        Ok(Some(id))
    }

    fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<BookmarkNode> {
        let kind: i64 = row.get(1)?;
        Ok(BookmarkNode {
            id: row.get(0)?,
            kind: BookmarkKind::from_i64(kind).unwrap_or(BookmarkKind::Separator),
            parent: row.get(2)?,
            position: row.get(3)?,
            title: row.get(4)?,
            fk: row.get(5)?,
            guid: row.get(6)?,
        })
    }
}

impl<'a> BookmarkManagerTrait for BookmarkManager<'a> {
    fn ensure_folder(&mut self, parent: i64, title: &str) -> Result<(i64, bool), ImportError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM moz_bookmarks WHERE parent = ?1 AND title = ?2 AND type = ?3
                 ORDER BY position LIMIT 1",
                params![parent, title, BookmarkKind::Folder.as_i64()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok((id, false));
        }
        let id = self.insert_bookmark_row(BookmarkKind::Folder, None, parent, title)?;
        debug!(folder = %title, id, parent, "created bookmark folder");
        Ok((id, true))
    }

    fn ensure_place(&mut self, url: &str, title: &str) -> Result<(i64, bool), ImportError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM moz_places WHERE url = ?1 LIMIT 1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            self.places.record(false);
            return Ok((id, false));
        }

        self.conn.execute(
            "INSERT INTO moz_places (url, title, rev_host, visit_count, frecency, last_visit_date, guid, url_hash)
             VALUES (?1, ?2, ?3, 0, -1, NULL, ?4, ?5)",
            params![url, title, rev_host(url), new_guid(), url_hash(url)],
        )?;
        let id = self.conn.last_insert_rowid();
        self.places.record(true);
        debug!(url = %url, id, "created place");
        Ok((id, true))
    }

    fn ensure_bookmark(
        &mut self,
        place_id: i64,
        parent: i64,
        title: &str,
    ) -> Result<(i64, bool), ImportError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM moz_bookmarks WHERE fk = ?1 AND parent = ?2 AND type = ?3 LIMIT 1",
                params![place_id, parent, BookmarkKind::Bookmark.as_i64()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok((id, false));
        }
        let id = self.insert_bookmark_row(BookmarkKind::Bookmark, Some(place_id), parent, title)?;
        self.conn.execute(
            "UPDATE moz_places SET foreign_count = foreign_count + 1 WHERE id = ?1",
            params![place_id],
        )?;
        Ok((id, true))
    }

    fn list_children(&self, parent: i64) -> Result<Vec<BookmarkNode>, ImportError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, parent, position, title, fk, guid
             FROM moz_bookmarks WHERE parent = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![parent], Self::row_to_node)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl<'a> SpaceTreeWriter for BookmarkManager<'a> {
    fn write_space(
        &mut self,
        space: &SpaceNode,
        _target: &SpaceTarget<'_>,
        outcome: &mut SpaceOutcome,
    ) -> Result<(), ImportError> {
        let (space_folder, created) = self.ensure_folder(self.root, &space.name)?;
        outcome.bookmark_folders.record(created);

        let mut folders: HashMap<&str, i64> = HashMap::new();
        for entry in space.entries() {
            match entry {
                SpaceEntry::Folder(folder) => {
                    self.resolve_folder(space, &folder.id, space_folder, &mut folders, outcome, 0)?;
                }
                SpaceEntry::Tab(tab) => {
                    let parent = match tab.folder_id.as_deref() {
                        Some(folder_id) => self
                            .resolve_folder(space, folder_id, space_folder, &mut folders, outcome, 0)?
                            .unwrap_or(space_folder),
                        None => space_folder,
                    };
                    let (place, _) = self.ensure_place(&tab.url, &tab.title)?;
                    let (_, created) = self.ensure_bookmark(place, parent, &tab.title)?;
                    outcome.bookmarks.record(created);
                }
            }
        }
        Ok(())
    }
}

// === Places helpers ===

fn add_to_hash(hash: u32, value: u32) -> u32 {
    GOLDEN_RATIO.wrapping_mul(hash.rotate_left(5) ^ value)
}

fn hash_bytes(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |h, b| add_to_hash(h, u32::from(*b)))
}

/// Places `url_hash`: the scheme's hash in the upper 16 bits above the
/// full URL's 32-bit hash.
pub fn url_hash(url: &str) -> i64 {
    let scheme = url.split_once(':').map(|(s, _)| s).unwrap_or("");
    let prefix = u64::from(hash_bytes(scheme.as_bytes()) & 0xFFFF);
    ((prefix << 32) + u64::from(hash_bytes(url.as_bytes()))) as i64
}

/// Host reversed character by character with a trailing dot.
pub fn rev_host(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    let mut reversed: String = host.chars().rev().collect();
    reversed.push('.');
    reversed
}

/// 12-character URL-safe GUID, as Places generates them.
pub fn new_guid() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    // Skip the version and variant bytes.
    let random = [
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[7], bytes[9], bytes[10],
    ];
    URL_SAFE_NO_PAD.encode(random)
}
