//! Destination `places.sqlite` schema.
//!
//! Only the tables and columns the importer touches are modeled. `install`
//! is used to build fixture profiles; the importer itself never creates
//! tables in a live profile, it only checks for them with [`missing_tables`].

use rusqlite::{params, Connection, OptionalExtension};

/// Tables the importer cannot run without.
pub const REQUIRED_TABLES: [&str; 4] = ["moz_places", "moz_bookmarks", "zen_workspaces", "zen_pins"];

/// GUID of the "Other Bookmarks" root.
pub const UNFILED_ROOT_GUID: &str = "unfiled_____";

/// Built-in bookmark roots as `(id, guid, parent, position, title)`.
const BOOKMARK_ROOTS: [(i64, &str, i64, i64, &str); 6] = [
    (1, "root________", 0, 0, ""),
    (2, "menu________", 1, 0, "menu"),
    (3, "toolbar_____", 1, 1, "toolbar"),
    (4, "tags________", 1, 2, "tags"),
    (5, "unfiled_____", 1, 3, "unfiled"),
    (6, "mobile______", 1, 4, "mobile"),
];

/// Creates the destination tables and bookmark roots if they do not exist.
///
/// Idempotent: safe to call on a populated database.
pub fn install(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS moz_places (
            id INTEGER PRIMARY KEY,
            url LONGVARCHAR,
            title LONGVARCHAR,
            rev_host LONGVARCHAR,
            visit_count INTEGER DEFAULT 0,
            hidden INTEGER DEFAULT 0 NOT NULL,
            typed INTEGER DEFAULT 0 NOT NULL,
            frecency INTEGER DEFAULT -1 NOT NULL,
            last_visit_date INTEGER,
            guid TEXT,
            foreign_count INTEGER DEFAULT 0 NOT NULL,
            url_hash INTEGER DEFAULT 0 NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS moz_places_url_uniqueindex ON moz_places(url_hash, url);
        CREATE UNIQUE INDEX IF NOT EXISTS moz_places_guid_uniqueindex ON moz_places(guid);

        CREATE TABLE IF NOT EXISTS moz_bookmarks (
            id INTEGER PRIMARY KEY,
            type INTEGER,
            fk INTEGER DEFAULT NULL,
            parent INTEGER,
            position INTEGER,
            title LONGVARCHAR,
            keyword_id INTEGER,
            folder_type TEXT,
            dateAdded INTEGER,
            lastModified INTEGER,
            guid TEXT,
            syncStatus INTEGER NOT NULL DEFAULT 0,
            syncChangeCounter INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS moz_bookmarks_itemindex ON moz_bookmarks(fk, type);
        CREATE INDEX IF NOT EXISTS moz_bookmarks_parentindex ON moz_bookmarks(parent, position);
        CREATE UNIQUE INDEX IF NOT EXISTS moz_bookmarks_guid_uniqueindex ON moz_bookmarks(guid);

        CREATE TABLE IF NOT EXISTS zen_workspaces (
            id INTEGER PRIMARY KEY,
            uuid TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            icon TEXT,
            container_id INTEGER,
            position INTEGER NOT NULL DEFAULT 0,
            theme_type TEXT,
            theme_colors TEXT,
            theme_opacity REAL,
            theme_rotation INTEGER,
            theme_texture REAL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS zen_workspaces_changes (
            uuid TEXT UNIQUE NOT NULL,
            timestamp INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS zen_pins (
            id INTEGER PRIMARY KEY,
            uuid TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            url TEXT,
            container_id INTEGER,
            workspace_uuid TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            is_essential BOOLEAN NOT NULL DEFAULT 0,
            is_group BOOLEAN NOT NULL DEFAULT 0,
            folder_parent_uuid TEXT DEFAULT NULL,
            edited_title BOOLEAN NOT NULL DEFAULT 0,
            is_folder_collapsed BOOLEAN NOT NULL DEFAULT 0,
            folder_icon TEXT DEFAULT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_zen_pins_uuid ON zen_pins(uuid);

        CREATE TABLE IF NOT EXISTS zen_pins_changes (
            uuid TEXT UNIQUE NOT NULL,
            timestamp INTEGER NOT NULL
        );
        ",
    )?;

    for (id, guid, parent, position, title) in BOOKMARK_ROOTS {
        conn.execute(
            "INSERT OR IGNORE INTO moz_bookmarks (id, type, fk, parent, position, title, dateAdded, lastModified, guid)
             VALUES (?1, 2, NULL, ?2, ?3, ?4, 0, 0, ?5)",
            params![id, parent, position, title, guid],
        )?;
    }

    Ok(())
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Returns the required tables that are absent, in declaration order.
pub fn missing_tables(conn: &Connection) -> Result<Vec<String>, rusqlite::Error> {
    let mut missing = Vec::new();
    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            missing.push(table.to_string());
        }
    }
    Ok(missing)
}

/// Row id of the unfiled bookmark root, if present.
pub fn unfiled_root_id(conn: &Connection) -> Result<Option<i64>, rusqlite::Error> {
    conn.query_row(
        "SELECT id FROM moz_bookmarks WHERE guid = ?1",
        params![UNFILED_ROOT_GUID],
        |row| row.get(0),
    )
    .optional()
}
