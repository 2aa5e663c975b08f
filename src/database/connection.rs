//! SQLite connection management for the destination profile.
//!
//! Provides the [`Database`] struct that wraps a `rusqlite::Connection`.
//! [`Database::open_destination`] is the only entry point the importer uses:
//! it runs every precondition before a single byte is written.

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

use super::schema;
use crate::types::errors::{is_lock_error, ImportError};

/// Core database wrapper around the destination `places.sqlite`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) a database at `path` and installs the destination schema.
    ///
    /// Used to build fixture profiles; a live browser profile already has one.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        schema::install(&conn)?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database with the destination schema.
    ///
    /// Useful for testing: the database is discarded when the `Database` is dropped.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        schema::install(&conn)?;
        Ok(Self { conn })
    }

    /// Opens an existing destination database and checks the import preconditions.
    ///
    /// # Errors
    /// - `DestinationMissing` if the file does not exist (nothing is created)
    /// - `DestinationLocked` if the non-blocking write-lock check hits a lock
    /// - `MissingTables` / `MissingBookmarkRoot` for an unexpected schema
    pub fn open_destination<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ImportError::DestinationMissing(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ImportError::Database(e.to_string()))?;

        // One attempt, no retries: any wait means another writer is live.
        conn.busy_timeout(Duration::ZERO)?;
        let db = Self { conn };
        db.check_write_lock()?;

        let missing = schema::missing_tables(&db.conn)?;
        if !missing.is_empty() {
            return Err(ImportError::MissingTables(missing));
        }
        if schema::unfiled_root_id(&db.conn)?.is_none() {
            return Err(ImportError::MissingBookmarkRoot(
                schema::UNFILED_ROOT_GUID.to_string(),
            ));
        }
        Ok(db)
    }

    /// Takes and releases the write lock without waiting, so a writer
    /// holding RESERVED or stronger is reported before anything else runs.
    fn check_write_lock(&self) -> Result<(), ImportError> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(Self::lock_check_error)?;
        let read = self
            .conn
            .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0));
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(Self::lock_check_error)?;
        read.map(|_| ()).map_err(Self::lock_check_error)
    }

    fn lock_check_error(e: rusqlite::Error) -> ImportError {
        if is_lock_error(&e) {
            ImportError::DestinationLocked
        } else {
            ImportError::Database(e.to_string())
        }
    }

    /// Returns a reference to the underlying `rusqlite::Connection`.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access, needed to open a transaction.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
