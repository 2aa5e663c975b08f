use std::path::PathBuf;

use thiserror::Error;

// === ExtractError ===

/// Errors raised while reading the source sidebar document.
///
/// Format problems never surface here; they degrade inside the extractor and
/// land in the extraction report.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document exists but could not be read.
    #[error("Failed to read sidebar document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// === CodecError ===

/// Errors related to the `mozLz40` binary container.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The 8-byte magic header is absent or wrong.
    #[error("Bad magic header")]
    BadMagic,
    /// The 4-byte length field is missing.
    #[error("Truncated header: {0} bytes")]
    Truncated(usize),
    /// Decompressed byte count disagrees with the header.
    #[error("Length mismatch: header declares {declared} bytes, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    /// The LZ4 block is corrupt.
    #[error("Decompression failed: {0}")]
    Decompress(String),
    /// Payload does not fit the 32-bit length field.
    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// === ContainerError ===

/// Errors related to the `containers.json` sidecar.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The file exists but is not a valid containers document.
    #[error("Malformed containers file {path}: {message}")]
    Malformed { path: PathBuf, message: String },
    #[error("I/O error on containers file: {0}")]
    Io(#[from] std::io::Error),
}

// === ImportError ===

/// Errors related to writing into the destination profile.
#[derive(Debug, Error)]
pub enum ImportError {
    /// `places.sqlite` is not present in the profile.
    #[error("Destination database not found: {0}")]
    DestinationMissing(PathBuf),
    /// Another process holds a lock on the destination database.
    #[error("Destination database is locked; close the browser and retry")]
    DestinationLocked,
    /// Required destination tables are absent.
    #[error("Missing destination tables: {}", .0.join(", "))]
    MissingTables(Vec<String>),
    /// The unfiled bookmarks root is absent.
    #[error("Missing bookmark root: {0}")]
    MissingBookmarkRoot(String),
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
    /// A post-write re-read disagreed with what was written.
    #[error("Verification failed: expected {expected} tabs, found {actual}")]
    VerificationFailed { expected: usize, actual: usize },
    /// The staged write set would leave dangling references.
    #[error("Integrity check failed: {0}")]
    Integrity(String),
    /// A sidecar file could not be read or written.
    #[error("Sidecar error: {0}")]
    Sidecar(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        if is_lock_error(&err) {
            ImportError::DestinationLocked
        } else {
            ImportError::Database(err.to_string())
        }
    }
}

impl From<CodecError> for ImportError {
    fn from(err: CodecError) -> Self {
        ImportError::Sidecar(err.to_string())
    }
}

impl From<ContainerError> for ImportError {
    fn from(err: ContainerError) -> Self {
        ImportError::Sidecar(err.to_string())
    }
}

/// True for SQLite busy/locked failures.
pub fn is_lock_error(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
    )
}

// === SettingsError ===

/// Errors related to loading migration settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// A setting is present but out of range.
    #[error("Invalid setting {key}: {message}")]
    Invalid { key: String, message: String },
}

// === MigrationError ===

/// Top-level error returned by the orchestrator.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Export failed: {0}")]
    Export(String),
}
