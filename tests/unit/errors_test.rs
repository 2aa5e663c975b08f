use std::path::PathBuf;

use arc2zen::types::errors::*;

// === ExtractError Tests ===

#[test]
fn extract_error_io_display_names_path() {
    let err = ExtractError::Io {
        path: PathBuf::from("/tmp/StorableSidebar.json"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert_eq!(
        err.to_string(),
        "Failed to read sidebar document /tmp/StorableSidebar.json: denied"
    );
    assert!(std::error::Error::source(&err).is_some());
}

// === CodecError Tests ===

#[test]
fn codec_error_display_variants() {
    assert_eq!(CodecError::BadMagic.to_string(), "Bad magic header");
    assert_eq!(CodecError::Truncated(10).to_string(), "Truncated header: 10 bytes");
    assert_eq!(
        CodecError::LengthMismatch {
            declared: 100,
            actual: 42
        }
        .to_string(),
        "Length mismatch: header declares 100 bytes, got 42"
    );
    assert_eq!(
        CodecError::Decompress("bad offset".to_string()).to_string(),
        "Decompression failed: bad offset"
    );
    assert_eq!(
        CodecError::PayloadTooLarge(5_000_000_000).to_string(),
        "Payload too large: 5000000000 bytes"
    );
}

#[test]
fn codec_error_from_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: CodecError = json_err.into();
    assert!(matches!(err, CodecError::Json(_)));
}

// === ContainerError Tests ===

#[test]
fn container_error_malformed_display() {
    let err = ContainerError::Malformed {
        path: PathBuf::from("containers.json"),
        message: "expected value".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Malformed containers file containers.json: expected value"
    );
}

// === ImportError Tests ===

#[test]
fn import_error_display_variants() {
    assert_eq!(
        ImportError::DestinationMissing(PathBuf::from("/p/places.sqlite")).to_string(),
        "Destination database not found: /p/places.sqlite"
    );
    assert_eq!(
        ImportError::DestinationLocked.to_string(),
        "Destination database is locked; close the browser and retry"
    );
    assert_eq!(
        ImportError::MissingTables(vec!["zen_pins".to_string(), "zen_workspaces".to_string()])
            .to_string(),
        "Missing destination tables: zen_pins, zen_workspaces"
    );
    assert_eq!(
        ImportError::MissingBookmarkRoot("unfiled_____".to_string()).to_string(),
        "Missing bookmark root: unfiled_____"
    );
    assert_eq!(
        ImportError::VerificationFailed {
            expected: 5,
            actual: 4
        }
        .to_string(),
        "Verification failed: expected 5 tabs, found 4"
    );
    assert_eq!(
        ImportError::Integrity("dangling".to_string()).to_string(),
        "Integrity check failed: dangling"
    );
}

#[test]
fn import_error_from_busy_sqlite_is_locked() {
    let busy = rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        None,
    );
    assert!(is_lock_error(&busy));
    assert!(matches!(ImportError::from(busy), ImportError::DestinationLocked));
}

#[test]
fn import_error_from_other_sqlite_is_database() {
    let err = ImportError::from(rusqlite::Error::QueryReturnedNoRows);
    assert!(matches!(err, ImportError::Database(_)));
}

#[test]
fn import_error_from_sidecar_errors() {
    assert!(matches!(
        ImportError::from(CodecError::BadMagic),
        ImportError::Sidecar(ref msg) if msg == "Bad magic header"
    ));
    let container = ContainerError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
    assert!(matches!(ImportError::from(container), ImportError::Sidecar(_)));
}

// === SettingsError Tests ===

#[test]
fn settings_error_invalid_display() {
    let err = SettingsError::Invalid {
        key: "importer.default_container_id".to_string(),
        message: "must be positive, got 0".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid setting importer.default_container_id: must be positive, got 0"
    );
}

// === MigrationError Tests ===

#[test]
fn migration_error_is_transparent() {
    let err: MigrationError = ImportError::DestinationLocked.into();
    assert_eq!(err.to_string(), ImportError::DestinationLocked.to_string());
    let err: MigrationError = SettingsError::Invalid {
        key: "k".to_string(),
        message: "m".to_string(),
    }
    .into();
    assert!(matches!(err, MigrationError::Settings(_)));
}

#[test]
fn migration_error_export_display() {
    assert_eq!(
        MigrationError::Export("disk full".to_string()).to_string(),
        "Export failed: disk full"
    );
}
