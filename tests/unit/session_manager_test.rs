//! Unit tests for the SessionManager.
//!
//! Checks the pinned-tab merge into `sessionstore.jsonlz4`, the skip when
//! nothing changes, and write verification.

use std::collections::BTreeSet;
use std::fs;

use arc2zen::managers::session_manager::{count_tabs, SessionManager, SessionManagerTrait};
use arc2zen::services::mozlz4;
use arc2zen::types::destination::PinnedTabRecord;
use arc2zen::types::errors::ImportError;
use serde_json::{json, Value};
use tempfile::TempDir;

fn record(workspace: &str, url: &str) -> PinnedTabRecord {
    PinnedTabRecord {
        pin_uuid: format!("{{pin-{}}}", url.len()),
        workspace_uuid: workspace.to_string(),
        url: url.to_string(),
        title: url.to_string(),
        container_id: 2,
        essential: false,
    }
}

/// Helper: a temp profile dir and a manager for its session file.
fn setup() -> (TempDir, SessionManager) {
    let dir = TempDir::new().unwrap();
    let manager = SessionManager::new(&dir.path().join("sessionstore.jsonlz4"));
    (dir, manager)
}

fn existing_session() -> Value {
    json!({
        "version": ["sessionrestore", 1],
        "windows": [{
            "tabs": [
                {"entries": [{"url": "https://kept.test/"}], "index": 1, "zenWorkspace": "{ws}"},
                {"entries": [{"url": "https://other.test/"}], "index": 1}
            ],
            "selected": 1
        }],
        "global": {"custom": true}
    })
}

#[test]
fn test_missing_session_plans_from_skeleton() {
    let (_dir, manager) = setup();
    assert!(!manager.has_session());
    let plan = manager
        .plan(&[record("{ws}", "https://a.test/"), record("{ws}", "https://b.test/")])
        .unwrap();
    assert_eq!(plan.added, 2);
    assert_eq!(plan.expected, 2);
    assert_eq!(plan.document["windows"][0]["tabs"].as_array().unwrap().len(), 2);
}

#[test]
fn test_existing_tabs_are_not_duplicated() {
    let (_dir, manager) = setup();
    mozlz4::write_json_file(manager.path(), &existing_session()).unwrap();

    let plan = manager
        .plan(&[record("{ws}", "https://kept.test/"), record("{ws}", "https://new.test/")])
        .unwrap();
    assert_eq!(plan.added, 1);
    assert_eq!(plan.expected, 2);
    assert_eq!(plan.document["global"]["custom"], true);

    let tabs = plan.document["windows"][0]["tabs"].as_array().unwrap();
    assert_eq!(tabs.len(), 3);
    let added = &tabs[2];
    assert_eq!(added["pinned"], true);
    assert_eq!(added["zenWorkspace"], "{ws}");
    assert_eq!(added["userContextId"], 2);
    assert_eq!(added["zenEssential"], false);
    assert_eq!(added["entries"][0]["url"], "https://new.test/");
}

#[test]
fn test_duplicate_records_are_merged() {
    let (_dir, manager) = setup();
    let plan = manager
        .plan(&[record("{ws}", "https://a.test/"), record("{ws}", "https://a.test/")])
        .unwrap();
    assert_eq!(plan.added, 1);
}

#[test]
fn test_same_url_in_two_workspaces_is_two_tabs() {
    let (_dir, manager) = setup();
    let plan = manager
        .plan(&[record("{one}", "https://a.test/"), record("{two}", "https://a.test/")])
        .unwrap();
    assert_eq!(plan.added, 2);
}

#[test]
fn test_write_verified_round_trips() {
    let (_dir, manager) = setup();
    let plan = manager.plan(&[record("{ws}", "https://a.test/")]).unwrap();
    let snapshot = manager.write_verified(&plan).unwrap();
    assert!(!snapshot.existed());

    let reread: Value = mozlz4::read_json_file(manager.path()).unwrap();
    let workspaces = BTreeSet::from(["{ws}".to_string()]);
    assert_eq!(count_tabs(&reread, &workspaces), 1);

    snapshot.restore().unwrap();
    assert!(!manager.path().exists());
}

#[test]
fn test_verification_mismatch_restores_previous_file() {
    let (_dir, manager) = setup();
    mozlz4::write_json_file(manager.path(), &existing_session()).unwrap();
    let before = fs::read(manager.path()).unwrap();

    let mut plan = manager.plan(&[record("{ws}", "https://new.test/")]).unwrap();
    plan.expected += 1;
    let err = manager.write_verified(&plan).unwrap_err();

    assert!(matches!(err, ImportError::VerificationFailed { expected: 3, actual: 2 }));
    assert_eq!(fs::read(manager.path()).unwrap(), before);
}

#[test]
fn test_corrupt_session_is_a_sidecar_error() {
    let (_dir, manager) = setup();
    fs::write(manager.path(), b"not a mozlz4 file").unwrap();
    let err = manager.plan(&[record("{ws}", "https://a.test/")]).unwrap_err();
    assert!(matches!(err, ImportError::Sidecar(_)));
}

#[test]
fn test_count_tabs_only_counts_listed_workspaces() {
    let doc = existing_session();
    assert_eq!(count_tabs(&doc, &BTreeSet::from(["{ws}".to_string()])), 1);
    assert_eq!(count_tabs(&doc, &BTreeSet::new()), 0);
}
