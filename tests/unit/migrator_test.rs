//! Unit tests for the Migrator orchestrator.
//!
//! Runs the whole pipeline from a sidebar file on disk into a temp profile.

#[path = "../fixtures/mod.rs"]
mod fixtures;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use arc2zen::app::Migrator;
use arc2zen::services::importer::ImportMode;
use arc2zen::types::errors::{ImportError, MigrationError};
use arc2zen::types::report::DocumentStatus;
use arc2zen::types::settings::MigrationSettings;
use arc2zen::types::tree::ExtractedTree;
use fixtures::*;
use serde_json::Value;
use tempfile::TempDir;

fn write_sidebar(dir: &TempDir, doc: &Value) -> PathBuf {
    let path = dir.path().join("StorableSidebar.json");
    fs::write(&path, doc.to_string()).unwrap();
    path
}

#[test]
fn test_run_imports_and_reports() {
    let (dir, profile) = profile();
    let sidebar = write_sidebar(&dir, &two_spaces());
    let migrator = Migrator::new(MigrationSettings::default());

    let report = migrator
        .run(&sidebar, &profile, &BTreeMap::new(), ImportMode::Commit)
        .unwrap();
    assert_eq!(report.extraction.spaces, 2);
    assert_eq!(report.extraction.tabs, 5);
    let import = report.import.as_ref().unwrap();
    assert_eq!(import.spaces.len(), 2);
    assert_eq!(report.workspace_mapping.len(), 2);

    let summary = report.to_string();
    assert!(summary.contains("Extracted 2 spaces, 1 folders, 5 tabs (0 essential)"));
    assert!(summary.contains("Work -> "));
    assert!(summary.contains("Backup: "));
}

#[test]
fn test_empty_tree_skips_destination() {
    let dir = TempDir::new().unwrap();
    let profile = arc2zen::types::destination::DestinationProfile::new(dir.path());
    let migrator = Migrator::new(MigrationSettings::default());

    let report = migrator
        .run(
            &dir.path().join("StorableSidebar.json"),
            &profile,
            &BTreeMap::new(),
            ImportMode::Commit,
        )
        .unwrap();
    assert_eq!(report.extraction.document_status, DocumentStatus::Missing);
    assert!(report.import.is_none());
    assert!(report.to_string().contains("Nothing to import"));
}

#[test]
fn test_dry_run_summary_mentions_staged_writes() {
    let (dir, profile) = profile();
    let sidebar = write_sidebar(&dir, &work_finance());
    let report = Migrator::new(MigrationSettings::default())
        .run(&sidebar, &profile, &BTreeMap::new(), ImportMode::DryRun)
        .unwrap();
    let summary = report.to_string();
    assert!(summary.contains("Dry run"));
    assert!(summary.contains("Would write"));
    assert!(!profile.containers_path().exists());
}

#[test]
fn test_missing_destination_surfaces_import_error() {
    let dir = TempDir::new().unwrap();
    let sidebar = write_sidebar(&dir, &work_finance());
    let profile = arc2zen::types::destination::DestinationProfile::new(dir.path());
    let err = Migrator::new(MigrationSettings::default())
        .run(&sidebar, &profile, &BTreeMap::new(), ImportMode::Commit)
        .unwrap_err();
    assert!(matches!(
        err,
        MigrationError::Import(ImportError::DestinationMissing(_))
    ));
}

#[test]
fn test_overrides_reach_the_importer() {
    let (dir, profile) = profile();
    let sidebar = write_sidebar(&dir, &work_finance());
    let overrides = BTreeMap::from([("Work".to_string(), 42)]);
    let report = Migrator::new(MigrationSettings::default())
        .run(&sidebar, &profile, &overrides, ImportMode::Commit)
        .unwrap();
    assert_eq!(report.import.unwrap().spaces[0].container_id, 42);
}

#[test]
fn test_export_tree_writes_json() {
    let dir = TempDir::new().unwrap();
    let sidebar = write_sidebar(&dir, &work_finance());
    let migrator = Migrator::new(MigrationSettings::default());
    let extraction = migrator.extract(&sidebar).unwrap();

    let out = dir.path().join("tree.json");
    Migrator::export_tree(&extraction.tree, &out).unwrap();
    let parsed: ExtractedTree = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed, extraction.tree);
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let err = Migrator::export_tree(&ExtractedTree::default(), &dir.path().join("no/such/tree.json"))
        .unwrap_err();
    assert!(matches!(err, MigrationError::Export(_)));
}
