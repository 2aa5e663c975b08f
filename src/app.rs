//! Migration orchestrator.
//!
//! [`Migrator`] runs extraction, container planning and the import in order
//! and folds their reports into one [`MigrationReport`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::managers::container_manager::{ContainerManager, ContainerManagerTrait};
use crate::services::importer::{ImportMode, Importer};
use crate::services::sidebar_extractor::{Extraction, SidebarExtractor};
use crate::types::destination::DestinationProfile;
use crate::types::errors::MigrationError;
use crate::types::report::MigrationReport;
use crate::types::settings::MigrationSettings;
use crate::types::tree::ExtractedTree;

pub struct Migrator {
    settings: MigrationSettings,
}

impl Migrator {
    pub fn new(settings: MigrationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    /// Reads the sidebar document at `sidebar_path`.
    pub fn extract(&self, sidebar_path: &Path) -> Result<Extraction, MigrationError> {
        let extractor = SidebarExtractor::new(self.settings.extractor.clone());
        Ok(extractor.extract_file(sidebar_path)?)
    }

    /// Imports an extraction into `profile`.
    ///
    /// An empty tree skips the destination entirely; the report then has no
    /// import section.
    pub fn import(
        &self,
        extraction: Extraction,
        profile: &DestinationProfile,
        overrides: &BTreeMap<String, i64>,
        mode: ImportMode,
    ) -> Result<MigrationReport, MigrationError> {
        let Extraction { tree, report } = extraction;
        if tree.is_empty() {
            info!("nothing to import");
            return Ok(MigrationReport {
                extraction: report,
                import: None,
                workspace_mapping: BTreeMap::new(),
            });
        }

        let containers = ContainerManager::new(&profile.containers_path(), &self.settings.importer);
        let plan = containers.plan(&tree, overrides)?;
        let outcome = Importer::new(&self.settings.importer).import(&tree, &plan, profile, mode)?;

        Ok(MigrationReport {
            extraction: report,
            import: Some(outcome.report),
            workspace_mapping: outcome.workspace_mapping,
        })
    }

    /// Extracts and imports in one call.
    pub fn run(
        &self,
        sidebar_path: &Path,
        profile: &DestinationProfile,
        overrides: &BTreeMap<String, i64>,
        mode: ImportMode,
    ) -> Result<MigrationReport, MigrationError> {
        let extraction = self.extract(sidebar_path)?;
        self.import(extraction, profile, overrides, mode)
    }

    /// Writes the tree as pretty-printed JSON.
    pub fn export_tree(tree: &ExtractedTree, path: &Path) -> Result<(), MigrationError> {
        let json = serde_json::to_string_pretty(tree).map_err(|e| MigrationError::Export(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| MigrationError::Export(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), spaces = tree.spaces.len(), "exported extracted tree");
        Ok(())
    }
}
