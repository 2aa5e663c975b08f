//! Relational importer.
//!
//! Writes an [`ExtractedTree`] into a destination profile: one workspace per
//! space, the pinned-tab tree in `zen_pins`, a mirrored bookmark tree under the
//! unfiled root, and the `containers.json` / session sidecars. Everything runs
//! inside one exclusive transaction; a dry run executes the same pipeline and
//! rolls it back, with sidecar writes staged instead of performed.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rusqlite::{Savepoint, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::database::{schema, Database};
use crate::managers::bookmark_manager::BookmarkManager;
use crate::managers::container_manager::{write_containers_file, ContainerPlan};
use crate::managers::pin_manager::{PinManager, PinManagerTrait};
use crate::managers::session_manager::{SessionManager, SessionManagerTrait, SessionPlan};
use crate::managers::workspace_manager::{WorkspaceManager, WorkspaceManagerTrait};
use crate::managers::{SpaceTarget, SpaceTreeWriter};
use crate::services::backup::{backup_database, FileSnapshot};
use crate::services::theme_engine::{ThemeEngine, ThemeEngineTrait};
use crate::types::destination::{ContainersFile, DestinationProfile, PinnedTabRecord};
use crate::types::errors::ImportError;
use crate::types::report::{
    ContainerResolution, ImportOutcome, ImportReport, SessionOutcome, SpaceOutcome, StagedWrite,
};
use crate::types::settings::ImportSettings;
use crate::types::tree::ExtractedTree;

/// Whether the run keeps its changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    #[default]
    Commit,
    DryRun,
}

// === Sidecar sinks ===

/// Persistence boundary for files outside the database.
pub trait WriteSink {
    /// Returns whether the file was actually written.
    fn write_containers(&mut self, path: &Path, document: &ContainersFile) -> Result<bool, ImportError>;
    fn write_session(
        &mut self,
        manager: &SessionManager,
        plan: &SessionPlan,
    ) -> Result<SessionOutcome, ImportError>;
    /// Undoes every write made through this sink.
    fn restore(&mut self);
    fn staged(&self) -> Vec<StagedWrite>;
}

/// Writes sidecars to disk, keeping a snapshot of each file it replaces.
#[derive(Debug, Default)]
pub struct FileSink {
    snapshots: Vec<FileSnapshot>,
}

impl WriteSink for FileSink {
    fn write_containers(&mut self, path: &Path, document: &ContainersFile) -> Result<bool, ImportError> {
        let snapshot = FileSnapshot::take(path)?;
        write_containers_file(path, document)?;
        self.snapshots.push(snapshot);
        info!(path = %path.display(), identities = document.identities.len(), "containers file written");
        Ok(true)
    }

    fn write_session(
        &mut self,
        manager: &SessionManager,
        plan: &SessionPlan,
    ) -> Result<SessionOutcome, ImportError> {
        let snapshot = manager.write_verified(plan)?;
        self.snapshots.push(snapshot);
        Ok(SessionOutcome::Updated { added: plan.added })
    }

    fn restore(&mut self) {
        while let Some(snapshot) = self.snapshots.pop() {
            if let Err(e) = snapshot.restore() {
                warn!(error = %e, "failed to restore sidecar");
            }
        }
    }

    fn staged(&self) -> Vec<StagedWrite> {
        Vec::new()
    }
}

/// Records the writes a commit would make and touches nothing.
#[derive(Debug, Default)]
pub struct StagingSink {
    writes: Vec<StagedWrite>,
}

impl WriteSink for StagingSink {
    fn write_containers(&mut self, path: &Path, document: &ContainersFile) -> Result<bool, ImportError> {
        self.writes.push(StagedWrite {
            path: path.to_path_buf(),
            description: format!("{} container identities", document.identities.len()),
        });
        Ok(false)
    }

    fn write_session(
        &mut self,
        manager: &SessionManager,
        plan: &SessionPlan,
    ) -> Result<SessionOutcome, ImportError> {
        self.writes.push(StagedWrite {
            path: manager.path().to_path_buf(),
            description: format!("{} pinned tabs added", plan.added),
        });
        Ok(SessionOutcome::Staged { added: plan.added })
    }

    fn restore(&mut self) {
        self.writes.clear();
    }

    fn staged(&self) -> Vec<StagedWrite> {
        self.writes.clone()
    }
}

// === Importer ===

pub struct Importer<'a> {
    settings: &'a ImportSettings,
    theme: ThemeEngine,
}

impl<'a> Importer<'a> {
    pub fn new(settings: &'a ImportSettings) -> Self {
        Self {
            settings,
            theme: ThemeEngine::new(settings.theme.clone()),
        }
    }

    /// Imports `tree` into the profile at `dest`.
    ///
    /// # Errors
    /// Precondition failures are returned before anything is written. Any
    /// later failure rolls the transaction back and restores the sidecars.
    pub fn import(
        &self,
        tree: &ExtractedTree,
        plan: &ContainerPlan,
        dest: &DestinationProfile,
        mode: ImportMode,
    ) -> Result<ImportOutcome, ImportError> {
        let places_path = dest.places_path();
        let mut db = Database::open_destination(&places_path)?;

        let mut report = ImportReport {
            dry_run: mode == ImportMode::DryRun,
            ..ImportReport::default()
        };

        if mode == ImportMode::Commit {
            let dir = self
                .settings
                .backup_dir
                .clone()
                .unwrap_or_else(|| dest.default_backup_dir());
            match backup_database(&places_path, &dir) {
                Ok(path) => report.backup_path = Some(path),
                Err(e) => {
                    warn!(error = %e, "backup failed; continuing without one");
                    report.warnings.push(format!("Backup failed: {}", e));
                }
            }
        }

        let mut sink: Box<dyn WriteSink> = match mode {
            ImportMode::Commit => Box::new(FileSink::default()),
            ImportMode::DryRun => Box::new(StagingSink::default()),
        };

        let mut tx = db
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Exclusive)?;
        let track_workspaces = schema::table_exists(&tx, "zen_workspaces_changes")?;
        let track_pins = schema::table_exists(&tx, "zen_pins_changes")?;
        let root = schema::unfiled_root_id(&tx)?
            .ok_or_else(|| ImportError::MissingBookmarkRoot(schema::UNFILED_ROOT_GUID.to_string()))?;

        let mut workspace_mapping = BTreeMap::new();
        let mut targets: Vec<(String, i64)> = Vec::with_capacity(tree.spaces.len());
        {
            let mut workspaces = WorkspaceManager::new(&tx, track_workspaces);
            for space in &tree.spaces {
                let (container_id, resolution) = self.resolve_container(plan, &space.name, &mut report);
                let theme = space.color.as_ref().map(|c| self.theme.workspace_theme(c));
                let (workspace, created) = workspaces.ensure_workspace(
                    &space.name,
                    container_id,
                    space.icon.as_deref(),
                    theme.as_ref(),
                )?;
                info!(
                    space = %space.name,
                    uuid = %workspace.uuid,
                    created,
                    "workspace resolved"
                );
                workspace_mapping.insert(space.name.clone(), workspace.uuid.clone());
                targets.push((workspace.uuid.clone(), container_id));
                report.spaces.push(SpaceOutcome {
                    space: space.name.clone(),
                    workspace_uuid: workspace.uuid,
                    workspace_created: created,
                    container_id,
                    container: resolution,
                    pin_folders: Default::default(),
                    pins: Default::default(),
                    bookmark_folders: Default::default(),
                    bookmarks: Default::default(),
                });
            }
        }

        // Both paths always run so a failure report covers each of them.
        let (pins_result, created_pins, records) = {
            let sp = tx.savepoint()?;
            let mut pins = PinManager::new(&sp, track_pins);
            let result = write_tree(&mut pins, tree, &targets, &mut report.spaces);
            let created = pins.created_uuids().clone();
            let records = pins.into_records();
            (close_savepoint(sp, result, "pins"), created, records)
        };
        let bookmarks_result = {
            let sp = tx.savepoint()?;
            let mut bookmarks = BookmarkManager::new(&sp, root);
            let result = write_tree(&mut bookmarks, tree, &targets, &mut report.spaces);
            report.places = bookmarks.place_counts();
            close_savepoint(sp, result, "bookmarks")
        };
        if let Err(e) = pins_result.and(bookmarks_result) {
            return Err(abort(tx, sink.as_mut(), e));
        }

        if let Err(e) = check_integrity(&tx, &created_pins) {
            return Err(abort(tx, sink.as_mut(), e));
        }

        if let Err(e) = self.write_sidecars(sink.as_mut(), plan, dest, &records, &mut report) {
            return Err(abort(tx, sink.as_mut(), e));
        }

        match mode {
            ImportMode::DryRun => {
                tx.rollback()?;
                report.staged_writes = sink.staged();
                info!(created = report.created_rows(), "dry run complete; transaction rolled back");
            }
            ImportMode::Commit => {
                if let Err(e) = tx.commit() {
                    warn!(error = %e, "commit failed; restoring sidecars");
                    sink.restore();
                    return Err(e.into());
                }
                info!(
                    created = report.created_rows(),
                    spaces = report.spaces.len(),
                    "import committed"
                );
            }
        }

        Ok(ImportOutcome {
            workspace_mapping,
            report,
        })
    }

    /// Container for `space_name`, falling back to the default id.
    fn resolve_container(
        &self,
        plan: &ContainerPlan,
        space_name: &str,
        report: &mut ImportReport,
    ) -> (i64, ContainerResolution) {
        if let Some(resolved) = plan.resolve(space_name) {
            return resolved;
        }
        let id = self.settings.default_container_id;
        warn!(space = %space_name, container = id, "no container mapping; using default");
        report.warnings.push(format!(
            "No container mapping for space '{}'; using container {}",
            space_name, id
        ));
        (id, ContainerResolution::Fallback)
    }

    fn write_sidecars(
        &self,
        sink: &mut dyn WriteSink,
        plan: &ContainerPlan,
        dest: &DestinationProfile,
        records: &[PinnedTabRecord],
        report: &mut ImportReport,
    ) -> Result<(), ImportError> {
        if plan.pending {
            report.containers_file_written = sink.write_containers(&plan.path, &plan.document)?;
        }

        if !self.settings.update_session || records.is_empty() {
            report.session = SessionOutcome::Skipped;
            return Ok(());
        }
        let session = SessionManager::new(&dest.session_path());
        let session_plan = session.plan(records)?;
        report.session = if session_plan.added == 0 {
            debug!("every pinned tab already in the session");
            SessionOutcome::Unchanged
        } else {
            sink.write_session(&session, &session_plan)?
        };
        Ok(())
    }
}

fn write_tree<W: SpaceTreeWriter>(
    writer: &mut W,
    tree: &ExtractedTree,
    targets: &[(String, i64)],
    outcomes: &mut [SpaceOutcome],
) -> Result<(), ImportError> {
    for ((space, (uuid, container_id)), outcome) in
        tree.spaces.iter().zip(targets).zip(outcomes.iter_mut())
    {
        let target = SpaceTarget {
            workspace_uuid: uuid,
            container_id: *container_id,
        };
        writer.write_space(space, &target, outcome)?;
    }
    Ok(())
}

/// Releases the savepoint on success, rolls it back otherwise.
fn close_savepoint(
    sp: Savepoint<'_>,
    result: Result<(), ImportError>,
    path: &str,
) -> Result<(), ImportError> {
    match result {
        Ok(()) => {
            sp.commit()?;
            Ok(())
        }
        Err(e) => {
            warn!(path, error = %e, "write path failed; rolling back its savepoint");
            sp.finish()?;
            Err(e)
        }
    }
}

/// Pins created in this run must not point at a missing parent.
fn check_integrity(tx: &Transaction<'_>, created: &HashSet<String>) -> Result<(), ImportError> {
    let orphans: Vec<String> = PinManager::new(tx, false)
        .orphaned_pins()?
        .into_iter()
        .filter(|uuid| created.contains(uuid))
        .collect();
    if orphans.is_empty() {
        return Ok(());
    }
    Err(ImportError::Integrity(format!(
        "{} pinned items reference a missing parent: {}",
        orphans.len(),
        orphans.join(", ")
    )))
}

/// Restores sidecars and rolls back, returning the original error.
fn abort(tx: Transaction<'_>, sink: &mut dyn WriteSink, err: ImportError) -> ImportError {
    warn!(error = %err, "import failed; rolling back");
    sink.restore();
    if let Err(e) = tx.rollback() {
        warn!(error = %e, "rollback failed");
    }
    err
}
