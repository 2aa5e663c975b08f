use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// How the source document was obtained.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum DocumentStatus {
    #[default]
    Loaded,
    Missing,
    Unparsable,
}

/// How an essential tab found its space.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum AssignmentMethod {
    /// The container profile matched a space profile.
    Profile,
    /// Name-matching heuristic with the winning score.
    Heuristic { score: u32 },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EssentialAssignment {
    pub url: String,
    pub title: String,
    pub space: String,
    pub method: AssignmentMethod,
}

/// An essential tab no space could claim.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OrphanedEssential {
    pub url: String,
    pub title: String,
    pub profile: String,
}

/// Everything the extractor observed, kept, and dropped.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExtractionReport {
    pub document_status: DocumentStatus,
    pub spaces: usize,
    pub folders: usize,
    pub tabs: usize,
    pub essential_tabs: usize,
    pub dropped_tabs_without_url: usize,
    pub skipped_malformed_items: usize,
    /// Spaces whose display order fell back to insertion order.
    pub degraded_order: Vec<String>,
    pub essential_assignments: Vec<EssentialAssignment>,
    pub orphaned_essentials: Vec<OrphanedEssential>,
    pub empty_spaces: Vec<String>,
    pub warnings: Vec<String>,
}

/// Where a space's container id came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ContainerResolution {
    Created,
    Reused,
    /// No mapping entry; the default container was used.
    Fallback,
}

/// Created/reused counters for one kind of row.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RowCounts {
    pub created: usize,
    pub reused: usize,
}

impl RowCounts {
    pub fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.reused += 1;
        }
    }
}

/// Per-space import result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpaceOutcome {
    pub space: String,
    pub workspace_uuid: String,
    pub workspace_created: bool,
    pub container_id: i64,
    pub container: ContainerResolution,
    pub pin_folders: RowCounts,
    pub pins: RowCounts,
    pub bookmark_folders: RowCounts,
    pub bookmarks: RowCounts,
}

impl SpaceOutcome {
    pub fn created_rows(&self) -> usize {
        usize::from(self.workspace_created)
            + self.pin_folders.created
            + self.pins.created
            + self.bookmark_folders.created
            + self.bookmarks.created
    }
}

/// What happened to the session file.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum SessionOutcome {
    #[default]
    Skipped,
    /// Every imported pin was already present.
    Unchanged,
    Updated { added: usize },
    /// Dry run: the write that would have happened.
    Staged { added: usize },
}

/// A sidecar write withheld by a dry run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StagedWrite {
    pub path: PathBuf,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImportReport {
    pub dry_run: bool,
    pub spaces: Vec<SpaceOutcome>,
    pub places: RowCounts,
    pub backup_path: Option<PathBuf>,
    pub containers_file_written: bool,
    pub session: SessionOutcome,
    pub staged_writes: Vec<StagedWrite>,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn created_rows(&self) -> usize {
        self.spaces.iter().map(SpaceOutcome::created_rows).sum::<usize>() + self.places.created
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    /// Space name -> workspace uuid.
    pub workspace_mapping: BTreeMap<String, String>,
    pub report: ImportReport,
}

/// Combined report of one orchestrated run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub extraction: ExtractionReport,
    /// Absent when extraction produced nothing to import.
    pub import: Option<ImportReport>,
    pub workspace_mapping: BTreeMap<String, String>,
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = &self.extraction;
        writeln!(
            f,
            "Extracted {} spaces, {} folders, {} tabs ({} essential)",
            x.spaces, x.folders, x.tabs, x.essential_tabs
        )?;
        if x.dropped_tabs_without_url > 0 || x.skipped_malformed_items > 0 {
            writeln!(
                f,
                "Dropped {} tabs without URL, skipped {} malformed items",
                x.dropped_tabs_without_url, x.skipped_malformed_items
            )?;
        }
        if !x.orphaned_essentials.is_empty() {
            writeln!(f, "Unassigned essential tabs: {}", x.orphaned_essentials.len())?;
        }
        if !x.empty_spaces.is_empty() {
            writeln!(f, "Empty spaces skipped: {}", x.empty_spaces.join(", "))?;
        }
        if !x.degraded_order.is_empty() {
            writeln!(f, "Order taken from item order: {}", x.degraded_order.join(", "))?;
        }
        for warning in &x.warnings {
            writeln!(f, "Warning: {}", warning)?;
        }
        let Some(import) = &self.import else {
            return writeln!(f, "Nothing to import");
        };
        if import.dry_run {
            writeln!(f, "Dry run: no changes were kept")?;
        }
        for s in &import.spaces {
            writeln!(
                f,
                "  {} -> {} (container {}): pins +{}/{} folders +{}/{} bookmarks +{}/{}",
                s.space,
                s.workspace_uuid,
                s.container_id,
                s.pins.created,
                s.pins.reused,
                s.pin_folders.created,
                s.pin_folders.reused,
                s.bookmarks.created,
                s.bookmarks.reused,
            )?;
        }
        if let Some(path) = &import.backup_path {
            writeln!(f, "Backup: {}", path.display())?;
        }
        for staged in &import.staged_writes {
            writeln!(f, "Would write {}: {}", staged.path.display(), staged.description)?;
        }
        for warning in &import.warnings {
            writeln!(f, "Warning: {}", warning)?;
        }
        Ok(())
    }
}
