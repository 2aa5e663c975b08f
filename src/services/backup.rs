// arc2zen backups
// Timestamped copies of places.sqlite before a committed import, and in-memory
// snapshots of sidecar files so a failed write can put them back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

/// Copies `db_path` (and its `-wal` file, if any) into `backup_dir` as
/// `places-<YYYYmmdd-HHMMSS>.sqlite`. Returns the backup path.
pub fn backup_database(db_path: &Path, backup_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(backup_dir)?;

    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let mut target = backup_dir.join(format!("places-{}.sqlite", stamp));
    let mut n = 1;
    while target.exists() {
        target = backup_dir.join(format!("places-{}-{}.sqlite", stamp, n));
        n += 1;
    }

    fs::copy(db_path, &target)?;
    let wal = sibling(db_path, "-wal");
    if wal.is_file() {
        fs::copy(&wal, sibling(&target, "-wal"))?;
    }
    info!(backup = %target.display(), "backed up destination database");
    Ok(target)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Contents of a file before it was rewritten.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
    /// `None` when the file did not exist.
    previous: Option<Vec<u8>>,
}

impl FileSnapshot {
    pub fn take(path: &Path) -> io::Result<Self> {
        let previous = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            path: path.to_path_buf(),
            previous,
        })
    }

    pub fn existed(&self) -> bool {
        self.previous.is_some()
    }

    /// Puts the file back the way it was, deleting it if it did not exist.
    pub fn restore(&self) -> io::Result<()> {
        match &self.previous {
            Some(bytes) => fs::write(&self.path, bytes)?,
            None => match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            },
        }
        debug!(path = %self.path.display(), "restored sidecar");
        Ok(())
    }
}
