//! Session Manager.
//!
//! Injects imported pinned tabs into `sessionstore.jsonlz4` so they show up as
//! open pinned tabs in their workspaces. The file is read and written through
//! the mozLz4 codec and re-read after every write to verify it.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::now_millis;
use crate::services::backup::FileSnapshot;
use crate::services::mozlz4;
use crate::types::destination::PinnedTabRecord;
use crate::types::errors::{CodecError, ImportError};

/// Merged session document and the counts verification will check.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub document: Value,
    pub added: usize,
    /// Tabs in the imported workspaces after the merge.
    pub expected: usize,
    pub workspaces: BTreeSet<String>,
}

/// Trait defining session file operations.
pub trait SessionManagerTrait {
    fn has_session(&self) -> bool;
    fn load(&self) -> Result<Value, CodecError>;
    fn plan(&self, records: &[PinnedTabRecord]) -> Result<SessionPlan, ImportError>;
    /// Writes the plan, re-reads it and checks the tab count. Returns the
    /// pre-write snapshot so the caller can undo the write later.
    fn write_verified(&self, plan: &SessionPlan) -> Result<FileSnapshot, ImportError>;
}

pub struct SessionManager {
    path: PathBuf,
}

impl SessionManager {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn skeleton() -> Value {
        let now = now_millis();
        json!({
            "version": ["sessionrestore", 1],
            "windows": [{"tabs": [], "selected": 1, "_closedTabs": []}],
            "selectedWindow": 1,
            "_closedWindows": [],
            "session": {"lastUpdate": now, "startTime": now, "recentCrashes": 0},
            "global": {}
        })
    }

    fn tab_entry(record: &PinnedTabRecord) -> Value {
        json!({
            "entries": [{
                "url": record.url,
                "title": record.title,
                "charset": "UTF-8",
                "persist": true
            }],
            "lastAccessed": now_millis(),
            "hidden": false,
            "attributes": {},
            "index": 1,
            "userContextId": record.container_id,
            "pinned": true,
            "zenWorkspace": record.workspace_uuid,
            "zenPinnedId": record.pin_uuid,
            "zenEssential": record.essential,
            "image": null
        })
    }
}

/// URL of the tab's current history entry.
fn tab_url(tab: &Value) -> Option<&str> {
    let entries = tab.get("entries")?.as_array()?;
    let index = tab
        .get("index")
        .and_then(Value::as_u64)
        .map(|i| i as usize)
        .filter(|i| *i >= 1 && *i <= entries.len())
        .unwrap_or(entries.len());
    entries.get(index.checked_sub(1)?)?.get("url")?.as_str()
}

fn all_tabs(document: &Value) -> impl Iterator<Item = &Value> {
    document
        .get("windows")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|w| w.get("tabs").and_then(Value::as_array))
        .flatten()
}

/// Tabs whose `zenWorkspace` is one of `workspaces`.
pub fn count_tabs(document: &Value, workspaces: &BTreeSet<String>) -> usize {
    all_tabs(document)
        .filter(|tab| {
            tab.get("zenWorkspace")
                .and_then(Value::as_str)
                .is_some_and(|ws| workspaces.contains(ws))
        })
        .count()
}

impl SessionManagerTrait for SessionManager {
    fn has_session(&self) -> bool {
        self.path.is_file()
    }

    /// Decodes the session file, or returns a minimal skeleton if there is none.
    fn load(&self) -> Result<Value, CodecError> {
        if !self.has_session() {
            debug!(path = %self.path.display(), "no session file; starting from skeleton");
            return Ok(Self::skeleton());
        }
        mozlz4::read_json_file(&self.path)
    }

    /// Ensures one pinned tab per record, keyed by `(zenWorkspace, url)`.
    fn plan(&self, records: &[PinnedTabRecord]) -> Result<SessionPlan, ImportError> {
        let mut document = self.load()?;
        if !document.is_object() {
            return Err(ImportError::Sidecar(format!(
                "session file {} is not a JSON object",
                self.path.display()
            )));
        }
        let mut present: HashSet<(String, String)> = all_tabs(&document)
            .filter_map(|tab| {
                let ws = tab.get("zenWorkspace")?.as_str()?;
                Some((ws.to_string(), tab_url(tab)?.to_string()))
            })
            .collect();

        let mut new_tabs = Vec::new();
        for record in records {
            let key = (record.workspace_uuid.clone(), record.url.clone());
            if present.insert(key) {
                new_tabs.push(Self::tab_entry(record));
            }
        }
        let added = new_tabs.len();

        if added > 0 {
            if !document.get("windows").is_some_and(Value::is_array) {
                document["windows"] = json!([]);
            }
            if let Some(windows) = document["windows"].as_array_mut() {
                if windows.is_empty() {
                    windows.push(json!({"tabs": [], "selected": 1, "_closedTabs": []}));
                }
                let window = &mut windows[0];
                if !window.is_object() {
                    *window = json!({"tabs": [], "selected": 1, "_closedTabs": []});
                }
                if !window.get("tabs").is_some_and(Value::is_array) {
                    window["tabs"] = json!([]);
                }
                if let Some(tabs) = window["tabs"].as_array_mut() {
                    tabs.extend(new_tabs);
                }
            }
        }

        let workspaces: BTreeSet<String> = records.iter().map(|r| r.workspace_uuid.clone()).collect();
        let expected = count_tabs(&document, &workspaces);
        Ok(SessionPlan {
            document,
            added,
            expected,
            workspaces,
        })
    }

    fn write_verified(&self, plan: &SessionPlan) -> Result<FileSnapshot, ImportError> {
        let snapshot = FileSnapshot::take(&self.path)?;
        mozlz4::write_json_file(&self.path, &plan.document)?;

        let check = mozlz4::read_json_file::<Value>(&self.path)
            .map(|reread| count_tabs(&reread, &plan.workspaces));
        match check {
            Ok(actual) if actual == plan.expected => {
                info!(path = %self.path.display(), added = plan.added, "session updated");
                Ok(snapshot)
            }
            Ok(actual) => {
                warn!(expected = plan.expected, actual, "session verification failed; restoring");
                snapshot.restore()?;
                Err(ImportError::VerificationFailed {
                    expected: plan.expected,
                    actual,
                })
            }
            Err(e) => {
                warn!(error = %e, "session re-read failed; restoring");
                snapshot.restore()?;
                Err(e.into())
            }
        }
    }
}
