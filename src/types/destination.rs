use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// A destination browser profile directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationProfile {
    pub dir: PathBuf,
}

impl DestinationProfile {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn places_path(&self) -> PathBuf {
        self.dir.join("places.sqlite")
    }

    pub fn containers_path(&self) -> PathBuf {
        self.dir.join("containers.json")
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join("sessionstore.jsonlz4")
    }

    pub fn default_backup_dir(&self) -> PathBuf {
        self.dir.join("arc2zen-backups")
    }
}

/// `containers.json` document. Unknown fields survive a read-modify-write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainersFile {
    #[serde(default = "default_containers_version")]
    pub version: u32,
    #[serde(default = "default_last_user_context_id")]
    pub last_user_context_id: i64,
    #[serde(default)]
    pub identities: Vec<ContainerIdentity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_containers_version() -> u32 {
    5
}

fn default_last_user_context_id() -> i64 {
    1
}

impl Default for ContainersFile {
    fn default() -> Self {
        Self {
            version: default_containers_version(),
            last_user_context_id: default_last_user_context_id(),
            identities: vec![ContainerIdentity {
                user_context_id: 1,
                name: None,
                icon: "fingerprint".to_string(),
                color: "blue".to_string(),
                l10n_id: Some("user-context-personal".to_string()),
                public: true,
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }
}

/// One container identity (an isolated cookie/session context).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerIdentity {
    pub user_context_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "l10nId")]
    pub l10n_id: Option<String>,
    #[serde(default = "default_public")]
    pub public: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_public() -> bool {
    true
}

impl ContainerIdentity {
    /// Display name: explicit `name`, else the `l10nId` without its prefix.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.l10n_id
            .as_deref()
            .map(|id| id.trim_start_matches("user-context-").to_string())
            .unwrap_or_default()
    }
}

/// Gradient theme stored on a workspace row.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceTheme {
    pub theme_type: String,
    /// JSON array of color stops.
    pub colors: String,
    pub opacity: f64,
    pub rotation: i64,
    pub texture: f64,
}

/// A `zen_workspaces` row.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub uuid: String,
    pub name: String,
    pub container_id: Option<i64>,
    pub position: i64,
    pub icon: Option<String>,
    pub theme_type: Option<String>,
    pub theme_colors: Option<String>,
}

/// A `zen_pins` row: folders have `is_group` set and no URL.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedItem {
    pub uuid: String,
    pub title: String,
    pub url: Option<String>,
    pub container_id: Option<i64>,
    pub workspace_uuid: Option<String>,
    pub position: i64,
    pub parent_uuid: Option<String>,
    pub is_group: bool,
    pub is_essential: bool,
}

/// A pinned tab written during an import, as the session merge needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedTabRecord {
    pub pin_uuid: String,
    pub workspace_uuid: String,
    pub url: String,
    pub title: String,
    pub container_id: i64,
    pub essential: bool,
}

/// `moz_bookmarks.type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkKind {
    Bookmark,
    Folder,
    Separator,
}

impl BookmarkKind {
    pub fn as_i64(self) -> i64 {
        match self {
            BookmarkKind::Bookmark => 1,
            BookmarkKind::Folder => 2,
            BookmarkKind::Separator => 3,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(BookmarkKind::Bookmark),
            2 => Some(BookmarkKind::Folder),
            3 => Some(BookmarkKind::Separator),
            _ => None,
        }
    }
}

/// A `moz_bookmarks` row.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkNode {
    pub id: i64,
    pub kind: BookmarkKind,
    pub parent: Option<i64>,
    pub position: i64,
    pub title: Option<String>,
    pub fk: Option<i64>,
    pub guid: String,
}
