use serde::{Deserialize, Serialize};

/// RGB color carried by a source space, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpaceColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl SpaceColor {
    /// Builds a color, clamping every channel independently into `[0, 1]`.
    ///
    /// Non-finite channels are treated as 0.
    pub fn clamped(r: f64, g: f64, b: f64) -> Self {
        fn unit(v: f64) -> f64 {
            if v.is_finite() {
                v.clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
        Self {
            r: unit(r),
            g: unit(g),
            b: unit(b),
        }
    }
}

/// A folder inside a space's pinned area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderNode {
    pub id: String,
    pub title: String,
    /// Enclosing folder, `None` for the space root.
    pub parent_id: Option<String>,
    pub space_id: String,
    pub position: usize,
    pub children: Vec<String>,
}

/// A pinned or essential tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabNode {
    pub id: String,
    pub url: String,
    pub title: String,
    pub space_id: String,
    /// Immediate parent folder, `None` at the space root.
    pub folder_id: Option<String>,
    /// Ancestor folder titles, root to leaf.
    pub folder_path: Vec<String>,
    pub position: usize,
    pub essential: bool,
}

/// One logical workspace of the source browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpaceNode {
    pub id: String,
    pub name: String,
    pub position: usize,
    pub icon: Option<String>,
    pub color: Option<SpaceColor>,
    pub profile: Option<String>,
    pub folders: Vec<FolderNode>,
    pub tabs: Vec<TabNode>,
}

/// Borrowed view of a space entry in display order.
#[derive(Debug, Clone, Copy)]
pub enum SpaceEntry<'a> {
    Folder(&'a FolderNode),
    Tab(&'a TabNode),
}

impl<'a> SpaceEntry<'a> {
    pub fn position(&self) -> usize {
        match self {
            SpaceEntry::Folder(f) => f.position,
            SpaceEntry::Tab(t) => t.position,
        }
    }
}

impl SpaceNode {
    /// Folders and tabs merged by their shared ordinal.
    ///
    /// The sort is stable, so equal ordinals keep folders before tabs.
    pub fn entries(&self) -> Vec<SpaceEntry<'_>> {
        let mut entries: Vec<SpaceEntry<'_>> = self
            .folders
            .iter()
            .map(SpaceEntry::Folder)
            .chain(self.tabs.iter().map(SpaceEntry::Tab))
            .collect();
        entries.sort_by_key(|e| e.position());
        entries
    }

    pub fn folder(&self, id: &str) -> Option<&FolderNode> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn essential_count(&self) -> usize {
        self.tabs.iter().filter(|t| t.essential).count()
    }
}

/// Complete output of one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedTree {
    pub spaces: Vec<SpaceNode>,
}

impl ExtractedTree {
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn tab_count(&self) -> usize {
        self.spaces.iter().map(|s| s.tabs.len()).sum()
    }

    pub fn folder_count(&self) -> usize {
        self.spaces.iter().map(|s| s.folders.len()).sum()
    }

    pub fn space(&self, name: &str) -> Option<&SpaceNode> {
        self.spaces.iter().find(|s| s.name == name)
    }
}
