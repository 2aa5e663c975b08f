//! Container Manager.
//!
//! Reads `containers.json`, matches each space to a container identity by
//! name and plans the identities that have to be created. The plan is
//! applied by the importer as part of its commit.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Map;
use tracing::{debug, info};

use crate::services::theme_engine::{ThemeEngine, ThemeEngineTrait};
use crate::types::destination::{ContainerIdentity, ContainersFile};
use crate::types::errors::ContainerError;
use crate::types::report::ContainerResolution;
use crate::types::settings::ImportSettings;
use crate::types::tree::ExtractedTree;

/// Space name -> container id, plus the `containers.json` rewrite it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerPlan {
    pub path: PathBuf,
    /// Keyed by lowercased space name.
    mapping: BTreeMap<String, (i64, ContainerResolution)>,
    /// Final document; written only when `pending` is set.
    pub document: ContainersFile,
    pub pending: bool,
    pub created: Vec<String>,
}

impl ContainerPlan {
    /// A plan that only maps names and never rewrites the file.
    pub fn from_mapping<I>(path: PathBuf, mapping: I) -> Self
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        Self {
            path,
            mapping: mapping
                .into_iter()
                .map(|(name, id)| (name.to_lowercase(), (id, ContainerResolution::Reused)))
                .collect(),
            document: ContainersFile::default(),
            pending: false,
            created: Vec::new(),
        }
    }

    pub fn resolve(&self, space_name: &str) -> Option<(i64, ContainerResolution)> {
        self.mapping.get(&space_name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Trait defining container identity operations.
pub trait ContainerManagerTrait {
    fn load(&self) -> Result<ContainersFile, ContainerError>;
    fn plan(
        &self,
        tree: &ExtractedTree,
        overrides: &BTreeMap<String, i64>,
    ) -> Result<ContainerPlan, ContainerError>;
}

pub struct ContainerManager<'a> {
    path: PathBuf,
    settings: &'a ImportSettings,
    theme: ThemeEngine,
}

impl<'a> ContainerManager<'a> {
    pub fn new(path: &Path, settings: &'a ImportSettings) -> Self {
        Self {
            path: path.to_path_buf(),
            settings,
            theme: ThemeEngine::new(settings.theme.clone()),
        }
    }

    fn palette_entry(list: &[String], index: usize, fallback: &str) -> String {
        if list.is_empty() {
            return fallback.to_string();
        }
        list[index % list.len()].clone()
    }
}

impl<'a> ContainerManagerTrait for ContainerManager<'a> {
    /// Reads `containers.json`; a missing file yields the default document.
    fn load(&self) -> Result<ContainersFile, ContainerError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no containers file; using defaults");
                return Ok(ContainersFile::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| ContainerError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Maps every space to a container: explicit overrides first, then an
    /// identity whose name matches case-insensitively, else a new identity.
    fn plan(
        &self,
        tree: &ExtractedTree,
        overrides: &BTreeMap<String, i64>,
    ) -> Result<ContainerPlan, ContainerError> {
        let mut document = self.load()?;
        let mut mapping: BTreeMap<String, (i64, ContainerResolution)> = overrides
            .iter()
            .map(|(name, id)| (name.to_lowercase(), (*id, ContainerResolution::Reused)))
            .collect();
        let mut created = Vec::new();
        let base_count = document.identities.len();

        for space in &tree.spaces {
            let key = space.name.to_lowercase();
            if mapping.contains_key(&key) {
                continue;
            }
            if let Some(identity) = document
                .identities
                .iter()
                .find(|i| i.display_name().to_lowercase() == key)
            {
                debug!(space = %space.name, id = identity.user_context_id, "matched existing container");
                mapping.insert(key, (identity.user_context_id, ContainerResolution::Reused));
                continue;
            }

            let max_id = document
                .identities
                .iter()
                .map(|i| i.user_context_id)
                .max()
                .unwrap_or(0);
            let id = document.last_user_context_id.max(max_id) + 1;
            let slot = base_count + created.len();
            let color = match &space.color {
                Some(c) => self.theme.nearest_container_color(c).to_string(),
                None => Self::palette_entry(&self.settings.container_colors, slot, "blue"),
            };
            document.identities.push(ContainerIdentity {
                user_context_id: id,
                name: Some(space.name.clone()),
                icon: Self::palette_entry(&self.settings.container_icons, slot, "fingerprint"),
                color,
                l10n_id: None,
                public: true,
                extra: Map::new(),
            });
            document.last_user_context_id = id;
            info!(space = %space.name, id, "planned new container");
            mapping.insert(key, (id, ContainerResolution::Created));
            created.push(space.name.clone());
        }

        Ok(ContainerPlan {
            path: self.path.clone(),
            mapping,
            document,
            pending: !created.is_empty(),
            created,
        })
    }
}

/// Replaces the whole file through a temporary sibling.
pub fn write_containers_file(path: &Path, document: &ContainersFile) -> Result<(), ContainerError> {
    let json = serde_json::to_string(document).map_err(|e| ContainerError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Parses `NAME=ID` pairs as given on the command line.
pub fn parse_mapping_arg(arg: &str) -> Result<(String, i64), String> {
    let (name, id) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=ID, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty space name in '{}'", arg));
    }
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| format!("container id must be an integer in '{}'", arg))?;
    Ok((name.to_string(), id))
}
