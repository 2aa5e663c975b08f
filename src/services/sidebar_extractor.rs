// arc2zen Sidebar Extractor
// Turns the source browser's StorableSidebar.json into an ExtractedTree: spaces,
// their nested folders and pinned tabs in display order, and essential tabs
// distributed to the space that owns their profile.
//
// Format problems never fail extraction. They degrade to a best-effort tree
// and are counted in the ExtractionReport.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::services::essential_scoring::{EssentialScorer, ScoreOutcome, ScoredTab};
use crate::types::errors::ExtractError;
use crate::types::report::{
    AssignmentMethod, DocumentStatus, EssentialAssignment, ExtractionReport, OrphanedEssential,
};
use crate::types::settings::ExtractorSettings;
use crate::types::tree::{ExtractedTree, FolderNode, SpaceColor, SpaceNode, TabNode};

/// Tree plus the report of how it was obtained.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tree: ExtractedTree,
    pub report: ExtractionReport,
}

impl Extraction {
    fn empty(status: DocumentStatus, warning: String) -> Self {
        let mut report = ExtractionReport {
            document_status: status,
            ..ExtractionReport::default()
        };
        report.warnings.push(warning);
        Self {
            tree: ExtractedTree::default(),
            report,
        }
    }
}

// === Items lookup ===

#[derive(Debug, Clone, PartialEq)]
enum ItemKind {
    Tab { url: String, saved_title: Option<String> },
    Folder,
    /// `top_apps` is `Some` for an essential-tab container; the inner value
    /// is its declared profile, if readable.
    Container { top_apps: Option<Option<String>> },
    Other,
}

#[derive(Debug, Clone)]
struct Item {
    id: String,
    title: Option<String>,
    parent_id: Option<String>,
    children: Vec<String>,
    kind: ItemKind,
}

/// Insertion-ordered `id -> Item` map, built in one pass.
#[derive(Debug, Default)]
struct ItemIndex {
    items: Vec<Item>,
    by_id: HashMap<String, usize>,
}

impl ItemIndex {
    fn insert(&mut self, item: Item) {
        match self.by_id.get(&item.id) {
            Some(&slot) => self.items[slot] = item,
            None => {
                self.by_id.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&Item> {
        self.by_id.get(id).map(|&slot| &self.items[slot])
    }

    fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}

// === Space registry ===

#[derive(Debug, Clone)]
struct SpaceInfo {
    id: String,
    name: String,
    icon: Option<String>,
    color: Option<SpaceColor>,
    profile: Option<String>,
    /// Real container ids from the sidebar descriptor, with their marker.
    containers: Vec<(String, Marker)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Pinned,
    Unpinned,
    Unmarked,
}

/// Extracts a source sidebar document into an [`ExtractedTree`].
pub struct SidebarExtractor {
    settings: ExtractorSettings,
}

impl SidebarExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Reads and extracts the document at `path`.
    ///
    /// A missing file yields an empty tree with [`DocumentStatus::Missing`];
    /// only other I/O failures are errors.
    pub fn extract_file(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "sidebar document not found");
                return Ok(Extraction::empty(
                    DocumentStatus::Missing,
                    format!("sidebar document not found: {}", path.display()),
                ));
            }
            Err(source) => {
                return Err(ExtractError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        info!(path = %path.display(), bytes = bytes.len(), "loaded sidebar document");
        Ok(self.extract_bytes(&bytes))
    }

    pub fn extract_str(&self, raw: &str) -> Extraction {
        self.extract_bytes(raw.as_bytes())
    }

    fn extract_bytes(&self, raw: &[u8]) -> Extraction {
        match serde_json::from_slice::<Value>(raw) {
            Ok(doc) if doc.is_object() => self.extract_document(&doc),
            Ok(_) => {
                warn!("sidebar document root is not an object");
                Extraction::empty(
                    DocumentStatus::Unparsable,
                    "sidebar document root is not an object".to_string(),
                )
            }
            Err(e) => {
                warn!(error = %e, "sidebar document is not valid JSON");
                Extraction::empty(
                    DocumentStatus::Unparsable,
                    format!("sidebar document is not valid JSON: {}", e),
                )
            }
        }
    }

    /// Extracts an already-parsed document.
    pub fn extract_document(&self, doc: &Value) -> Extraction {
        let mut report = ExtractionReport::default();

        let index = build_index(doc, &mut report.skipped_malformed_items);
        let spaces = self.build_registry(doc, &mut report.skipped_malformed_items);
        debug!(items = index.items.len(), spaces = spaces.len(), "indexed sidebar");

        let mut nodes: Vec<SpaceNode> = spaces
            .iter()
            .map(|info| self.materialize_space(info, &index, &mut report))
            .collect();

        self.distribute_essentials(&spaces, &index, &mut nodes, &mut report);

        let mut tree = ExtractedTree::default();
        for node in nodes {
            if node.tabs.is_empty() && node.folders.is_empty() {
                debug!(space = %node.name, "omitting empty space");
                report.empty_spaces.push(node.name);
                continue;
            }
            tree.spaces.push(SpaceNode {
                position: tree.spaces.len(),
                ..node
            });
        }

        report.spaces = tree.spaces.len();
        report.folders = tree.folder_count();
        report.tabs = tree.tab_count();
        report.essential_tabs = tree.spaces.iter().map(SpaceNode::essential_count).sum();
        info!(
            spaces = report.spaces,
            folders = report.folders,
            tabs = report.tabs,
            essential = report.essential_tabs,
            dropped = report.dropped_tabs_without_url,
            malformed = report.skipped_malformed_items,
            "extraction finished"
        );

        Extraction { tree, report }
    }

    /// Spaces in display order: sidebar descriptors first, then spaces only
    /// known from the sync models, in discovery order.
    fn build_registry(&self, doc: &Value, malformed: &mut usize) -> Vec<SpaceInfo> {
        let models = doc
            .pointer("/firebaseSyncState/syncData/spaceModels")
            .and_then(Value::as_array)
            .map(|arr| collect_pairs(arr, malformed))
            .unwrap_or_default();

        let mut registry: Vec<SpaceInfo> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        for (id, model) in models {
            if by_id.contains_key(&id) {
                continue;
            }
            by_id.insert(id.clone(), registry.len());
            registry.push(self.space_from_model(id, model));
        }

        let descriptors = sidebar_container(doc, "spaces")
            .map(|arr| collect_pairs(arr, malformed))
            .unwrap_or_default();

        let mut ordered: Vec<SpaceInfo> = Vec::with_capacity(registry.len());
        let mut placed: HashSet<String> = HashSet::new();
        for (id, descriptor) in descriptors {
            if !placed.insert(id.clone()) {
                continue;
            }
            let mut info = match by_id.get(&id) {
                Some(&slot) => registry[slot].clone(),
                None => {
                    let name = non_empty_str(descriptor.get("title"))
                        .unwrap_or_else(|| format!("Space {}", id));
                    let profile = self.personal_profile(&name);
                    SpaceInfo {
                        id: id.clone(),
                        name,
                        icon: None,
                        color: None,
                        profile,
                        containers: Vec::new(),
                    }
                }
            };
            info.containers = classify_containers(descriptor.get("containerIDs"));
            ordered.push(info);
        }

        for info in registry {
            if !placed.contains(&info.id) {
                ordered.push(info);
            }
        }
        ordered
    }

    fn space_from_model(&self, id: String, model: &Value) -> SpaceInfo {
        let name = non_empty_str(model.get("title")).unwrap_or_else(|| format!("Space {}", id));
        let icon = non_empty_str(model.pointer("/customInfo/iconType/emoji_v2"));
        let color = model
            .pointer("/customInfo/windowTheme/primaryColorPalette/midTone")
            .and_then(|tone| {
                let r = tone.get("red")?.as_f64()?;
                let g = tone.get("green")?.as_f64()?;
                let b = tone.get("blue")?.as_f64()?;
                Some(SpaceColor::clamped(r, g, b))
            });

        let profile = match model.get("profile") {
            Some(profile) => self.profile_name(profile),
            None => None,
        }
        .or_else(|| self.personal_profile(&name));

        SpaceInfo {
            id,
            name,
            icon,
            color,
            profile,
            containers: Vec::new(),
        }
    }

    /// `{custom: {_0: {directoryBasename}}}` or `{default: {}}`.
    fn profile_name(&self, profile: &Value) -> Option<String> {
        if let Some(custom) = profile.get("custom") {
            return non_empty_str(unwrap_zero(custom).get("directoryBasename"));
        }
        if profile.get("default").is_some() {
            return Some(self.settings.default_profile.clone());
        }
        None
    }

    fn personal_profile(&self, name: &str) -> Option<String> {
        (name == self.settings.personal_space_name).then(|| self.settings.default_profile.clone())
    }

    fn materialize_space(
        &self,
        info: &SpaceInfo,
        index: &ItemIndex,
        report: &mut ExtractionReport,
    ) -> SpaceNode {
        let mut space = SpaceNode {
            id: info.id.clone(),
            name: info.name.clone(),
            position: 0,
            icon: info.icon.clone(),
            color: info.color,
            profile: info.profile.clone(),
            folders: Vec::new(),
            tabs: Vec::new(),
        };

        let owner = SpaceOwnership::new(info, index);
        let order = match display_order(info, index) {
            Some(order) => order,
            None => {
                let fallback = owner.top_level_items();
                if !fallback.is_empty() {
                    warn!(space = %info.name, items = fallback.len(), "no declared display order; using item order");
                    report.degraded_order.push(info.name.clone());
                }
                fallback
            }
        };

        let mut walk = Walk {
            index,
            owner: &owner,
            visited: HashSet::new(),
            next_position: 0,
        };
        walk.materialize(&order, None, &[], &mut space, report);
        debug!(
            space = %space.name,
            folders = space.folders.len(),
            tabs = space.tabs.len(),
            "materialized space"
        );
        space
    }

    fn distribute_essentials(
        &self,
        spaces: &[SpaceInfo],
        index: &ItemIndex,
        nodes: &mut [SpaceNode],
        report: &mut ExtractionReport,
    ) {
        let mut profile_to_space: HashMap<&str, usize> = HashMap::new();
        for (slot, info) in spaces.iter().enumerate() {
            if let Some(profile) = info.profile.as_deref() {
                profile_to_space.entry(profile).or_insert(slot);
            }
        }
        let candidates: Vec<&str> = spaces.iter().map(|s| s.name.as_str()).collect();
        let scorer = EssentialScorer::new(&self.settings);

        for container in index.iter() {
            let ItemKind::Container {
                top_apps: Some(profile),
            } = &container.kind
            else {
                continue;
            };

            let tabs: Vec<(String, String)> = container
                .children
                .iter()
                .filter_map(|child| index.get(child))
                .filter_map(|item| match &item.kind {
                    ItemKind::Tab { url, saved_title } => {
                        if url.trim().is_empty() {
                            report.dropped_tabs_without_url += 1;
                            return None;
                        }
                        let title = tab_title(item.title.as_deref(), saved_title.as_deref(), url);
                        Some((url.clone(), title))
                    }
                    _ => None,
                })
                .collect();
            if tabs.is_empty() {
                continue;
            }

            let by_profile = profile
                .as_deref()
                .and_then(|p| profile_to_space.get(p).copied());
            let target = match by_profile {
                Some(slot) => Some((slot, AssignmentMethod::Profile)),
                None => {
                    let scored: Vec<ScoredTab<'_>> = tabs
                        .iter()
                        .map(|(url, title)| ScoredTab { url, title })
                        .collect();
                    match scorer.assign(&candidates, &scored) {
                        ScoreOutcome::Assigned { candidate, score } => {
                            info!(container = %container.id, space = %spaces[candidate].name, score, "essential tabs assigned by name match");
                            Some((candidate, AssignmentMethod::Heuristic { score }))
                        }
                        ScoreOutcome::Unassigned { best } => {
                            debug!(container = %container.id, best, "no confident space for essential tabs");
                            None
                        }
                    }
                }
            };

            let profile_label = profile.clone().unwrap_or_else(|| "unknown".to_string());
            match target {
                Some((slot, method)) => {
                    let space = &mut nodes[slot];
                    let mut next = space.entries().last().map(|e| e.position() + 1).unwrap_or(0);
                    for (url, title) in tabs {
                        report.essential_assignments.push(EssentialAssignment {
                            url: url.clone(),
                            title: title.clone(),
                            space: space.name.clone(),
                            method: method.clone(),
                        });
                        space.tabs.push(TabNode {
                            id: format!("{}:{}", container.id, next),
                            url,
                            title,
                            space_id: space.id.clone(),
                            folder_id: None,
                            folder_path: Vec::new(),
                            position: next,
                            essential: true,
                        });
                        next += 1;
                    }
                }
                None => {
                    warn!(
                        profile = %profile_label,
                        count = tabs.len(),
                        "dropping essential tabs with no matching space"
                    );
                    for (url, title) in tabs {
                        report.orphaned_essentials.push(OrphanedEssential {
                            url,
                            title,
                            profile: profile_label.clone(),
                        });
                    }
                }
            }
        }
    }
}

// === Ownership and display order ===

/// Answers "does this item belong to the space" by walking `parentID` links.
struct SpaceOwnership<'a> {
    containers: HashSet<&'a str>,
    index: &'a ItemIndex,
}

impl<'a> SpaceOwnership<'a> {
    fn new(info: &'a SpaceInfo, index: &'a ItemIndex) -> Self {
        Self {
            containers: info.containers.iter().map(|(id, _)| id.as_str()).collect(),
            index,
        }
    }

    /// Walks upward until a space container is reached. A cycle or a broken
    /// chain means the item does not belong.
    fn owns(&self, item: &Item) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = item.parent_id.as_deref();
        while let Some(parent) = current {
            if self.containers.contains(parent) {
                return true;
            }
            if !visited.insert(parent) {
                return false;
            }
            current = self.index.get(parent).and_then(|p| p.parent_id.as_deref());
        }
        false
    }

    /// Owned tabs and folders whose parent is not itself an owned folder,
    /// in insertion order.
    fn top_level_items(&self) -> Vec<String> {
        self.index
            .iter()
            .filter(|item| matches!(item.kind, ItemKind::Tab { .. } | ItemKind::Folder))
            .filter(|item| self.owns(item))
            .filter(|item| {
                let parent = item.parent_id.as_deref().and_then(|p| self.index.get(p));
                !matches!(parent, Some(p) if p.kind == ItemKind::Folder)
            })
            .map(|item| item.id.clone())
            .collect()
    }
}

/// Children of the largest pinned container, else the largest unpinned
/// one, else every container's children concatenated.
fn display_order(info: &SpaceInfo, index: &ItemIndex) -> Option<Vec<String>> {
    let children_of = |id: &str| -> Vec<String> {
        index
            .get(id)
            .map(|item| item.children.clone())
            .unwrap_or_default()
    };
    let largest = |marker: Marker| -> Option<Vec<String>> {
        info.containers
            .iter()
            .filter(|(_, m)| *m == marker)
            .map(|(id, _)| children_of(id))
            .filter(|children| !children.is_empty())
            .fold(None, |best: Option<Vec<String>>, children| match best {
                Some(b) if b.len() >= children.len() => Some(b),
                _ => Some(children),
            })
    };

    largest(Marker::Pinned)
        .or_else(|| largest(Marker::Unpinned))
        .or_else(|| {
            let combined: Vec<String> = info
                .containers
                .iter()
                .flat_map(|(id, _)| children_of(id))
                .collect();
            (!combined.is_empty()).then_some(combined)
        })
}

struct Walk<'a> {
    index: &'a ItemIndex,
    owner: &'a SpaceOwnership<'a>,
    visited: HashSet<String>,
    next_position: usize,
}

impl<'a> Walk<'a> {
    /// Emits folders and tabs for `ids` in order, recursing into folders.
    /// Returns the ids that were emitted at this level.
    fn materialize(
        &mut self,
        ids: &[String],
        parent: Option<&str>,
        path: &[String],
        space: &mut SpaceNode,
        report: &mut ExtractionReport,
    ) -> Vec<String> {
        let index = self.index;
        let mut emitted = Vec::new();
        for id in ids {
            if !self.visited.insert(id.clone()) {
                debug!(item = %id, "item already visited; skipping");
                continue;
            }
            let Some(item) = index.get(id) else {
                continue;
            };
            match &item.kind {
                ItemKind::Tab { url, saved_title } => {
                    if !self.owner.owns(item) {
                        continue;
                    }
                    if url.trim().is_empty() {
                        report.dropped_tabs_without_url += 1;
                        continue;
                    }
                    let title = tab_title(item.title.as_deref(), saved_title.as_deref(), url);
                    space.tabs.push(TabNode {
                        id: item.id.clone(),
                        url: url.clone(),
                        title,
                        space_id: space.id.clone(),
                        folder_id: parent.map(str::to_string),
                        folder_path: path.to_vec(),
                        position: self.take_position(),
                        essential: false,
                    });
                    emitted.push(item.id.clone());
                }
                ItemKind::Folder => {
                    if !self.owner.owns(item) {
                        continue;
                    }
                    let title = item
                        .title
                        .clone()
                        .unwrap_or_else(|| "Untitled Folder".to_string());
                    let slot = space.folders.len();
                    space.folders.push(FolderNode {
                        id: item.id.clone(),
                        title: title.clone(),
                        parent_id: parent.map(str::to_string),
                        space_id: space.id.clone(),
                        position: self.take_position(),
                        children: Vec::new(),
                    });
                    emitted.push(item.id.clone());

                    let children = if item.children.is_empty() {
                        index
                            .iter()
                            .filter(|c| c.parent_id.as_deref() == Some(item.id.as_str()))
                            .map(|c| c.id.clone())
                            .collect()
                    } else {
                        item.children.clone()
                    };
                    let mut child_path = path.to_vec();
                    child_path.push(title);
                    let kept = self.materialize(&children, Some(item.id.as_str()), &child_path, space, report);
                    space.folders[slot].children = kept;
                }
                ItemKind::Container { .. } | ItemKind::Other => {}
            }
        }
        emitted
    }

    fn take_position(&mut self) -> usize {
        let position = self.next_position;
        self.next_position += 1;
        position
    }
}

// === Document helpers ===

/// The `sidebar.containers` entry holding `key`: index 1 when it has it,
/// else the first container that does.
fn sidebar_container<'a>(doc: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    let containers = doc.pointer("/sidebar/containers")?.as_array()?;
    containers
        .get(1)
        .and_then(|c| c.get(key))
        .and_then(Value::as_array)
        .or_else(|| {
            containers
                .iter()
                .find_map(|c| c.get(key).and_then(Value::as_array))
        })
}

fn build_index(doc: &Value, malformed: &mut usize) -> ItemIndex {
    let raw = sidebar_container(doc, "items").or_else(|| {
        doc.pointer("/firebaseSyncState/syncData/items")
            .and_then(Value::as_array)
    });

    let mut index = ItemIndex::default();
    let Some(raw) = raw else {
        return index;
    };
    for (id, value) in collect_pairs(raw, malformed) {
        index.insert(parse_item(id, value));
    }
    index
}

fn parse_item(id: String, value: &Value) -> Item {
    let data = value.get("data");
    let kind = if let Some(tab) = data.and_then(|d| d.get("tab")) {
        ItemKind::Tab {
            url: tab
                .get("savedURL")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            saved_title: non_empty_str(tab.get("savedTitle")),
        }
    } else if data.and_then(|d| d.get("list")).is_some() {
        ItemKind::Folder
    } else if let Some(container) = data.and_then(|d| d.get("itemContainer")) {
        let top_apps = container
            .pointer("/containerType/topApps")
            .map(|top| top_apps_profile(unwrap_zero(top)));
        ItemKind::Container { top_apps }
    } else {
        ItemKind::Other
    };

    Item {
        id,
        title: non_empty_str(value.get("title")),
        parent_id: non_empty_str(value.get("parentID")),
        children: value
            .get("childrenIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        kind,
    }
}

/// Profile declared by a `topApps` container; `default` maps to the
/// literal "Default" profile directory.
fn top_apps_profile(top: &Value) -> Option<String> {
    if let Some(custom) = top.get("custom") {
        return non_empty_str(unwrap_zero(custom).get("directoryBasename"));
    }
    top.get("default").map(|_| "Default".to_string())
}

/// Classifies real container ids by the marker that precedes them.
fn classify_containers(ids: Option<&Value>) -> Vec<(String, Marker)> {
    let Some(ids) = ids.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut marker = Marker::Unmarked;
    let mut out = Vec::new();
    for id in ids.iter().filter_map(Value::as_str) {
        match id {
            "pinned" => marker = Marker::Pinned,
            "unpinned" => marker = Marker::Unpinned,
            real => out.push((real.to_string(), marker)),
        }
    }
    out
}

/// Reads an encoded collection: alternating `id, object` pairs, objects
/// wrapped in `{value: ...}`, or standalone objects carrying an `id`.
fn collect_pairs<'a>(array: &'a [Value], malformed: &mut usize) -> Vec<(String, &'a Value)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < array.len() {
        match &array[i] {
            Value::String(id) => match array.get(i + 1) {
                Some(obj @ Value::Object(_)) => {
                    out.push((id.clone(), unwrap_value(obj)));
                    i += 2;
                }
                Some(Value::String(_)) | None => {
                    *malformed += 1;
                    i += 1;
                }
                Some(_) => {
                    *malformed += 1;
                    i += 2;
                }
            },
            obj @ Value::Object(_) => {
                let inner = unwrap_value(obj);
                let id = inner
                    .get("id")
                    .or_else(|| obj.get("id"))
                    .and_then(Value::as_str);
                match id {
                    Some(id) => out.push((id.to_string(), inner)),
                    None => *malformed += 1,
                }
                i += 1;
            }
            _ => {
                *malformed += 1;
                i += 1;
            }
        }
    }
    out
}

/// Item title, else the saved page title, else the URL.
fn tab_title(title: Option<&str>, saved_title: Option<&str>, url: &str) -> String {
    title.or(saved_title).unwrap_or(url).to_string()
}

fn unwrap_value(value: &Value) -> &Value {
    match value.get("value") {
        Some(inner @ Value::Object(_)) => inner,
        _ => value,
    }
}

/// Swift enum payloads arrive as `{_0: ...}`.
fn unwrap_zero(value: &Value) -> &Value {
    value.get("_0").unwrap_or(value)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
