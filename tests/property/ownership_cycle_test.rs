//! Property-based tests for sidebar walking over hostile item graphs.
//!
//! Random `parentID`/`childrenIds` links, cycles included, must always
//! produce a finite, self-consistent tree.

#[path = "../fixtures/mod.rs"]
mod fixtures;

use std::collections::BTreeSet;

use arc2zen::services::sidebar_extractor::SidebarExtractor;
use arc2zen::types::settings::ExtractorSettings;
use fixtures::*;
use proptest::prelude::*;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct RawItem {
    is_folder: bool,
    /// Index into the item list; out of range means the pinned container.
    parent: usize,
    children: Vec<usize>,
}

fn arb_items() -> impl Strategy<Value = (Vec<RawItem>, Vec<usize>)> {
    (1usize..12).prop_flat_map(|n| {
        let item = (any::<bool>(), 0..n + 2, prop::collection::vec(0..n, 0..4))
            .prop_map(|(is_folder, parent, children)| RawItem { is_folder, parent, children });
        (
            prop::collection::vec(item, n),
            prop::collection::vec(0..n, 0..6),
        )
    })
}

fn item_id(i: usize) -> String {
    format!("i{}", i)
}

fn build(items: &[RawItem], roots: &[usize]) -> Value {
    let root_ids: Vec<String> = roots.iter().map(|&i| item_id(i)).collect();
    let root_refs: Vec<&str> = root_ids.iter().map(String::as_str).collect();
    let mut values = vec![space_container("c-pin", "s-one", &root_refs)];

    for (i, raw) in items.iter().enumerate() {
        let id = item_id(i);
        let parent = if raw.parent < items.len() {
            item_id(raw.parent)
        } else {
            "c-pin".to_string()
        };
        if raw.is_folder {
            let child_ids: Vec<String> = raw.children.iter().map(|&c| item_id(c)).collect();
            let child_refs: Vec<&str> = child_ids.iter().map(String::as_str).collect();
            values.push(folder(&id, &parent, &format!("Folder {}", i), &child_refs));
        } else {
            values.push(tab(&id, &parent, &format!("Tab {}", i), &format!("https://t{}.test/", i)));
        }
    }

    let spaces = json!(["s-one", {"title": "One", "containerIDs": ["pinned", "c-pin"]}]);
    document(spaces, values, json!([]))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_random_graphs_yield_consistent_trees((items, roots) in arb_items()) {
        let doc = build(&items, &roots);
        let extraction = SidebarExtractor::new(ExtractorSettings::default()).extract_document(&doc);

        let tab_items: BTreeSet<String> = items
            .iter()
            .enumerate()
            .filter(|(_, raw)| !raw.is_folder)
            .map(|(i, _)| item_id(i))
            .collect();

        for space in &extraction.tree.spaces {
            let folder_ids: BTreeSet<&str> = space.folders.iter().map(|f| f.id.as_str()).collect();
            prop_assert_eq!(folder_ids.len(), space.folders.len());

            let tab_ids: BTreeSet<&str> = space.tabs.iter().map(|t| t.id.as_str()).collect();
            prop_assert_eq!(tab_ids.len(), space.tabs.len());
            prop_assert!(space.tabs.len() <= tab_items.len());

            for folder in &space.folders {
                if let Some(parent) = &folder.parent_id {
                    prop_assert!(folder_ids.contains(parent.as_str()));
                }
            }
            for tab in &space.tabs {
                prop_assert!(tab_items.contains(&tab.id));
                prop_assert!(!tab.url.is_empty());
                if let Some(parent) = &tab.folder_id {
                    prop_assert!(folder_ids.contains(parent.as_str()));
                }
            }
        }
    }

    #[test]
    fn prop_extraction_is_deterministic((items, roots) in arb_items()) {
        let doc = build(&items, &roots);
        let extractor = SidebarExtractor::new(ExtractorSettings::default());
        prop_assert_eq!(
            extractor.extract_document(&doc).tree,
            extractor.extract_document(&doc).tree
        );
    }
}

#[test]
fn two_folders_listing_each_other_terminate() {
    let items = vec![
        space_container("c-pin", "s-one", &["f-a"]),
        folder("f-a", "c-pin", "A", &["f-b", "t-x"]),
        folder("f-b", "f-a", "B", &["f-a"]),
        tab("t-x", "f-a", "X", "https://x.test/"),
    ];
    let spaces = json!(["s-one", {"title": "One", "containerIDs": ["pinned", "c-pin"]}]);
    let extraction = SidebarExtractor::new(ExtractorSettings::default())
        .extract_document(&document(spaces, items, json!([])));

    let space = extraction.tree.space("One").expect("space kept");
    assert_eq!(space.folders.len(), 2);
    assert_eq!(space.tabs.len(), 1);
    assert_eq!(space.tabs[0].folder_path, vec!["A".to_string()]);
}
