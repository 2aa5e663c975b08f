//! Shared fixtures: sidebar documents and destination profiles.
//!
//! Included by the test targets with `#[path]`; not every target uses every helper.
#![allow(dead_code)]

use arc2zen::database::Database;
use arc2zen::types::destination::DestinationProfile;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A profile directory with an empty destination schema.
pub fn profile() -> (TempDir, DestinationProfile) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    Database::create(dir.path().join("places.sqlite")).expect("Failed to create places.sqlite");
    let profile = DestinationProfile::new(dir.path());
    (dir, profile)
}

pub fn tab(id: &str, parent: &str, title: &str, url: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "parentID": parent,
        "childrenIds": [],
        "data": {"tab": {"savedURL": url, "savedTitle": title}}
    })
}

pub fn folder(id: &str, parent: &str, title: &str, children: &[&str]) -> Value {
    json!({
        "id": id,
        "title": title,
        "parentID": parent,
        "childrenIds": children,
        "data": {"list": {}}
    })
}

pub fn space_container(id: &str, space_id: &str, children: &[&str]) -> Value {
    json!({
        "id": id,
        "parentID": null,
        "childrenIds": children,
        "data": {"itemContainer": {"containerType": {"spaceItems": {"_0": space_id}}}}
    })
}

/// A `topApps` container. `profile` of `None` means the default profile.
pub fn essentials_container(id: &str, profile: Option<&str>, children: &[&str]) -> Value {
    let top_apps = match profile {
        Some(name) => json!({"_0": {"custom": {"_0": {"directoryBasename": name}}}}),
        None => json!({"_0": {"default": {}}}),
    };
    json!({
        "id": id,
        "parentID": null,
        "childrenIds": children,
        "data": {"itemContainer": {"containerType": {"topApps": top_apps}}}
    })
}

/// Encodes items as alternating `id, object` pairs.
pub fn pairs(items: Vec<Value>) -> Value {
    let mut out = Vec::new();
    for item in items {
        let id = item["id"].as_str().unwrap_or_default().to_string();
        out.push(Value::String(id));
        out.push(item);
    }
    Value::Array(out)
}

pub fn document(spaces: Value, items: Vec<Value>, models: Value) -> Value {
    json!({
        "sidebar": {"containers": [
            {"global": {}},
            {"spaces": spaces, "items": pairs(items)}
        ]},
        "firebaseSyncState": {"syncData": {"spaceModels": models}}
    })
}

/// One space "Work" holding a folder "Finance" with two tabs and one
/// ungrouped tab at the root.
pub fn work_finance_items() -> Vec<Value> {
    vec![
        space_container("c-work-pinned", "s-work", &["f-finance", "t-docs"]),
        space_container("c-work-unpinned", "s-work", &[]),
        folder("f-finance", "c-work-pinned", "Finance", &["t-bank", "t-budget"]),
        tab("t-bank", "f-finance", "Bank", "https://bank.test/"),
        tab("t-budget", "f-finance", "Budget", "https://sheets.test/budget"),
        tab("t-docs", "c-work-pinned", "Docs", "https://docs.test/"),
    ]
}

pub fn work_space_descriptor() -> Value {
    json!([
        "s-work",
        {"title": "Work", "containerIDs": ["unpinned", "c-work-unpinned", "pinned", "c-work-pinned"]}
    ])
}

pub fn work_space_model() -> Value {
    json!([
        "s-work",
        {"value": {
            "title": "Work",
            "profile": {"default": {}},
            "customInfo": {
                "iconType": {"emoji_v2": "💼"},
                "windowTheme": {"primaryColorPalette": {"midTone": {"red": 0.2, "green": 0.4, "blue": 0.8}}}
            }
        }}
    ])
}

pub fn work_finance() -> Value {
    document(work_space_descriptor(), work_finance_items(), work_space_model())
}

/// Work/Finance plus one essentials container for `profile`.
pub fn work_finance_with_essentials(profile: Option<&str>, essentials: &[(&str, &str, &str)]) -> Value {
    let mut items = work_finance_items();
    let ids: Vec<&str> = essentials.iter().map(|(id, _, _)| *id).collect();
    items.push(essentials_container("c-top", profile, &ids));
    for (id, title, url) in essentials {
        items.push(tab(id, "c-top", title, url));
    }
    document(work_space_descriptor(), items, work_space_model())
}

/// Work/Finance plus a second space "Reading" with two root tabs.
pub fn two_spaces() -> Value {
    let mut items = work_finance_items();
    items.extend([
        space_container("c-read", "s-read", &["t-news", "t-blog"]),
        tab("t-news", "c-read", "News", "https://news.test/"),
        tab("t-blog", "c-read", "Blog", "https://blog.test/post"),
    ]);
    let spaces = json!([
        "s-work",
        {"title": "Work", "containerIDs": ["unpinned", "c-work-unpinned", "pinned", "c-work-pinned"]},
        "s-read",
        {"title": "Reading", "containerIDs": ["pinned", "c-read"]}
    ]);
    let mut models = work_space_model();
    if let Some(arr) = models.as_array_mut() {
        arr.push(json!("s-read"));
        arr.push(json!({"value": {"title": "Reading"}}));
    }
    document(spaces, items, models)
}
